//! Port interfaces consumed and invoked by the scan orchestrator

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use segscan_common::BoxedError;
use segscan_domain::{Page, SegmentRequest, StoreResult};

use crate::scan::{ScanContext, ScanError};

/// Trait for reading one page of one segment from a store
///
/// Reads may be attempted more than once for the same request when retries
/// are configured, so implementations must be safely repeatable.
#[async_trait]
pub trait SegmentReader: Send + Sync {
    /// Read the page described by `request`
    async fn read_segment(&self, request: &SegmentRequest) -> StoreResult<Page>;
}

/// Receives every successfully read page
///
/// Invoked concurrently for different segments but never concurrently for
/// the same segment. A failure abandons the segment's chain.
#[async_trait]
pub trait PageSink: Send + Sync {
    async fn on_page(&self, context: ScanContext, page: Page) -> Result<(), BoxedError>;
}

/// Receives the terminal error of a failed segment chain
#[async_trait]
pub trait ErrorSink: Send + Sync {
    async fn on_error(&self, context: ScanContext, error: ScanError) -> Result<(), BoxedError>;
}

/// [`PageSink`] backed by an async closure, see [`page_sink_fn`]
pub struct PageSinkFn<F>(F);

/// [`ErrorSink`] backed by an async closure, see [`error_sink_fn`]
pub struct ErrorSinkFn<F>(F);

/// Wrap an async closure as a [`PageSink`]
pub fn page_sink_fn<F, Fut>(f: F) -> PageSinkFn<F>
where
    F: Fn(ScanContext, Page) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxedError>> + Send + 'static,
{
    PageSinkFn(f)
}

/// Wrap an async closure as an [`ErrorSink`]
pub fn error_sink_fn<F, Fut>(f: F) -> ErrorSinkFn<F>
where
    F: Fn(ScanContext, ScanError) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxedError>> + Send + 'static,
{
    ErrorSinkFn(f)
}

#[async_trait]
impl<F, Fut> PageSink for PageSinkFn<F>
where
    F: Fn(ScanContext, Page) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxedError>> + Send + 'static,
{
    async fn on_page(&self, context: ScanContext, page: Page) -> Result<(), BoxedError> {
        (self.0)(context, page).await
    }
}

#[async_trait]
impl<F, Fut> ErrorSink for ErrorSinkFn<F>
where
    F: Fn(ScanContext, ScanError) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxedError>> + Send + 'static,
{
    async fn on_error(&self, context: ScanContext, error: ScanError) -> Result<(), BoxedError> {
        (self.0)(context, error).await
    }
}

impl<F> fmt::Debug for PageSinkFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PageSinkFn")
    }
}

impl<F> fmt::Debug for ErrorSinkFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorSinkFn")
    }
}
