//! Recording sinks

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use segscan_common::BoxedError;
use segscan_core::{ErrorSink, PageSink, ScanContext, ScanError};
use segscan_domain::{ContinuationToken, Page};

/// A page as seen by the results sink.
#[derive(Debug, Clone)]
pub struct DeliveredPage {
    pub segment: u32,
    pub continuation: Option<ContinuationToken>,
    pub page: Page,
}

/// Page sink that records every delivery.
#[derive(Default)]
pub struct RecordingSink {
    pages: Mutex<Vec<DeliveredPage>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pages(&self) -> Vec<DeliveredPage> {
        self.pages.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.pages.lock().unwrap().len()
    }

    pub fn pages_for_segment(&self, segment: u32) -> Vec<DeliveredPage> {
        self.pages().into_iter().filter(|page| page.segment == segment).collect()
    }
}

#[async_trait]
impl PageSink for RecordingSink {
    async fn on_page(&self, context: ScanContext, page: Page) -> Result<(), BoxedError> {
        self.pages.lock().unwrap().push(DeliveredPage {
            segment: context.segment(),
            continuation: context.continuation().cloned(),
            page,
        });
        Ok(())
    }
}

/// A failure as seen by the error sink.
#[derive(Debug)]
pub struct ReportedError {
    pub segment: u32,
    pub error: ScanError,
}

/// Error sink that records every report.
#[derive(Default)]
pub struct RecordingErrorSink {
    errors: Mutex<Vec<ReportedError>>,
}

impl RecordingErrorSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    /// Drain the recorded errors.
    pub fn take(&self) -> Vec<ReportedError> {
        std::mem::take(&mut *self.errors.lock().unwrap())
    }
}

#[async_trait]
impl ErrorSink for RecordingErrorSink {
    async fn on_error(&self, context: ScanContext, error: ScanError) -> Result<(), BoxedError> {
        self.errors.lock().unwrap().push(ReportedError { segment: context.segment(), error });
        Ok(())
    }
}
