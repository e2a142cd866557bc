//! Scan configuration and builder

use std::fmt;
use std::sync::Arc;

use segscan_common::resilience::policies::AlwaysRetry;
use segscan_common::{RetryConfig, RetryPolicy};
use segscan_domain::{ScanRequest, ScanSettings, StoreError};

use super::error::ScanConfigError;
use super::retry::retry_config_from_settings;
use crate::ports::{ErrorSink, PageSink, SegmentReader};

/// Retry policy shared by every worker of a scan
pub type SharedRetryPolicy = Arc<dyn RetryPolicy<StoreError> + Send + Sync>;

/// Everything a [`Scanner`](super::Scanner) needs to run
///
/// Built and validated through [`ScanConfig::builder`].
#[derive(Clone)]
pub struct ScanConfig {
    pub(crate) reader: Arc<dyn SegmentReader>,
    pub(crate) request: ScanRequest,
    pub(crate) on_page: Arc<dyn PageSink>,
    pub(crate) on_error: Option<Arc<dyn ErrorSink>>,
    pub(crate) total_segments: u32,
    pub(crate) retry: RetryConfig,
    pub(crate) retry_policy: SharedRetryPolicy,
}

impl ScanConfig {
    /// Start a configuration from its three required parts
    pub fn builder(
        reader: Arc<dyn SegmentReader>,
        request: ScanRequest,
        on_page: Arc<dyn PageSink>,
    ) -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self {
                reader,
                request,
                on_page,
                on_error: None,
                total_segments: segscan_domain::constants::DEFAULT_TOTAL_SEGMENTS,
                retry: RetryConfig::default(),
                retry_policy: Arc::new(AlwaysRetry),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ScanConfigError> {
        if self.total_segments == 0 {
            return Err(ScanConfigError::InvalidSegments { total_segments: self.total_segments });
        }
        self.retry.validate()?;
        Ok(())
    }

    pub fn total_segments(&self) -> u32 {
        self.total_segments
    }

    pub fn request(&self) -> &ScanRequest {
        &self.request
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn has_error_sink(&self) -> bool {
        self.on_error.is_some()
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("request", &self.request)
            .field("total_segments", &self.total_segments)
            .field("retry", &self.retry)
            .field("has_error_sink", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ScanConfig`] with fluent API
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn on_error(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.config.on_error = Some(sink);
        self
    }

    pub fn total_segments(mut self, total_segments: u32) -> Self {
        self.config.total_segments = total_segments;
        self
    }

    /// Retry configuration applied to every page read
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Decide which read errors are retried (every error by default)
    pub fn retry_policy<P>(mut self, policy: P) -> Self
    where
        P: RetryPolicy<StoreError> + Send + Sync + 'static,
    {
        self.config.retry_policy = Arc::new(policy);
        self
    }

    /// Apply loaded settings: segment count, retry and request defaults
    pub fn settings(mut self, settings: &ScanSettings) -> Result<Self, ScanConfigError> {
        self.config.total_segments = settings.total_segments;
        self.config.retry = retry_config_from_settings(&settings.retry)?;
        self.config.request = settings.apply_to(self.config.request);
        Ok(self)
    }

    pub fn build(self) -> Result<ScanConfig, ScanConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
