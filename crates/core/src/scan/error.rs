//! Scan error types

use std::time::Duration;

use segscan_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use segscan_common::impl_error_classification;
use segscan_common::{BoxedError, RetryError};
use segscan_domain::StoreError;
use thiserror::Error;

/// Terminal failure of one segment chain, delivered to the error sink
#[derive(Debug, Error)]
pub enum ScanError {
    /// The read failed on every allowed attempt or was not retryable
    #[error("Segment read failed after {attempts} attempts: {source}")]
    Read { attempts: u32, source: StoreError },

    /// Retrying was cut short by the retry time budget
    #[error("Segment read gave up after {elapsed:?} ({attempts} attempts): {source}")]
    RetryTimeout { elapsed: Duration, attempts: u32, source: StoreError },

    /// The results sink rejected a page
    #[error("Page sink failed: {source}")]
    Sink { source: BoxedError },
}

impl ScanError {
    pub fn from_retry(error: RetryError<StoreError>) -> Self {
        match error {
            RetryError::Exhausted { attempts, source }
            | RetryError::NonRetryable { attempts, source } => Self::Read { attempts, source },
            RetryError::TimeoutExceeded { elapsed, attempts, source } => {
                Self::RetryTimeout { elapsed, attempts, source }
            }
        }
    }

    /// The store error behind a read failure
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Read { source, .. } | Self::RetryTimeout { source, .. } => Some(source),
            Self::Sink { .. } => None,
        }
    }

    /// Read attempts made before giving up; `None` for sink failures
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Read { attempts, .. } | Self::RetryTimeout { attempts, .. } => Some(*attempts),
            Self::Sink { .. } => None,
        }
    }

    pub fn is_sink_failure(&self) -> bool {
        matches!(self, Self::Sink { .. })
    }
}

impl From<RetryError<StoreError>> for ScanError {
    fn from(error: RetryError<StoreError>) -> Self {
        Self::from_retry(error)
    }
}

impl ErrorClassification for ScanError {
    fn is_retryable(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_transient)
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RetryTimeout { .. } => ErrorSeverity::Warning,
            Self::Read { .. } | Self::Sink { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Invalid scan configuration, reported before any task is scheduled
#[derive(Debug, Error)]
pub enum ScanConfigError {
    #[error("total_segments must be at least 1 (got {total_segments})")]
    InvalidSegments { total_segments: u32 },

    #[error("Scanner must be started from within a tokio runtime")]
    MissingRuntime,

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl_error_classification!(ScanConfigError, Common,
    Self::InvalidSegments { .. } => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::MissingRuntime => {
        retryable: false,
        severity: ErrorSeverity::Critical,
        critical: true,
    }
);
