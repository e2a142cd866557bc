//! Error types reported by segment readers

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single page read against the store
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum StoreError {
    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Read timed out: {0}")]
    Timeout(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether a later attempt of the same read may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttled(_) | Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Result type alias for store reads
pub type StoreResult<T> = std::result::Result<T, StoreError>;
