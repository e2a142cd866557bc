//! Scan configuration

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, DEFAULT_TOTAL_SEGMENTS,
};
use crate::types::ScanRequest;

/// Scan tuning loaded from the environment or a settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Number of segments scanned in parallel
    pub total_segments: u32,
    /// Default page-size limit applied to requests that set none
    pub page_limit: Option<u32>,
    pub consistent_read: bool,
    pub retry: RetrySettings,
}

/// Per-page retry behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts per page read, including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: JitterMode,
    /// Total retry budget per page read; unlimited when absent
    pub max_total_ms: Option<u64>,
}

/// Randomisation applied to backoff delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    None,
    Full,
    #[default]
    Equal,
}

impl std::str::FromStr for JitterMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "full" => Ok(Self::Full),
            "equal" => Ok(Self::Equal),
            other => Err(format!("unknown jitter mode '{other}' (expected none, full or equal)")),
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            total_segments: DEFAULT_TOTAL_SEGMENTS,
            page_limit: None,
            consistent_read: false,
            retry: RetrySettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: JitterMode::default(),
            max_total_ms: None,
        }
    }
}

impl ScanSettings {
    /// Fill request fields the caller left unset from these settings
    ///
    /// An explicit limit on the request wins over `page_limit`.
    pub fn apply_to(&self, mut request: ScanRequest) -> ScanRequest {
        if request.limit.is_none() {
            request.limit = self.page_limit;
        }
        request.consistent_read |= self.consistent_read;
        request
    }
}
