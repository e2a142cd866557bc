use std::path::PathBuf;

use segscan_common::{impl_error_classification, impl_error_conversion, CommonError, ErrorSeverity};
use thiserror::Error;

/// Errors raised while loading scan settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable required to configure from the environment is not set
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("No config file found in any of the standard locations")]
    NoConfigFile,

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// I/O and parse failures
    #[error(transparent)]
    Common(#[from] CommonError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid { key: key.into(), message: message.into() }
    }

    /// True for the errors `load` recovers from by trying the next source
    pub fn is_source_absent(&self) -> bool {
        matches!(self, Self::Missing(_) | Self::NoConfigFile)
    }
}

impl_error_conversion!(ConfigError, Common);

impl_error_classification!(ConfigError, Common,
    Self::Missing(_) | Self::NoConfigFile | Self::NotFound { .. } => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::Invalid { .. } | Self::UnsupportedFormat(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
);
