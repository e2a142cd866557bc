//! Common error types and utilities shared by the Segscan crates
//!
//! This module provides the error vocabulary that appears in more than one
//! crate: a [`CommonError`] enum for standard failure patterns, the
//! [`ErrorClassification`] trait for retryability and severity, and helper
//! macros for composing module-specific errors with `CommonError`.
//!
//! ## Composition
//!
//! Module-specific errors embed `CommonError` instead of duplicating its
//! variants:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum LoaderError {
//!     #[error("Missing setting: {0}")]
//!     Missing(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//!
//! impl_error_conversion!(LoaderError, Common);
//! impl_error_classification!(LoaderError, Common,
//!     Self::Missing(_) => {
//!         retryable: false,
//!         severity: ErrorSeverity::Error,
//!         critical: false,
//!     }
//! );
//! ```
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case |
//! |-------|----------|
//! | **Info** | Expected conditions |
//! | **Warning** | Degraded but operational (retry budget spent, missing sources) |
//! | **Error** | Failure requiring attention (bad config, failed reads) |
//! | **Critical** | Scanner misuse that no retry can fix |

use std::fmt;
use std::time::Duration;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Boxed error type for caller-supplied callbacks and opaque failures
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Common error variants that appear across multiple modules
#[derive(Debug, Clone, PartialEq)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Serialization or deserialization errors
    Serialization { message: String, format: Option<String> },

    /// File I/O errors
    Persistence { message: String, operation: Option<String> },

    /// Validation errors
    Validation { field: String, message: String, value: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field: Some(field) } => {
                write!(f, "Configuration error in field '{field}': {message}")
            }
            Self::Config { message, field: None } => write!(f, "Configuration error: {message}"),
            Self::Serialization { message, format: Some(format) } => {
                write!(f, "Serialization error ({format}): {message}")
            }
            Self::Serialization { message, format: None } => {
                write!(f, "Serialization error: {message}")
            }
            Self::Persistence { message, operation: Some(op) } => {
                write!(f, "I/O error during '{op}': {message}")
            }
            Self::Persistence { message, operation: None } => write!(f, "I/O error: {message}"),
            Self::Validation { field, message, value: Some(value) } => {
                write!(f, "Invalid '{field}' (value: '{value}'): {message}")
            }
            Self::Validation { field, message, value: None } => {
                write!(f, "Invalid '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for CommonError {}

/// None of these clear up on a second attempt
impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl CommonError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence { message: message.into(), operation: None }
    }

    /// I/O failure while performing `operation`
    pub fn persistence_op<S: Into<String>, O: Into<String>>(operation: O, message: S) -> Self {
        Self::Persistence { message: message.into(), operation: Some(operation.into()) }
    }

    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: None }
    }

    /// Validation failure that echoes the rejected value
    pub fn validation_with_value<F: Into<String>, M: Into<String>, V: Into<String>>(
        field: F,
        message: M,
        value: V,
    ) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: Some(value.into()) }
    }
}

/// Error classification trait for consistent error handling across modules
///
/// Lets retry logic and monitoring treat errors uniformly without knowing
/// their concrete type.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues (timeouts, throttling,
    /// temporary unavailability) that may succeed if attempted again.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// Standard conversions from common error types
impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}

/// Utility macro for creating error conversions from std types
///
/// `From<CommonError>` is expected to come from a `#[from]` attribute on the
/// embedding variant. This generates `From<serde_json::Error>`,
/// `From<toml::de::Error>` and `From<std::io::Error>`, all routed through
/// `CommonError`.
///
/// ```rust,ignore
/// impl_error_conversion!(MyError, Common);
/// ```
#[macro_export]
macro_rules! impl_error_conversion {
    ($error_type:ty, $variant:ident) => {
        impl From<serde_json::Error> for $error_type {
            fn from(err: serde_json::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<toml::de::Error> for $error_type {
            fn from(err: toml::de::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<std::io::Error> for $error_type {
            fn from(err: std::io::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }
    };
}

/// Macro to implement ErrorClassification by delegating to CommonError
///
/// ```rust,ignore
/// impl_error_classification!(MyError, Common,
///     Self::Specific(_) => {
///         retryable: false,
///         severity: ErrorSeverity::Error,
///         critical: false,
///     }
/// );
/// ```
#[macro_export]
macro_rules! impl_error_classification {
    (
        $error_type:ty,
        $common_variant:ident
        $(,
            $variant:pat => {
                retryable: $retryable:expr,
                severity: $severity:expr,
                critical: $critical:expr
                $(, retry_after: $retry_after:expr)?
                $(,)?
            }
        )*
        $(,)?
    ) => {
        impl $crate::error::ErrorClassification for $error_type {
            fn is_retryable(&self) -> bool {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::is_retryable(e),
                    $(
                        $variant => $retryable,
                    )*
                }
            }

            fn severity(&self) -> $crate::error::ErrorSeverity {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::severity(e),
                    $(
                        $variant => $severity,
                    )*
                }
            }

            fn is_critical(&self) -> bool {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::is_critical(e),
                    $(
                        $variant => $critical,
                    )*
                }
            }

            fn retry_after(&self) -> Option<std::time::Duration> {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::retry_after(e),
                    $(
                        $(
                            $variant => $retry_after,
                        )?
                    )*
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }
        }
    };
}
