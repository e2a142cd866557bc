//! Parallel segmented scan orchestration
//!
//! A [`Scanner`] drives one logical worker per segment over a shared work
//! queue. Each queued task reads one page through the retry executor, hands
//! it to the [`PageSink`](crate::PageSink) and, when the page carries a
//! continuation token, re-enqueues the segment at the back of the queue.
//! Failed chains go to the optional [`ErrorSink`](crate::ErrorSink) and are
//! never returned to the caller.
//!
//! ```rust,ignore
//! let config = ScanConfig::builder(reader, ScanRequest::new("orders"), sink)
//!     .total_segments(4)
//!     .retry(RetryConfig::builder().max_attempts(3).build()?)
//!     .build()?;
//! parallel_scan(config).await?;
//! ```

mod config;
mod context;
mod error;
mod metrics;
mod queue;
mod retry;
mod scanner;

pub use config::{ScanConfig, ScanConfigBuilder, SharedRetryPolicy};
pub use context::{AbortHandle, ScanContext};
pub use error::{ScanConfigError, ScanError};
pub use metrics::{ScanMetrics, ScanMetricsSnapshot};
pub use retry::{retry_config_from_settings, TransientRetry};
pub use scanner::{parallel_scan, Scanner};
