//! # Segscan Core
//!
//! Scan orchestration logic - no store or infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for segment readers and result sinks
//! - The parallel segmented scan orchestrator
//! - Scan error types and metrics
//!
//! ## Architecture Principles
//! - Only depends on `segscan-common` and `segscan-domain`
//! - No network, file or database code
//! - All external collaborators via traits

pub mod ports;
pub mod scan;

// Re-export specific items to avoid ambiguity
pub use ports::{error_sink_fn, page_sink_fn, ErrorSink, PageSink, SegmentReader};
pub use scan::{
    parallel_scan, retry_config_from_settings, AbortHandle, ScanConfig, ScanConfigBuilder,
    ScanConfigError, ScanContext, ScanError, ScanMetrics, ScanMetricsSnapshot, Scanner,
    TransientRetry,
};
