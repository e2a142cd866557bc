//! Domain types for segmented scans
//!
//! - [`request`]: the caller's scan template and the per-segment request built from it
//! - [`page`]: items, pages and continuation tokens returned by a read

pub mod page;
pub mod request;

pub use page::{ContinuationToken, Item, Page};
pub use request::{ScanRequest, SegmentRequest};
