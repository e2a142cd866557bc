//! # Segscan Domain
//!
//! Data model for segmented table scans.
//!
//! This crate contains:
//! - Scan request templates and per-segment requests
//! - Pages, items and continuation tokens
//! - Store error types and Result definitions
//! - Scan settings (configuration structures)
//!
//! ## Architecture
//! - No dependencies on other Segscan crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
