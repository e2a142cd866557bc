//! # Segscan Infrastructure
//!
//! Infrastructure implementations of core scan ports.
//!
//! This crate contains:
//! - Settings loading from the environment and TOML/JSON files
//! - Tracing subscriber bootstrap
//! - `MemoryTable`, an in-memory segmented store implementing
//!   `SegmentReader`
//!
//! ## Architecture
//! - Implements traits defined in `segscan-core`
//! - Depends on `segscan-common`, `segscan-domain` and `segscan-core`
//! - Contains all "impure" code (environment, files, global subscriber)

pub mod config;
pub mod memory;
pub mod telemetry;

// Re-export commonly used items
pub use config::{load, load_from_env, load_from_file, parse_settings, ConfigError, ConfigResult};
pub use memory::MemoryTable;
pub use telemetry::{init_tracing, init_tracing_from_env};
