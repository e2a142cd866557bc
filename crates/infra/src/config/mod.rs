//! Configuration loading
//!
//! Loads [`ScanSettings`](segscan_domain::ScanSettings) from environment
//! variables or TOML/JSON files.

mod error;
pub mod loader;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_from_env, load_from_file, parse_settings, probe_config_paths};
