//! Settings loader
//!
//! Loads [`ScanSettings`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file from the working directory, if present
//! 2. Attempts to load from environment variables
//! 3. If `SEGSCAN_TOTAL_SEGMENTS` is unset, falls back to a settings file
//! 4. If no file exists either, uses [`ScanSettings::default`]
//!
//! Invalid values never fall through to the next source.
//!
//! ## Environment Variables
//! - `SEGSCAN_TOTAL_SEGMENTS`: Number of parallel segments (required for
//!   env loading)
//! - `SEGSCAN_PAGE_LIMIT`: Default page-size limit
//! - `SEGSCAN_CONSISTENT_READ`: Strongly consistent reads (true/false)
//! - `SEGSCAN_MAX_ATTEMPTS`: Attempts per page read, including the first
//! - `SEGSCAN_BASE_DELAY_MS`: Base backoff delay
//! - `SEGSCAN_MAX_DELAY_MS`: Backoff delay cap
//! - `SEGSCAN_JITTER`: `none`, `full` or `equal`
//! - `SEGSCAN_MAX_TOTAL_MS`: Total retry budget per page read
//! - `SEGSCAN_CONFIG`: Explicit settings file path
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./segscan.toml` or `./segscan.json` (current working directory)
//! 2. `./config/segscan.toml` or `./config/segscan.json`
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use segscan_common::CommonError;
use segscan_domain::{JitterMode, RetrySettings, ScanSettings};

use super::error::{ConfigError, ConfigResult};

const FILE_NAMES: [&str; 2] = ["segscan.toml", "segscan.json"];

/// Load settings with automatic fallback strategy
///
/// # Errors
/// Returns an error if a source is present but invalid.
pub fn load() -> ConfigResult<ScanSettings> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let settings = match load_from_env() {
        Ok(settings) => {
            tracing::info!("Scan settings loaded from environment variables");
            settings
        }
        Err(e) if e.is_source_absent() => {
            tracing::debug!(error = %e, "Environment incomplete, trying file");
            let explicit = std::env::var_os("SEGSCAN_CONFIG").map(PathBuf::from);
            match load_from_file(explicit) {
                Ok(settings) => settings,
                Err(e) if e.is_source_absent() => {
                    tracing::info!("No scan settings found; using defaults");
                    ScanSettings::default()
                }
                Err(e) => return Err(e),
            }
        }
        Err(e) => return Err(e),
    };

    validate(&settings)?;
    Ok(settings)
}

/// Load settings from environment variables
///
/// `SEGSCAN_TOTAL_SEGMENTS` must be set; every other variable falls back to
/// its default.
///
/// # Errors
/// Returns [`ConfigError::Missing`] when `SEGSCAN_TOTAL_SEGMENTS` is unset and
/// [`ConfigError::Invalid`] when any variable fails to parse.
pub fn load_from_env() -> ConfigResult<ScanSettings> {
    let total_segments =
        env_var("SEGSCAN_TOTAL_SEGMENTS").and_then(|s| parse("SEGSCAN_TOTAL_SEGMENTS", &s))?;
    let defaults = RetrySettings::default();

    let retry = RetrySettings {
        max_attempts: env_parse("SEGSCAN_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
        base_delay_ms: env_parse("SEGSCAN_BASE_DELAY_MS")?.unwrap_or(defaults.base_delay_ms),
        max_delay_ms: env_parse("SEGSCAN_MAX_DELAY_MS")?.unwrap_or(defaults.max_delay_ms),
        jitter: env_parse::<JitterMode>("SEGSCAN_JITTER")?.unwrap_or(defaults.jitter),
        max_total_ms: env_parse("SEGSCAN_MAX_TOTAL_MS")?,
    };

    Ok(ScanSettings {
        total_segments,
        page_limit: env_parse("SEGSCAN_PAGE_LIMIT")?,
        consistent_read: env_parse_bool("SEGSCAN_CONSISTENT_READ")?.unwrap_or(false),
        retry,
    })
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations via
/// [`probe_config_paths`]. Format is detected by file extension.
///
/// # Errors
/// Returns [`ConfigError::NotFound`] for a missing explicit path,
/// [`ConfigError::NoConfigFile`] when probing finds nothing, and parse
/// errors for malformed contents.
pub fn load_from_file(path: Option<PathBuf>) -> ConfigResult<ScanSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound { path: p });
            }
            p
        }
        None => probe_config_paths().ok_or(ConfigError::NoConfigFile)?,
    };

    tracing::info!(path = %config_path.display(), "Loading scan settings from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CommonError::persistence_op("read_config", e.to_string()))?;

    parse_settings(&contents, &config_path)
}

/// Parse settings from string content
///
/// Format is detected by the extension of `path` (`.toml` or `.json`,
/// defaulting to JSON when there is none).
pub fn parse_settings(contents: &str, path: &Path) -> ConfigResult<ScanSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let settings: ScanSettings = match extension {
        "toml" => toml::from_str(contents)?,
        "json" => serde_json::from_str(contents)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    validate(&settings)?;
    Ok(settings)
}

/// Probe the standard locations for a settings file
///
/// # Returns
/// The first file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for name in FILE_NAMES {
            candidates.push(cwd.join(name));
        }
        for name in FILE_NAMES {
            candidates.push(cwd.join("config").join(name));
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in FILE_NAMES {
                candidates.push(exe_dir.join(name));
            }
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn validate(settings: &ScanSettings) -> ConfigResult<()> {
    if settings.total_segments == 0 {
        return Err(ConfigError::invalid("total_segments", "must be at least 1"));
    }
    if settings.retry.max_attempts == 0 {
        return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
    }
    if settings.retry.max_delay_ms < settings.retry.base_delay_ms {
        return Err(ConfigError::invalid("retry.max_delay_ms", "must not be below base_delay_ms"));
    }
    if settings.page_limit == Some(0) {
        return Err(ConfigError::invalid("page_limit", "must be positive when set"));
    }
    Ok(())
}

fn env_var(key: &str) -> ConfigResult<String> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

/// Parse an optional environment variable; unset yields `None`
fn env_parse<T>(key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => parse(key, &value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::invalid(key, e.to_string()))
}

/// Parse an optional boolean environment variable; unset yields `None`
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_parse_bool(key: &str) -> ConfigResult<Option<bool>> {
    let Ok(value) = std::env::var(key) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::invalid(key, format!("expected a boolean, got '{value}'"))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 8] = [
        "SEGSCAN_TOTAL_SEGMENTS",
        "SEGSCAN_PAGE_LIMIT",
        "SEGSCAN_CONSISTENT_READ",
        "SEGSCAN_MAX_ATTEMPTS",
        "SEGSCAN_BASE_DELAY_MS",
        "SEGSCAN_MAX_DELAY_MS",
        "SEGSCAN_JITTER",
        "SEGSCAN_MAX_TOTAL_MS",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        let truthy = [("TEST_BOOL_1", "1"), ("TEST_BOOL_YES", "yes"), ("TEST_BOOL_UPPER", "TRUE")];
        for (key, value) in truthy {
            std::env::set_var(key, value);
            assert_eq!(env_parse_bool(key).unwrap(), Some(true), "{value} should parse as true");
            std::env::remove_var(key);
        }
        for (key, value) in [("TEST_BOOL_0", "0"), ("TEST_BOOL_OFF", "off"), ("TEST_BOOL_NO", " No ")] {
            std::env::set_var(key, value);
            assert_eq!(env_parse_bool(key).unwrap(), Some(false), "{value} should parse as false");
            std::env::remove_var(key);
        }

        std::env::remove_var("TEST_BOOL_MISSING");
        assert_eq!(env_parse_bool("TEST_BOOL_MISSING").unwrap(), None);

        std::env::set_var("TEST_BOOL_GARBAGE", "maybe");
        let result = env_parse_bool("TEST_BOOL_GARBAGE");
        std::env::remove_var("TEST_BOOL_GARBAGE");
        assert!(matches!(result, Err(ConfigError::Invalid { ref key, .. }) if key == "TEST_BOOL_GARBAGE"));
    }

    #[test]
    fn test_load_from_env_rejects_unknown_bool() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SEGSCAN_TOTAL_SEGMENTS", "4");
        std::env::set_var("SEGSCAN_CONSISTENT_READ", "definitely");

        let result = load_from_env();
        clear_env();

        match result {
            Err(ConfigError::Invalid { key, message }) => {
                assert_eq!(key, "SEGSCAN_CONSISTENT_READ");
                assert!(message.contains("definitely"), "message was: {message}");
            }
            other => panic!("Expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SEGSCAN_TOTAL_SEGMENTS", "8");
        std::env::set_var("SEGSCAN_PAGE_LIMIT", "250");
        std::env::set_var("SEGSCAN_CONSISTENT_READ", "on");
        std::env::set_var("SEGSCAN_MAX_ATTEMPTS", "5");
        std::env::set_var("SEGSCAN_BASE_DELAY_MS", "20");
        std::env::set_var("SEGSCAN_MAX_DELAY_MS", "2000");
        std::env::set_var("SEGSCAN_JITTER", "full");
        std::env::set_var("SEGSCAN_MAX_TOTAL_MS", "10000");

        let result = load_from_env();
        clear_env();

        let settings = result.expect("env settings should load");
        assert_eq!(settings.total_segments, 8);
        assert_eq!(settings.page_limit, Some(250));
        assert!(settings.consistent_read);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.base_delay_ms, 20);
        assert_eq!(settings.retry.max_delay_ms, 2000);
        assert_eq!(settings.retry.jitter, JitterMode::Full);
        assert_eq!(settings.retry.max_total_ms, Some(10_000));
    }

    #[test]
    fn test_load_from_env_only_segments_uses_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("SEGSCAN_TOTAL_SEGMENTS", "3");

        let result = load_from_env();
        clear_env();

        let settings = result.expect("env settings should load");
        assert_eq!(settings.total_segments, 3);
        assert_eq!(settings.retry, RetrySettings::default());
        assert_eq!(settings.page_limit, None);
    }

    #[test]
    fn test_load_from_env_missing_anchor() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("SEGSCAN_MAX_ATTEMPTS", "3");

        let result = load_from_env();
        clear_env();

        match result {
            Err(ConfigError::Missing(key)) => assert_eq!(key, "SEGSCAN_TOTAL_SEGMENTS"),
            other => panic!("Expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_env_invalid_value() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("SEGSCAN_TOTAL_SEGMENTS", "4");
        std::env::set_var("SEGSCAN_JITTER", "sometimes");

        let result = load_from_env();
        clear_env();

        match result {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "SEGSCAN_JITTER"),
            other => panic!("Expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_settings_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
total_segments = 4
page_limit = 100

[retry]
max_attempts = 3
jitter = "none"
"#
        )
        .unwrap();

        let toml_path = file.path().with_extension("toml");
        std::fs::copy(file.path(), &toml_path).unwrap();

        let settings = load_from_file(Some(toml_path.clone())).expect("toml settings should load");
        assert_eq!(settings.total_segments, 4);
        assert_eq!(settings.page_limit, Some(100));
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.jitter, JitterMode::None);

        std::fs::remove_file(toml_path).ok();
    }

    #[test]
    fn test_parse_settings_json() {
        let json = r#"{ "total_segments": 2, "consistent_read": true }"#;
        let settings =
            parse_settings(json, Path::new("segscan.json")).expect("json settings should parse");
        assert_eq!(settings.total_segments, 2);
        assert!(settings.consistent_read);
    }

    #[test]
    fn test_parse_settings_rejects_zero_segments() {
        let result = parse_settings("total_segments = 0", Path::new("segscan.toml"));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_parse_settings_unsupported_format() {
        let result = parse_settings("total_segments: 2", Path::new("segscan.yaml"));
        match result {
            Err(ConfigError::UnsupportedFormat(ext)) => assert_eq!(ext, "yaml"),
            other => panic!("Expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_settings_malformed_json() {
        let result = parse_settings("{ not json", Path::new("segscan.json"));
        assert!(matches!(result, Err(ConfigError::Common(CommonError::Serialization { .. }))));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/segscan.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }
}
