//! Tracing subscriber bootstrap

use tracing_subscriber::{fmt, EnvFilter};

/// Default directive used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install a global `fmt` subscriber
///
/// `RUST_LOG` overrides `default_filter` when set. With `json` the output is
/// one JSON object per event, with current span fields attached.
///
/// Returns `false` if a global subscriber was already installed; repeat calls
/// are harmless.
pub fn init_tracing(default_filter: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let installed = if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(false)
            .with_target(false)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).with_thread_ids(true).try_init()
    };

    installed.is_ok()
}

/// [`init_tracing`] with the format taken from `SEGSCAN_LOG_FORMAT`
/// (`json` or anything else for human-readable output)
pub fn init_tracing_from_env() -> bool {
    let json = std::env::var("SEGSCAN_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    init_tracing(DEFAULT_FILTER, json)
}
