//! Retry wiring for segment reads

use std::time::Duration;

use segscan_common::{CommonResult, RetryConfig, RetryDecision, RetryPolicy};
use segscan_domain::{JitterMode, RetrySettings, StoreError};

/// Retry only errors the store reports as transient
///
/// Throttling, unavailability and timeouts are retried; invalid requests and
/// other permanent failures stop the chain after one attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientRetry;

impl RetryPolicy<StoreError> for TransientRetry {
    fn should_retry(&self, error: &StoreError, _attempt: u32) -> RetryDecision {
        if error.is_transient() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// Build an exponential-backoff [`RetryConfig`] from loaded settings
pub fn retry_config_from_settings(settings: &RetrySettings) -> CommonResult<RetryConfig> {
    let builder = RetryConfig::builder().max_attempts(settings.max_attempts).exponential_backoff(
        Duration::from_millis(settings.base_delay_ms),
        2.0,
        Duration::from_millis(settings.max_delay_ms),
    );

    let builder = match settings.jitter {
        JitterMode::None => builder.no_jitter(),
        JitterMode::Full => builder.full_jitter(),
        JitterMode::Equal => builder.equal_jitter(),
    };

    let builder = match settings.max_total_ms {
        Some(ms) => builder.max_total_time(Duration::from_millis(ms)),
        None => builder.unlimited_time(),
    };

    builder.build()
}
