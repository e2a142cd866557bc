//! Resilience patterns for fault tolerance
//!
//! Currently this is the generic [`retry`] executor: a configurable retry
//! loop with pluggable backoff, jitter and retry policies. It is generic over
//! the operation's error type and carries the last error out of every failed
//! run, so callers can report exactly what went wrong.
//!
//! ```rust,ignore
//! use segscan_common::resilience::{RetryConfig, RetryExecutor, policies::AlwaysRetry};
//!
//! let config = RetryConfig::builder().max_attempts(3).fixed_backoff(Duration::from_millis(50)).build()?;
//! let page = RetryExecutor::new(config, AlwaysRetry).execute(|| store.read(&request)).await?;
//! ```

pub mod retry;

pub use retry::{
    policies, retry, retry_with_policy, BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder,
    RetryDecision, RetryError, RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
