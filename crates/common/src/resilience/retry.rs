//! Generic retry executor with pluggable backoff, jitter and retry policies
//!
//! Attempts are strictly sequential: the next attempt is only issued after
//! the previous one resolved and the backoff delay elapsed. Every failed run
//! surfaces the error of its last attempt through [`RetryError`], it is never
//! swallowed.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::{CommonError, CommonResult};

/// Errors returned when a retried operation does not succeed
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed; `source` is the last attempt's error
    #[error("All {attempts} retry attempts exhausted: {source}")]
    Exhausted { attempts: u32, source: E },

    /// The retry policy refused to retry this error
    #[error("Operation failed with non-retryable error after {attempts} attempts: {source}")]
    NonRetryable { attempts: u32, source: E },

    /// The next backoff delay would exceed the configured total time budget
    #[error("Retry time budget exceeded after {elapsed:?} ({attempts} attempts): {source}")]
    TimeoutExceeded { elapsed: Duration, attempts: u32, source: E },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. }
            | Self::NonRetryable { attempts, .. }
            | Self::TimeoutExceeded { attempts, .. } => *attempts,
        }
    }

    /// Borrow the last error returned by the operation
    pub fn source_ref(&self) -> &E {
        match self {
            Self::Exhausted { source, .. }
            | Self::NonRetryable { source, .. }
            | Self::TimeoutExceeded { source, .. } => source,
        }
    }

    /// Consume the error and return the last error returned by the operation
    pub fn into_source(self) -> E {
        match self {
            Self::Exhausted { source, .. }
            | Self::NonRetryable { source, .. }
            | Self::TimeoutExceeded { source, .. } => source,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Outcome of a retry execution including result and summary statistics.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub attempts: u32,
    pub total_delay: Duration,
    pub timed_out: bool,
    pub first_attempt_time: Instant,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    /// Get the total elapsed time from first attempt to completion.
    pub fn total_elapsed(&self) -> Duration {
        self.first_attempt_time.elapsed()
    }

    /// Get the average delay between attempts (excludes operation execution
    /// time).
    pub fn average_delay(&self) -> Duration {
        if self.attempts <= 1 {
            return Duration::ZERO;
        }
        self.total_delay / (self.attempts - 1)
    }
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Decide whether to retry after the failure of the zero-based `attempt`
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

impl<E, P> RetryPolicy<E> for Arc<P>
where
    P: RetryPolicy<E> + ?Sized,
{
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
        (**self).should_retry(error, attempt)
    }
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Retry the operation with the default backoff delay
    Retry,
    /// Retry the operation with a custom delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Linear backoff: initial_delay + (attempt * increment)
    Linear { initial_delay: Duration, increment: Duration },
    /// Exponential backoff: initial_delay * base^attempt, capped at max_delay
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
    /// Custom backoff function
    Custom(fn(u32) -> Duration),
}

// `Custom` compares by function address.
impl PartialEq for BackoffStrategy {
    fn eq(&self, other: &Self) -> bool {
        use BackoffStrategy::*;
        match (self, other) {
            (Fixed(a), Fixed(b)) => a == b,
            (
                Linear { initial_delay: a_initial, increment: a_increment },
                Linear { initial_delay: b_initial, increment: b_increment },
            ) => a_initial == b_initial && a_increment == b_increment,
            (
                Exponential { initial_delay: a_initial, base: a_base, max_delay: a_max },
                Exponential { initial_delay: b_initial, base: b_base, max_delay: b_max },
            ) => a_initial == b_initial && a_base == b_base && a_max == b_max,
            (Custom(a), Custom(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

impl BackoffStrategy {
    /// Calculate the delay before the retry following the zero-based `attempt`
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Linear { initial_delay, increment } => {
                initial_delay.saturating_add(increment.saturating_mul(attempt))
            }
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
            BackoffStrategy::Custom(f) => f(attempt),
        }
    }
}

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Full jitter: 0 to calculated_delay
    Full,
    /// Equal jitter: calculated_delay/2 to calculated_delay
    Equal,
    /// Decorrelated jitter: base plus up to three times the previous delay
    Decorrelated { base: Duration },
}

impl Jitter {
    /// Apply jitter to the calculated delay
    pub fn apply(&self, delay: Duration, attempt: u32) -> Duration {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(random_up_to(delay_ms)),
            Jitter::Equal => {
                let half = delay_ms / 2;
                Duration::from_millis(half + random_up_to(delay_ms - half))
            }
            Jitter::Decorrelated { base } => {
                let prev_delay = if attempt == 0 { *base } else { delay };
                let prev_ms = u64::try_from(prev_delay.as_millis()).unwrap_or(u64::MAX);
                *base + Duration::from_millis(random_up_to(prev_ms.saturating_mul(3)))
            }
        }
    }
}

fn random_up_to(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max)
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Backoff strategy for calculating delays
    pub backoff: BackoffStrategy,
    /// Jitter type for randomizing delays
    pub jitter: Jitter,
    /// Maximum total time to spend retrying
    pub max_total_time: Option<Duration>,
}

impl Default for RetryConfig {
    /// A single attempt: failures are surfaced without retrying.
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_millis(100),
                base: 2.0,
                max_delay: Duration::from_secs(30),
            },
            jitter: Jitter::Equal,
            max_total_time: None,
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> CommonResult<()> {
        if self.max_attempts == 0 {
            return Err(CommonError::validation_with_value(
                "max_attempts",
                "must be at least 1",
                self.max_attempts.to_string(),
            ));
        }

        match &self.backoff {
            BackoffStrategy::Exponential { base, .. } if *base <= 0.0 => {
                return Err(CommonError::validation_with_value(
                    "backoff.base",
                    "exponential base must be greater than 0",
                    base.to_string(),
                ));
            }
            _ => {}
        }

        Ok(())
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Fixed(delay);
        self
    }

    pub fn linear_backoff(mut self, initial_delay: Duration, increment: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Linear { initial_delay, increment };
        self
    }

    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        base: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.backoff = BackoffStrategy::Exponential { initial_delay, base, max_delay };
        self
    }

    pub fn custom_backoff(mut self, f: fn(u32) -> Duration) -> Self {
        self.config.backoff = BackoffStrategy::Custom(f);
        self
    }

    pub fn no_jitter(mut self) -> Self {
        self.config.jitter = Jitter::None;
        self
    }

    pub fn full_jitter(mut self) -> Self {
        self.config.jitter = Jitter::Full;
        self
    }

    pub fn equal_jitter(mut self) -> Self {
        self.config.jitter = Jitter::Equal;
        self
    }

    pub fn decorrelated_jitter(mut self, base: Duration) -> Self {
        self.config.jitter = Jitter::Decorrelated { base };
        self
    }

    pub fn max_total_time(mut self, duration: Duration) -> Self {
        self.config.max_total_time = Some(duration);
        self
    }

    pub fn unlimited_time(mut self) -> Self {
        self.config.max_total_time = None;
        self
    }

    pub fn build(self) -> CommonResult<RetryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[derive(Debug)]
struct RetryContext {
    /// Zero-based index of the attempt about to run
    attempt: u32,
    start_time: Instant,
    total_delay: Duration,
}

impl RetryContext {
    fn new() -> Self {
        Self { attempt: 0, start_time: Instant::now(), total_delay: Duration::ZERO }
    }

    fn outcome<T, E>(&self, result: RetryResult<T, E>) -> RetryOutcome<T, E> {
        let timed_out = matches!(result, Err(RetryError::TimeoutExceeded { .. }));
        RetryOutcome {
            result,
            attempts: self.attempt + 1,
            total_delay: self.total_delay,
            timed_out,
            first_attempt_time: self.start_time,
        }
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Create with default configuration
    pub fn with_policy(policy: P) -> Self {
        Self::new(RetryConfig::default(), policy)
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<P> RetryExecutor<P> {
    /// Execute an operation with retry logic
    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation with retry logic and return outcome statistics.
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut context = RetryContext::new();
        let max_attempts = self.config.max_attempts.max(1);

        loop {
            let attempt_number = context.attempt + 1;
            debug!(attempt = attempt_number, max_attempts, "Executing operation");

            let error = match operation().await {
                Ok(value) => {
                    if context.attempt > 0 {
                        debug!(retries = context.attempt, "Operation succeeded after retries");
                    }
                    return context.outcome(Ok(value));
                }
                Err(error) => error,
            };

            if attempt_number >= max_attempts {
                if max_attempts > 1 {
                    warn!(attempts = attempt_number, ?error, "All retry attempts exhausted");
                }
                return context.outcome(Err(RetryError::Exhausted {
                    attempts: attempt_number,
                    source: error,
                }));
            }

            let delay = match self.policy.should_retry(&error, context.attempt) {
                RetryDecision::Stop => {
                    debug!(?error, "Retry policy determined not to retry");
                    return context.outcome(Err(RetryError::NonRetryable {
                        attempts: attempt_number,
                        source: error,
                    }));
                }
                RetryDecision::Retry => {
                    let delay = self.config.backoff.calculate_delay(context.attempt);
                    self.config.jitter.apply(delay, context.attempt)
                }
                RetryDecision::RetryAfter(custom_delay) => custom_delay,
            };

            if let Some(max_time) = self.config.max_total_time {
                let elapsed = context.start_time.elapsed();
                if elapsed.saturating_add(delay) > max_time {
                    warn!(?elapsed, attempts = attempt_number, "Retry time budget exceeded");
                    return context.outcome(Err(RetryError::TimeoutExceeded {
                        elapsed,
                        attempts: attempt_number,
                        source: error,
                    }));
                }
            }

            warn!(attempt = attempt_number, ?delay, ?error, "Operation failed, retrying");
            tokio::time::sleep(delay).await;
            context.total_delay += delay;
            context.attempt += 1;
        }
    }
}

/// Convenience function to create a retry executor and execute an operation
pub async fn retry_with_policy<F, Fut, T, E, P>(
    config: RetryConfig,
    policy: P,
    operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: RetryPolicy<E>,
    E: fmt::Debug,
{
    RetryExecutor::new(config, policy).execute(operation).await
}

/// Retry every error up to `config.max_attempts` times
pub async fn retry<F, Fut, T, E>(config: RetryConfig, operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug,
{
    retry_with_policy(config, policies::AlwaysRetry, operation).await
}

/// Pre-defined retry policies for common scenarios
pub mod policies {
    use super::*;

    /// Always retry policy - retries on any error
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Never retry policy - never retries
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Stop
        }
    }

    /// Predicate-based retry policy
    #[derive(Debug)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}
