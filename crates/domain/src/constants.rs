//! Domain constants
//!
//! Defaults shared by the request builders and the settings structs.

/// Segments scanned when the caller does not ask for parallelism
pub const DEFAULT_TOTAL_SEGMENTS: u32 = 1;

/// Attempts per page read when no retry is configured (no retry)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

// Backoff defaults used when retries are enabled through settings
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
