//! Exponential backoff with jitter for lock polling.

use std::time::Duration;

use rand::Rng;

/// First wait between acquisition attempts.
pub const POLL_BASE_MS: u64 = 100;

/// Longest wait between acquisition attempts.
pub const POLL_MAX_MS: u64 = 1000;

/// Delay before poll attempt `attempt` (1-based).
pub fn poll_delay(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential = 2u64.saturating_pow(attempt.min(16) - 1);
    let capped = POLL_BASE_MS.saturating_mul(exponential).min(POLL_MAX_MS);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}
