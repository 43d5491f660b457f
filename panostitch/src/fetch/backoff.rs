//! Retry backoff policy.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter between retry attempts.
///
/// The delay after failed attempt `n` (1-based) is
/// `base_delay * 2^(n-1)`, capped at `max_delay`, then stretched by a
/// random factor in `[1, 1 + jitter]` so synchronized workers don't retry
/// in lockstep against a struggling server.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Maximum attempts per tile, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Ceiling applied before jitter.
    pub max_delay: Duration,
    /// Proportional jitter, e.g. `0.5` adds up to 50%.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            jitter: 0.5,
        }
    }
}

impl BackoffPolicy {
    /// Delay to sleep after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let unjittered = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);

        if self.jitter <= 0.0 {
            return unjittered;
        }

        let stretch = 1.0 + rand::thread_rng().gen_range(0.0..=self.jitter);
        unjittered.mul_f64(stretch)
    }
}
