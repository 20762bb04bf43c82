//! Reconnect delay schedule.
//!
//! Exponential doubling from a base delay, capped at a ceiling:
//!
//! ```text
//! attempt:  0     1     2     3     4      5+
//! delay:    1s    2s    4s    8s    16s    30s
//! ```

use std::time::Duration;

/// Base reconnect delay in milliseconds.
pub const BASE_DELAY_MS: u64 = 1_000;

/// Upper bound for any reconnect delay in milliseconds.
pub const MAX_DELAY_MS: u64 = 30_000;

/// Delay before reconnect attempt `attempt`, in milliseconds.
///
/// `min(1000 * 2^attempt, 30000)`. Saturates instead of overflowing, so any
/// attempt count is accepted.
pub fn reconnect_delay_ms(attempt: u32) -> u64 {
    BackoffPolicy::default().delay_ms(attempt)
}

/// Configurable exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay for attempt 0
    pub base_ms: u64,
    /// Ceiling applied after doubling
    pub max_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_ms: BASE_DELAY_MS,
            max_ms: MAX_DELAY_MS,
        }
    }
}

impl BackoffPolicy {
    /// Delays start at `base_ms` and double up to `max_ms`.
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay in milliseconds for the given attempt.
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        let factor = 2u64.saturating_pow(attempt);
        self.base_ms.saturating_mul(factor).min(self.max_ms)
    }

    /// Delay for the given attempt as a `Duration`.
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.delay_ms(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_doubling_sequence() {
        let delays: Vec<u64> = (0..6).map(reconnect_delay_ms).collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 16_000, 30_000]);
    }

    #[test]
    fn test_huge_attempt_is_capped() {
        assert_eq!(reconnect_delay_ms(64), MAX_DELAY_MS);
        assert_eq!(reconnect_delay_ms(u32::MAX), MAX_DELAY_MS);
    }

    #[test]
    fn test_custom_policy() {
        let policy = BackoffPolicy::new(250, 2_000);
        assert_eq!(policy.delay(0), Duration::from_millis(250));
        assert_eq!(policy.delay(2), Duration::from_millis(1_000));
        assert_eq!(policy.delay(10), Duration::from_millis(2_000));
    }

    proptest! {
        #[test]
        fn prop_matches_closed_form(attempt in 0u32..20) {
            let expected = (1_000u64 << attempt).min(30_000);
            prop_assert_eq!(reconnect_delay_ms(attempt), expected);
        }

        #[test]
        fn prop_monotonic_and_capped(attempt in any::<u32>()) {
            let current = reconnect_delay_ms(attempt);
            let next = reconnect_delay_ms(attempt.saturating_add(1));
            prop_assert!(current <= next);
            prop_assert!(next <= MAX_DELAY_MS);
        }
    }
}
