//! Exponential retry delay.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// First retry delay after a successful open.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound on the retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(8000);

// ============================================================================
// Backoff
// ============================================================================

/// Doubling delay, capped at a maximum.
///
/// ```
/// use std::time::Duration;
/// use blockv_realtime::realtime::Backoff;
///
/// let mut backoff = Backoff::default();
/// let delays: Vec<_> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();
/// assert_eq!(delays, [1000, 2000, 4000, 8000, 8000]);
///
/// backoff.reset();
/// assert_eq!(backoff.current(), Duration::from_millis(1000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl Backoff {
    /// Creates a backoff starting at `initial` and capped at `max`.
    #[inline]
    #[must_use]
    pub const fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay the next retry would use.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> Duration {
        self.current
    }

    /// Delay used right after a reset.
    #[inline]
    #[must_use]
    pub const fn initial(&self) -> Duration {
        self.initial
    }

    /// Upper bound on any returned delay.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Returns the current delay and doubles it for next time.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Goes back to the initial delay.
    #[inline]
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence() {
        let mut backoff = Backoff::default();
        let delays: Vec<u128> = (0..7).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000, 8000, 8000]);
    }

    #[test]
    fn test_reset_from_any_value() {
        let mut backoff = Backoff::default();
        for _ in 0..10 {
            backoff.next_delay();
        }
        assert_eq!(backoff.current(), DEFAULT_MAX_DELAY);

        backoff.reset();
        assert_eq!(backoff.current(), DEFAULT_INITIAL_DELAY);
        assert_eq!(backoff.next_delay(), DEFAULT_INITIAL_DELAY);
    }

    #[test]
    fn test_custom_bounds_not_power_of_two() {
        let mut backoff = Backoff::new(Duration::from_millis(300), Duration::from_millis(1000));
        let delays: Vec<u128> = (0..4).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![300, 600, 1000, 1000]);
    }

    #[test]
    fn test_accessors() {
        let backoff = Backoff::new(Duration::from_millis(5), Duration::from_millis(40));
        assert_eq!(backoff.initial(), Duration::from_millis(5));
        assert_eq!(backoff.max(), Duration::from_millis(40));
        assert_eq!(backoff.current(), Duration::from_millis(5));
    }
}
