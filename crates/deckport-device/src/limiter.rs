//! Repeat rate limiting
//!
//! Repeat-class events fire on every diff pass while a control is held,
//! which at millisecond frame timers is far denser than any consumer wants.
//! One limiter is shared across all controls of a session, so a repeat on
//! one control can suppress a due repeat on another; press and release
//! events always pass.

use deckport_protocol::KeyAction;
use std::time::{Duration, Instant};

/// Minimum spacing between repeat-class emissions.
pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_millis(30);

#[derive(Debug)]
pub struct RepeatLimiter {
    min_interval: Duration,
    last_repeat: Option<Instant>,
}

impl RepeatLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_repeat: None,
        }
    }

    /// Whether an event with `action` may be emitted now. Allowed repeats
    /// advance the shared timestamp; suppressed ones do not.
    pub fn allow(&mut self, action: KeyAction) -> bool {
        if action != KeyAction::Repeat {
            return true;
        }

        let now = Instant::now();
        match self.last_repeat {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_repeat = Some(now);
                true
            }
        }
    }
}

impl Default for RepeatLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REPEAT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_always_pass() {
        let mut limiter = RepeatLimiter::new(Duration::from_secs(3600));
        assert!(limiter.allow(KeyAction::Repeat));
        assert!(limiter.allow(KeyAction::Press));
        assert!(limiter.allow(KeyAction::Release));
        assert!(limiter.allow(KeyAction::Press));
    }

    #[test]
    fn test_repeats_throttled_within_interval() {
        let mut limiter = RepeatLimiter::new(Duration::from_secs(3600));
        assert!(limiter.allow(KeyAction::Repeat));
        assert!(!limiter.allow(KeyAction::Repeat));
        assert!(!limiter.allow(KeyAction::Repeat));
    }

    #[test]
    fn test_limiter_is_shared_not_per_control() {
        // The limiter carries no per-code state; one allowed repeat
        // suppresses the next due repeat no matter which control it
        // belongs to.
        let mut limiter = RepeatLimiter::new(Duration::from_secs(3600));
        assert!(limiter.allow(KeyAction::Repeat)); // control A
        assert!(!limiter.allow(KeyAction::Repeat)); // control B, suppressed
    }

    #[test]
    fn test_zero_interval_disables_throttling() {
        let mut limiter = RepeatLimiter::new(Duration::ZERO);
        for _ in 0..8 {
            assert!(limiter.allow(KeyAction::Repeat));
        }
    }

    #[test]
    fn test_suppressed_repeat_does_not_advance_window() {
        let mut limiter = RepeatLimiter::new(Duration::from_millis(20));
        assert!(limiter.allow(KeyAction::Repeat));
        let _ = limiter.allow(KeyAction::Repeat);
        std::thread::sleep(Duration::from_millis(25));
        // The window is measured from the last *allowed* repeat, so the
        // suppressed one above must not have pushed it forward.
        assert!(limiter.allow(KeyAction::Repeat));
    }
}
