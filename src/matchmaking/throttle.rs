//! Client-side spacing of join attempts

use std::time::Duration;
use tokio::time::Instant;

/// Admits at most one join attempt per cooldown window
#[derive(Debug, Clone)]
pub struct JoinThrottle {
    cooldown: Duration,
    last_admitted: Option<Instant>,
}

impl JoinThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_admitted: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Admit an attempt now, or return how long until the next one is allowed
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    /// Refused attempts do not move the window
    pub fn try_acquire_at(&mut self, now: Instant) -> Result<(), Duration> {
        if let Some(last) = self.last_admitted {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return Err(self.cooldown - elapsed);
            }
        }
        self.last_admitted = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_first_attempt_admitted() {
        let mut throttle = JoinThrottle::new(Duration::from_millis(1500));
        assert_ok!(throttle.try_acquire_at(Instant::now()));
    }

    #[test]
    fn test_attempts_inside_window_refused() {
        let mut throttle = JoinThrottle::new(Duration::from_millis(1500));
        let start = Instant::now();

        assert_ok!(throttle.try_acquire_at(start));
        let remaining = assert_err!(throttle.try_acquire_at(start + Duration::from_millis(1000)));
        assert_eq!(remaining, Duration::from_millis(500));

        // The refused attempt didn't restart the window
        assert_ok!(throttle.try_acquire_at(start + Duration::from_millis(1500)));
    }

    #[test]
    fn test_zero_cooldown_never_refuses() {
        let mut throttle = JoinThrottle::new(Duration::ZERO);
        let now = Instant::now();
        assert_ok!(throttle.try_acquire_at(now));
        assert_ok!(throttle.try_acquire_at(now));
    }
}
