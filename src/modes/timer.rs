//! Interval timer for per-frame rate limiting

use std::time::{Duration, Instant};

/// Fires at most once per period when polled
#[derive(Debug, Clone)]
pub struct Every {
    period: Duration,
    last: Option<Instant>,
    immediate: bool,
}

impl Every {
    /// First fire one full period after the first poll
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last: None,
            immediate: false,
        }
    }

    /// First fire on the first poll
    pub fn immediate(period: Duration) -> Self {
        Self {
            immediate: true,
            ..Self::new(period)
        }
    }

    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Poll the timer; true when a period has elapsed since the last fire
    pub fn ready(&mut self, now: Instant) -> bool {
        let Some(last) = self.last else {
            self.last = Some(now);
            return self.immediate;
        };
        if now.saturating_duration_since(last) >= self.period {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    /// Forget the last fire, as if freshly created
    pub fn reset(&mut self) {
        self.last = None;
    }
}
