use std::time::Duration;

/// Countdown sampled once per simulation tick.
///
/// A zero countdown is idle. Durations are exact, so a countdown of `n * dt` fires on tick `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: Duration,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            remaining: duration,
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.remaining.is_zero()
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn reset(&mut self, duration: Duration) {
        self.remaining = duration;
    }

    pub fn clear(&mut self) {
        self.remaining = Duration::ZERO;
    }

    /// Advances by one tick. Returns true only on the tick the countdown reaches zero.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if self.remaining.is_zero() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }
}
