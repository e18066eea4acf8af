use std::time::Duration;

/// Metrics need one sample past the window to close the last pair.
pub const SAFETY_MARGIN: Duration = Duration::from_secs(1);

/// Keeps successive polling cycles roughly one window apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    window: Duration,
    safety_margin: Duration,
}

impl PacingPolicy {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            safety_margin: SAFETY_MARGIN,
        }
    }

    #[allow(dead_code)]
    pub fn with_safety_margin(mut self, safety_margin: Duration) -> Self {
        self.safety_margin = safety_margin;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// `max(0, window - elapsed - margin)`
    pub fn sleep_after(&self, elapsed: Duration) -> Duration {
        self.window
            .saturating_sub(elapsed)
            .saturating_sub(self.safety_margin)
    }

    /// The cycle used up the whole window; the next one starts immediately.
    pub fn overran(&self, elapsed: Duration) -> bool {
        self.sleep_after(elapsed).is_zero()
    }
}
