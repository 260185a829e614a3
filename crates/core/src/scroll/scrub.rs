/// Progress below this distance from the target snaps onto it.
const SNAP_EPSILON: f64 = 1e-4;

/// Largest frame step honoured; longer gaps (tab switches, breakpoints in a
/// debugger) are treated as this long so the catch-up never teleports.
const MAX_FRAME_SECS: f64 = 0.1;

/// Lets displayed progress trail the scroll position.
///
/// Each frame closes `1 - e^(-dt / lag)` of the remaining gap, which is
/// frame-rate independent. A lag of zero follows the target exactly. The
/// smoother only delays *which* progress is displayed; whatever reaches the
/// sequencer is still evaluated statelessly.
#[derive(Debug, Clone, Copy)]
pub struct ScrubSmoother {
    lag: f64,
    current: f64,
    target: f64,
}

impl ScrubSmoother {
    pub fn new(lag_secs: f64, initial: f64) -> Self {
        Self {
            lag: lag_secs.max(0.0),
            current: initial,
            target: initial,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
        if self.lag == 0.0 {
            self.current = target;
        }
    }

    /// Jump straight to `value` (used after a refresh so remeasured layout
    /// does not animate).
    pub fn snap(&mut self, value: f64) {
        self.target = value;
        self.current = value;
    }

    /// Advance by `dt` seconds. Returns `true` if the displayed value moved.
    pub fn tick(&mut self, dt: f64) -> bool {
        if self.is_settled() {
            return false;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_SECS);
        let blend = 1.0 - (-dt / self.lag).exp();
        self.current += (self.target - self.current) * blend;
        if (self.target - self.current).abs() < SNAP_EPSILON {
            self.current = self.target;
        }
        true
    }

    pub fn value(&self) -> f64 {
        self.current
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_lag_follows_exactly() {
        let mut s = ScrubSmoother::new(0.0, 0.0);
        s.set_target(0.7);
        assert_eq!(s.value(), 0.7);
        assert!(!s.tick(0.016));
    }

    #[test]
    fn converges_toward_target() {
        let mut s = ScrubSmoother::new(1.0, 0.0);
        s.set_target(1.0);
        let mut previous = s.value();
        for _ in 0..30 {
            s.tick(1.0 / 60.0);
            assert!(s.value() > previous);
            assert!(s.value() <= 1.0);
            previous = s.value();
        }
        for _ in 0..2000 {
            s.tick(1.0 / 60.0);
        }
        assert!(s.is_settled());
        assert_eq!(s.value(), 1.0);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut a = ScrubSmoother::new(1.0, 0.0);
        let mut b = ScrubSmoother::new(1.0, 0.0);
        a.set_target(1.0);
        b.set_target(1.0);
        a.tick(5.0);
        b.tick(MAX_FRAME_SECS);
        assert_eq!(a.value(), b.value());
    }
}
