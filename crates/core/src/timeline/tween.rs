use serde::{Deserialize, Serialize};

use super::easing::Easing;

/// A scalar interpolated between two values along an easing curve.
///
/// Scrubbed tweens are evaluated at a progress value; timed ones go through
/// [`TimedTween`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, easing: Easing) -> Self {
        Self { from, to, easing }
    }

    pub fn at(&self, progress: f64) -> f64 {
        self.from + (self.to - self.from) * self.easing.apply(progress)
    }
}

/// A [`Tween`] advanced by frame time instead of scroll position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedTween {
    tween: Tween,
    duration: f64,
    elapsed: f64,
    started: bool,
}

impl TimedTween {
    pub fn new(tween: Tween, duration_secs: f64) -> Self {
        Self {
            tween,
            duration: duration_secs.max(0.0),
            elapsed: 0.0,
            started: false,
        }
    }

    /// Begin (or restart) playback from the first value.
    pub fn play(&mut self) {
        self.elapsed = 0.0;
        self.started = true;
    }

    /// Advance by `dt` seconds. Returns the new value while running.
    pub fn tick(&mut self, dt: f64) -> Option<f64> {
        if !self.is_running() {
            return None;
        }
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        if self.duration == 0.0 {
            // Zero-length tweens complete on their first frame.
            self.elapsed = f64::EPSILON;
        }
        Some(self.value())
    }

    pub fn progress(&self) -> f64 {
        if !self.started {
            0.0
        } else if self.duration == 0.0 {
            if self.elapsed > 0.0 { 1.0 } else { 0.0 }
        } else {
            self.elapsed / self.duration
        }
    }

    pub fn value(&self) -> f64 {
        self.tween.at(self.progress())
    }

    pub fn is_running(&self) -> bool {
        self.started && !self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.progress() >= 1.0
    }
}

/// A statistic that counts from zero up to its target once triggered.
/// Displayed values are rounded up, so the final frame shows the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountUp {
    target: u64,
    tween: TimedTween,
    triggered: bool,
}

impl CountUp {
    pub const DEFAULT_DURATION: f64 = 2.5;

    pub fn new(target: u64) -> Self {
        Self::with_duration(target, Self::DEFAULT_DURATION)
    }

    pub fn with_duration(target: u64, duration_secs: f64) -> Self {
        Self {
            target,
            tween: TimedTween::new(
                Tween::new(0.0, target as f64, Easing::Power2Out),
                duration_secs,
            ),
            triggered: false,
        }
    }

    /// Start counting. Later calls are ignored; the count plays once.
    pub fn trigger(&mut self) {
        if !self.triggered {
            self.triggered = true;
            self.tween.play();
        }
    }

    /// Advance by `dt` seconds; returns the displayed value if it changed.
    pub fn tick(&mut self, dt: f64) -> Option<u64> {
        let before = self.value();
        self.tween.tick(dt)?;
        let after = self.value();
        (after != before).then_some(after)
    }

    pub fn value(&self) -> u64 {
        if !self.triggered {
            return 0;
        }
        let v = self.tween.value().ceil();
        if v <= 0.0 { 0 } else { (v as u64).min(self.target) }
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }
}
