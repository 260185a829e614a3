use std::cell::Cell;
use std::rc::Rc;

use crate::registration::Revertible;

/// Turns animation-frame timestamps (milliseconds) into clamped deltas.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    max_dt: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl FrameClock {
    pub fn new(max_dt_secs: f64) -> Self {
        Self {
            last_ms: None,
            max_dt: max_dt_secs.max(0.0),
        }
    }

    /// Seconds since the previous timestamp. The first frame, and any frame
    /// with a timestamp going backwards, reads as 0.
    pub fn tick(&mut self, timestamp_ms: f64) -> f64 {
        let dt = match self.last_ms {
            Some(last) if timestamp_ms > last => (timestamp_ms - last) / 1000.0,
            _ => 0.0,
        };
        if timestamp_ms.is_finite() {
            self.last_ms = Some(timestamp_ms);
        }
        dt.min(self.max_dt)
    }

    /// Forget the previous timestamp, e.g. after the loop was paused.
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Shared flag telling a frame loop to stop. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

impl Revertible for CancelToken {
    fn revert(&mut self) {
        self.cancel();
    }
}
