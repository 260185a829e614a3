use serde::{Deserialize, Serialize};

/// The window of document scroll offsets over which a timeline is scrubbed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollRange {
    /// Offset at which progress leaves 0.
    pub start: f64,
    /// Offset at which progress reaches 1.
    pub end: f64,
}

/// Where an offset falls relative to a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRegion {
    Before,
    Within,
    After,
}

impl ScrollRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn distance(&self) -> f64 {
        self.end - self.start
    }

    /// A range that cannot be traversed (content too short, inverted
    /// markers). Such a range counts as already elapsed.
    pub fn is_degenerate(&self) -> bool {
        let distance = self.distance();
        distance.is_nan() || distance <= 0.0
    }

    /// `clamp((offset - start) / distance, 0, 1)`, or 1 for a degenerate range.
    pub fn progress(&self, offset: f64) -> f64 {
        if self.is_degenerate() {
            return 1.0;
        }
        ((offset - self.start) / self.distance()).clamp(0.0, 1.0)
    }

    /// Inverse of [`ScrollRange::progress`] for in-range values.
    pub fn offset_at(&self, progress: f64) -> f64 {
        self.start + self.distance().max(0.0) * progress.clamp(0.0, 1.0)
    }

    pub fn region(&self, offset: f64) -> RangeRegion {
        if self.is_degenerate() || offset >= self.end {
            RangeRegion::After
        } else if offset <= self.start {
            RangeRegion::Before
        } else {
            RangeRegion::Within
        }
    }
}
