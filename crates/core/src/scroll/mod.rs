//! Viewport scroll tracking: trigger positions, ranges, normalized progress.

pub mod position;
pub mod range;
pub mod scrub;
pub mod tracker;

pub use position::{Edge, EndPosition, Length, PositionError, RangeSpec, TriggerPosition};
pub use range::{RangeRegion, ScrollRange};
pub use scrub::ScrubSmoother;
pub use tracker::{Direction, ScrollSample, ScrollTracker};
