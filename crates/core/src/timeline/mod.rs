//! Timelines: progress-driven sequencing, time-driven reveals, tweens.

pub mod easing;
pub mod reveal;
pub mod sequencer;
pub mod tween;

pub use easing::Easing;
pub use reveal::{RevealConfig, RevealStatus, StackedReveal};
pub use sequencer::{
    Motion, PhaseSplit, SlotLayout, TerminalPolicy, Timeline, TimelineConfig, sequence,
};
pub use tween::{CountUp, TimedTween, Tween};
