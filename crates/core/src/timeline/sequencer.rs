//! Maps a progress value onto per-item enter/hold/exit states.
//!
//! The range [0, 1] is divided into one slot per item (equal or weighted).
//! Item *i*'s window starts at its slot and is `slot * (1 + overlap)` long,
//! so with a positive overlap an item is still exiting while its successor
//! enters. The window is split by [`PhaseSplit`]; any remainder is idle.
//!
//! Evaluation is stateless: [`Timeline::frames`] depends on nothing but the
//! progress argument, so scrubbing backward replays every state exactly.

use scrolly_protocol::{ItemFrame, Phase, Point, VisualState};
use serde::{Deserialize, Serialize};

use super::easing::Easing;
use crate::scroll::{Edge, EndPosition, RangeSpec, TriggerPosition};

/// Fractions of an item's window spent entering, holding and exiting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSplit {
    pub enter: f64,
    pub hold: f64,
    pub exit: f64,
}

impl Default for PhaseSplit {
    fn default() -> Self {
        Self {
            enter: 0.3,
            hold: 0.5,
            exit: 0.2,
        }
    }
}

impl PhaseSplit {
    pub fn total(&self) -> f64 {
        self.enter + self.hold + self.exit
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotLayout {
    #[default]
    Equal,
    /// Relative slot lengths; missing entries count as 1, negative as 0.
    Weighted(Vec<f64>),
}

/// What the final item does at the end of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalPolicy {
    /// The last item never exits; its hold extends to progress 1.
    #[default]
    HoldLast,
    ExitAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Motion {
    /// Displacement an item enters from.
    pub enter_offset: Point,
    /// Displacement an item exits toward.
    pub exit_offset: Point,
    /// Scale reached at the end of the exit.
    pub exit_scale: f64,
    pub enter_easing: Easing,
    pub exit_easing: Easing,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            enter_offset: Point::new(-50.0, 0.0),
            exit_offset: Point::new(0.0, -20.0),
            exit_scale: 0.92,
            enter_easing: Easing::Power2Out,
            exit_easing: Easing::Power2In,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub split: PhaseSplit,
    /// How far each item's window extends past its own slot, as a fraction
    /// of the slot. 0 gives disjoint slots.
    pub overlap: f64,
    pub slots: SlotLayout,
    pub terminal: TerminalPolicy,
    pub motion: Motion,
    /// Seconds the displayed progress trails the scroll position. 0 follows
    /// the scrollbar exactly.
    pub scrub_lag: f64,
    /// Range scrubbed by sections that animate without pinning.
    pub scrub_range: RangeSpec,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            split: PhaseSplit::default(),
            overlap: 0.6,
            slots: SlotLayout::Equal,
            terminal: TerminalPolicy::HoldLast,
            motion: Motion::default(),
            scrub_lag: 0.0,
            scrub_range: RangeSpec {
                start: TriggerPosition::new(Edge::Top, Edge::Center),
                end: EndPosition::Absolute(TriggerPosition::new(Edge::Bottom, Edge::Center)),
            },
        }
    }
}

/// Absolute phase boundaries of one item, in progress space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ItemWindow {
    start: f64,
    len: f64,
    enter_end: f64,
    hold_end: f64,
    exit_end: f64,
}

/// The precomputed phase layout for a fixed number of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    windows: Vec<ItemWindow>,
    motion: Motion,
}

fn slot_weights(count: usize, slots: &SlotLayout) -> Vec<f64> {
    let weights: Vec<f64> = match slots {
        SlotLayout::Equal => vec![1.0; count],
        SlotLayout::Weighted(w) => (0..count)
            .map(|i| w.get(i).copied().unwrap_or(1.0).max(0.0))
            .collect(),
    };
    let total: f64 = weights.iter().sum();
    if total > 0.0 && total.is_finite() {
        weights.into_iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / count.max(1) as f64; count]
    }
}

impl Timeline {
    pub fn new(count: usize, config: &TimelineConfig) -> Self {
        let slots = slot_weights(count, &config.slots);
        let split = config.split;
        let overlap = config.overlap.max(0.0);

        let mut windows = Vec::with_capacity(count);
        let mut start = 0.0;
        for (i, slot) in slots.iter().enumerate() {
            let len = slot * (1.0 + overlap);
            let mut window = ItemWindow {
                start,
                len,
                enter_end: start + split.enter * len,
                hold_end: start + (split.enter + split.hold) * len,
                exit_end: start + split.total() * len,
            };
            let terminal = i + 1 == count && config.terminal == TerminalPolicy::HoldLast;
            if terminal {
                window.enter_end = window.enter_end.min(1.0);
                window.hold_end = f64::INFINITY;
                window.exit_end = f64::INFINITY;
            }
            windows.push(window);
            start += slot;
        }

        Self {
            windows,
            motion: config.motion,
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// State of every item at `progress`. Values outside [0, 1] are clamped.
    pub fn frames(&self, progress: f64) -> Vec<ItemFrame> {
        (0..self.windows.len())
            .map(|i| self.frame_at(i, progress))
            .collect()
    }

    /// State of item `index` at `progress`.
    ///
    /// # Panics
    ///
    /// Never: an out-of-range index yields a hidden pending frame.
    pub fn frame_at(&self, index: usize, progress: f64) -> ItemFrame {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let Some(w) = self.windows.get(index) else {
            return ItemFrame {
                index,
                phase: Phase::Pending,
                local: 0.0,
                state: VisualState::hidden(self.motion.enter_offset),
            };
        };

        let local = if w.len > 0.0 {
            ((p - w.start) / w.len).clamp(0.0, 1.0)
        } else if p >= w.start {
            1.0
        } else {
            0.0
        };

        let m = &self.motion;
        let (phase, state) = if p < w.start {
            (Phase::Pending, VisualState::hidden(m.enter_offset))
        } else if p < w.enter_end {
            let t = (p - w.start) / (w.enter_end - w.start);
            let e = m.enter_easing.apply(t);
            (
                Phase::Enter,
                VisualState::new(e, m.enter_offset.scale(1.0 - e), 1.0),
            )
        } else if p < w.hold_end {
            (Phase::Hold, VisualState::SETTLED)
        } else if p < w.exit_end {
            let t = (p - w.hold_end) / (w.exit_end - w.hold_end);
            let e = m.exit_easing.apply(t);
            (
                Phase::Exit,
                VisualState::new(
                    1.0 - e,
                    m.exit_offset.scale(e),
                    1.0 + (m.exit_scale - 1.0) * e,
                ),
            )
        } else {
            (
                Phase::Done,
                VisualState::new(0.0, m.exit_offset, m.exit_scale),
            )
        };

        ItemFrame {
            index,
            phase,
            local,
            state,
        }
    }

    /// Each item's hold interval `[start, end)` in progress space, clipped to
    /// [0, 1]. Used to decide which item is in focus.
    pub fn hold_windows(&self) -> Vec<(f64, f64)> {
        self.windows
            .iter()
            .map(|w| (w.enter_end.min(1.0), w.hold_end.min(1.0)))
            .collect()
    }
}

/// One-shot convenience over [`Timeline::new`] + [`Timeline::frames`].
pub fn sequence(progress: f64, count: usize, config: &TimelineConfig) -> Vec<ItemFrame> {
    Timeline::new(count, config).frames(progress)
}
