use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Where an item sits on its own sub-timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Progress has not reached the item's window yet.
    Pending,
    /// Fading/sliding in.
    Enter,
    /// Fully visible and settled.
    Hold,
    /// Fading out with a slight scale-down.
    Exit,
    /// Past the item's window.
    Done,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Enter => "enter",
            Phase::Hold => "hold",
            Phase::Exit => "exit",
            Phase::Done => "done",
        }
    }
}

/// The visual properties the core computes for one animated element.
///
/// Adapters translate this into whatever the rendering technology needs
/// (CSS `opacity` + `transform` in the browser, shading in the terminal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub opacity: f64,
    pub offset: Point,
    pub scale: f64,
}

impl VisualState {
    /// Fully visible at its resting position.
    pub const SETTLED: VisualState = VisualState {
        opacity: 1.0,
        offset: Point::ZERO,
        scale: 1.0,
    };

    pub fn new(opacity: f64, offset: Point, scale: f64) -> Self {
        Self {
            opacity,
            offset,
            scale,
        }
    }

    /// Invisible, displaced by `offset`.
    pub fn hidden(offset: Point) -> Self {
        Self {
            opacity: 0.0,
            offset,
            scale: 1.0,
        }
    }

    pub fn lerp(self, to: VisualState, t: f64) -> VisualState {
        VisualState {
            opacity: self.opacity + (to.opacity - self.opacity) * t,
            offset: self.offset.lerp(to.offset, t),
            scale: self.scale + (to.scale - self.scale) * t,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// One item's computed state for a given progress value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemFrame {
    pub index: usize,
    pub phase: Phase,
    /// Progress through the item's own window, clamped to [0, 1].
    pub local: f64,
    pub state: VisualState,
}
