use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::types::{Point, Rect};
use crate::visual::VisualState;

/// Identifies a mounted section within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub u32);

/// A single, stateless instruction for the presentation layer.
///
/// The core emits a `Vec` of these per scroll, frame or resize event.
/// Adapters apply them in order; each command carries everything it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SectionCommand {
    /// Apply a visual state to the item at `index`.
    Style { index: usize, state: VisualState },

    /// Drop any inline visual state from the item at `index`, returning it
    /// to its stylesheet appearance.
    ClearStyle { index: usize },

    /// Insert a placeholder of `height` pixels in the document flow where the
    /// section sits, so siblings do not move when the section leaves the flow.
    ReserveSpace { height: f64 },

    /// Remove the placeholder inserted by `ReserveSpace`.
    RestoreSpace,

    /// Fix the section to the viewport at `rect` (viewport coordinates).
    Fix { rect: Rect },

    /// Return the section to the document flow, shifted down by `offset`
    /// pixels inside its placeholder (0 when released above the range).
    Release { offset: f64 },

    /// Publish the focused item, `None` when the section has no items.
    SetActive { index: Option<usize> },
}

/// A command addressed to one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetedCommand {
    pub section: SectionId,
    #[serde(flatten)]
    pub command: SectionCommand,
}

impl TargetedCommand {
    pub fn new(section: SectionId, command: SectionCommand) -> Self {
        Self { section, command }
    }
}

/// A projected hotspot position on the host canvas. Only visible anchors
/// produce a marker; hidden ones are absent from the frame entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenMarker {
    pub id: u32,
    pub label: SharedStr,
    /// Pixel position relative to the canvas' top-left corner.
    pub position: Point,
    /// Normalized device depth in [-1, 1]; smaller is closer.
    pub depth: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_with_op_tag() {
        let cmd = TargetedCommand::new(
            SectionId(3),
            SectionCommand::Release { offset: 120.0 },
        );
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        assert_eq!(json, r#"{"section":3,"op":"release","offset":120.0}"#);
    }

    #[test]
    fn style_command_carries_full_state() {
        let cmd = SectionCommand::Style {
            index: 1,
            state: VisualState::hidden(Point::new(-50.0, 0.0)),
        };
        let value = serde_json::to_value(&cmd).unwrap_or_default();
        assert_eq!(value["op"], "style");
        assert_eq!(value["state"]["opacity"], 0.0);
        assert_eq!(value["state"]["offset"]["x"], -50.0);
    }
}
