//! Inline CSS produced from core commands. Pure string building, so it is
//! testable off the browser.

use scrolly_protocol::{Rect, VisualState};

/// `transform` value for an item state. Identity states yield `"none"` so
/// the element keeps its natural stacking context.
pub fn transform(state: &VisualState) -> String {
    let moved = state.offset.x != 0.0 || state.offset.y != 0.0;
    let scaled = state.scale != 1.0;
    match (moved, scaled) {
        (false, false) => "none".to_string(),
        (true, false) => format!(
            "translate3d({}px, {}px, 0)",
            px(state.offset.x),
            px(state.offset.y)
        ),
        (false, true) => format!("scale({})", ratio(state.scale)),
        (true, true) => format!(
            "translate3d({}px, {}px, 0) scale({})",
            px(state.offset.x),
            px(state.offset.y),
            ratio(state.scale)
        ),
    }
}

pub fn opacity(state: &VisualState) -> String {
    ratio(state.opacity.clamp(0.0, 1.0))
}

/// Declarations that hold a pinned section at `rect` in viewport space.
pub fn fixed(rect: &Rect) -> [(&'static str, String); 5] {
    [
        ("position", "fixed".to_string()),
        ("top", format!("{}px", px(rect.y))),
        ("left", format!("{}px", px(rect.x))),
        ("width", format!("{}px", px(rect.w))),
        ("height", format!("{}px", px(rect.h))),
    ]
}

/// Properties written by [`fixed`], removed again on release.
pub const FIXED_PROPERTIES: [&str; 5] = ["position", "top", "left", "width", "height"];

/// Marker placement for a projected hotspot.
pub fn marker_position(x: f64, y: f64) -> String {
    format!("translate3d({}px, {}px, 0) translate(-50%, -50%)", px(x), px(y))
}

fn px(value: f64) -> String {
    trim(format!("{value:.2}"))
}

fn ratio(value: f64) -> String {
    trim(format!("{value:.4}"))
}

fn trim(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
