pub mod commands;
pub mod shared_str;
pub mod types;
pub mod visual;

pub use commands::{ScreenMarker, SectionCommand, SectionId, TargetedCommand};
pub use shared_str::SharedStr;
pub use types::{Point, Rect, ViewportSize};
pub use visual::{ItemFrame, Phase, VisualState};
