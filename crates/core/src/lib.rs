//! Scroll-synchronized presentation engine.
//!
//! The core is host-agnostic: it consumes scroll offsets, viewport sizes,
//! measured layout boxes and frame timestamps, and produces
//! [`TargetedCommand`]s for a presentation layer to apply. The browser
//! binding lives in `scrolly-wasm`; `scrolly-tui` drives the same core in a
//! terminal preview.

pub mod active;
pub mod config;
pub mod content;
pub mod error;
pub mod pin;
pub mod projection;
pub mod registration;
pub mod responsive;
pub mod scroll;
pub mod stage;
pub mod timeline;

pub use active::{ActiveBroadcaster, ActiveChange, ActiveConfig, Region, Subscription, Trigger};
pub use config::{ConfigError, ScrollyConfig};
pub use content::{ContentError, SiteContent};
pub use error::{Error, Result};
pub use pin::{PinConfig, PinController, PinState};
pub use projection::{AnchorPoint, HotspotDriver, ModelBounds, ProjectionConfig};
pub use registration::{Cleanup, RegistrationGroup, Revertible};
pub use responsive::{AnimationMode, MediaConfig, MediaRule, ModeSwitch};
pub use scroll::{ScrollRange, ScrollSample, ScrollTracker, TriggerPosition};
pub use stage::{SectionLayout, SectionSpec, Stage};
pub use timeline::{Easing, Timeline, TimelineConfig};

pub use scrolly_protocol::{
    ItemFrame, Phase, Point, Rect, ScreenMarker, SectionCommand, SectionId, TargetedCommand,
    ViewportSize, VisualState,
};
