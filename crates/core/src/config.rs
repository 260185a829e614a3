//! Stage configuration, loadable from JSON.
//!
//! Every section and field has a default, so `{}` is a complete config and
//! overrides can be partial:
//!
//! ```json
//! {
//!   "timeline": { "split": { "enter": 0.25, "hold": 0.6, "exit": 0.15 }, "scrub_lag": 1.0 },
//!   "pin": { "start": "top top", "end": "+=150%" },
//!   "reveal": { "start": "top 85%", "replay": true },
//!   "media": { "rules": [ { "name": "wide", "min_width": 900, "mode": "pinned" } ] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::active::ActiveConfig;
use crate::pin::PinConfig;
use crate::projection::ProjectionConfig;
use crate::responsive::MediaConfig;
use crate::timeline::{RevealConfig, SlotLayout, TimelineConfig};

/// Tolerance when checking that phase fractions fit in one window.
const SPLIT_EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("phase split enter={enter} hold={hold} exit={exit} must be non-negative and sum to at most 1")]
    Split { enter: f64, hold: f64, exit: f64 },
    #[error("{field} must be a finite non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("slot weights must be finite and non-negative")]
    SlotWeights,
    #[error("active.reference_ratio must be within [0, 1], got {0}")]
    ReferenceRatio(f64),
    #[error("media rule {0:?} has min_width above max_width")]
    MediaRule(String),
    #[error("camera near/far planes must satisfy 0 < near < far")]
    ClipPlanes,
    #[error("camera fov must be within (0, 180) degrees, got {0}")]
    FieldOfView(f32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollyConfig {
    pub timeline: TimelineConfig,
    pub pin: PinConfig,
    pub reveal: RevealConfig,
    pub media: MediaConfig,
    pub active: ActiveConfig,
    pub projection: ProjectionConfig,
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

impl ScrollyConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let split = self.timeline.split;
        let parts = [split.enter, split.hold, split.exit];
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) || split.total() > 1.0 + SPLIT_EPSILON {
            return Err(ConfigError::Split {
                enter: split.enter,
                hold: split.hold,
                exit: split.exit,
            });
        }
        non_negative("timeline.overlap", self.timeline.overlap)?;
        non_negative("timeline.scrub_lag", self.timeline.scrub_lag)?;
        if let SlotLayout::Weighted(weights) = &self.timeline.slots
            && weights.iter().any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(ConfigError::SlotWeights);
        }

        non_negative("reveal.duration", self.reveal.duration)?;
        non_negative("reveal.stagger", self.reveal.stagger)?;

        let ratio = self.active.reference_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::ReferenceRatio(ratio));
        }

        if let Some(rule) = self.media.rules.iter().find(|r| !r.is_satisfiable()) {
            return Err(ConfigError::MediaRule(rule.name.clone()));
        }

        let camera = &self.projection.camera;
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::ClipPlanes);
        }
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(ConfigError::FieldOfView(camera.fov));
        }
        Ok(())
    }
}
