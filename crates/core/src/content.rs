//! Display content handed to the stage: ordered entries per section, model
//! hotspots and headline statistics. The core never interprets the text.

use std::collections::HashSet;

use glam::Vec3;
use scrolly_protocol::SharedStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::AnchorPoint;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid content JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("section id {0:?} appears more than once")]
    DuplicateSection(String),
    #[error("hotspot id {0} appears more than once")]
    DuplicateHotspot(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Secondary line, e.g. a testimonial author's role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    pub id: String,
    #[serde(default)]
    pub heading: String,
    /// Whether the scrubbed presentation pins this section.
    #[serde(default = "default_true")]
    pub pin: bool,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: u32,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Normalized model-space position, each axis in [-1, 1].
    pub anchor: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub label: String,
    pub value: u64,
    #[serde(default)]
    pub suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteContent {
    #[serde(default)]
    pub sections: Vec<SectionContent>,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
    #[serde(default)]
    pub stats: Vec<Stat>,
}

impl SiteContent {
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let content: Self = serde_json::from_str(json)?;
        content.validate()?;
        Ok(content)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.id.as_str()) {
                return Err(ContentError::DuplicateSection(section.id.clone()));
            }
        }
        let mut seen = HashSet::new();
        for hotspot in &self.hotspots {
            if !seen.insert(hotspot.id) {
                return Err(ContentError::DuplicateHotspot(hotspot.id));
            }
        }
        Ok(())
    }

    pub fn section(&self, id: &str) -> Option<&SectionContent> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn hotspot(&self, id: u32) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == id)
    }

    /// Hotspots as projection anchors, in content order.
    pub fn anchors(&self) -> Vec<AnchorPoint> {
        self.hotspots
            .iter()
            .map(|h| AnchorPoint {
                id: h.id,
                label: SharedStr::from(h.label.as_str()),
                position: h.anchor,
            })
            .collect()
    }
}
