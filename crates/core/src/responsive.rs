//! Chooses the presentation for the current viewport width.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// Scroll-scrubbed timelines, pinned where the section asks for it.
    Pinned,
    /// Items reveal once, one after another, in normal flow.
    Stacked,
}

/// A width condition, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRule {
    pub name: String,
    #[serde(default)]
    pub min_width: Option<f64>,
    #[serde(default)]
    pub max_width: Option<f64>,
    pub mode: AnimationMode,
}

impl MediaRule {
    pub fn new(
        name: impl Into<String>,
        min_width: Option<f64>,
        max_width: Option<f64>,
        mode: AnimationMode,
    ) -> Self {
        Self {
            name: name.into(),
            min_width,
            max_width,
            mode,
        }
    }

    pub fn matches(&self, width: f64) -> bool {
        self.min_width.is_none_or(|min| width >= min) && self.max_width.is_none_or(|max| width <= max)
    }

    pub fn is_satisfiable(&self) -> bool {
        match (self.min_width, self.max_width) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Checked in order; the first match decides.
    pub rules: Vec<MediaRule>,
    /// Used when no rule matches.
    pub fallback: AnimationMode,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                MediaRule::new("desktop", Some(1024.0), None, AnimationMode::Pinned),
                MediaRule::new("tablet", Some(768.0), Some(1023.0), AnimationMode::Pinned),
                MediaRule::new("mobile", None, Some(767.0), AnimationMode::Stacked),
            ],
            fallback: AnimationMode::Stacked,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModeChange {
    pub from: Option<AnimationMode>,
    pub to: AnimationMode,
    /// Name of the rule that matched, if any.
    pub rule: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModeSwitch {
    config: MediaConfig,
    current: Option<AnimationMode>,
}

impl ModeSwitch {
    pub fn new(config: MediaConfig) -> Self {
        for rule in config.rules.iter().filter(|r| !r.is_satisfiable()) {
            tracing::warn!(rule = %rule.name, "media rule can never match");
        }
        Self {
            config,
            current: None,
        }
    }

    pub fn current(&self) -> Option<AnimationMode> {
        self.current
    }

    /// The mode for `width` without changing state.
    pub fn resolve(&self, width: f64) -> (AnimationMode, Option<&str>) {
        self.config
            .rules
            .iter()
            .find(|r| r.matches(width))
            .map_or((self.config.fallback, None), |r| (r.mode, Some(r.name.as_str())))
    }

    /// Record `width`; returns a change only when the mode differs from the
    /// current one. The first evaluation always reports a change.
    pub fn evaluate(&mut self, width: f64) -> Option<ModeChange> {
        let (mode, rule) = self.resolve(width);
        if self.current == Some(mode) {
            return None;
        }
        let change = ModeChange {
            from: self.current,
            to: mode,
            rule: rule.map(str::to_owned),
        };
        tracing::info!(width, from = ?change.from, to = ?change.to, "animation mode switched");
        self.current = Some(mode);
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_breakpoints() {
        let switch = ModeSwitch::new(MediaConfig::default());
        assert_eq!(switch.resolve(1200.0), (AnimationMode::Pinned, Some("desktop")));
        assert_eq!(switch.resolve(800.0), (AnimationMode::Pinned, Some("tablet")));
        assert_eq!(switch.resolve(767.0), (AnimationMode::Stacked, Some("mobile")));
        assert_eq!(switch.resolve(400.0), (AnimationMode::Stacked, Some("mobile")));
        // Fractional widths between the rules fall through to the fallback.
        assert_eq!(switch.resolve(767.5), (AnimationMode::Stacked, None));
    }

    #[test]
    fn evaluate_reports_only_crossings() {
        let mut switch = ModeSwitch::new(MediaConfig::default());
        let first = switch.evaluate(1200.0);
        assert_eq!(
            first,
            Some(ModeChange {
                from: None,
                to: AnimationMode::Pinned,
                rule: Some("desktop".to_string())
            })
        );
        assert_eq!(switch.evaluate(900.0), None);
        let change = switch.evaluate(400.0);
        assert_eq!(change.map(|c| (c.from, c.to)), Some((Some(AnimationMode::Pinned), AnimationMode::Stacked)));
        assert_eq!(switch.current(), Some(AnimationMode::Stacked));
    }

    #[test]
    fn rules_parse_from_json() {
        let json = r#"{"rules":[{"name":"wide","min_width":600,"mode":"pinned"}],"fallback":"stacked"}"#;
        let config: MediaConfig = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(config.rules.len(), 1);
        let switch = ModeSwitch::new(config);
        assert_eq!(switch.resolve(500.0).0, AnimationMode::Stacked);
        assert_eq!(switch.resolve(700.0).0, AnimationMode::Pinned);
    }
}
