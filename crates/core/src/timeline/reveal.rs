//! Time-based reveal for the stacked (narrow viewport) presentation.
//!
//! Each item fades and slides in once its own trigger line is crossed.
//! Items crossing in the same scroll event are staggered in index order.

use scrolly_protocol::{Point, Rect, SectionCommand, VisualState};
use serde::{Deserialize, Serialize};

use super::easing::Easing;
use crate::scroll::{Edge, TriggerPosition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// When an item triggers, relative to its own box.
    pub start: TriggerPosition,
    /// Displacement an item reveals from.
    pub offset: Point,
    /// Seconds per item.
    pub duration: f64,
    /// Seconds between items triggered together.
    pub stagger: f64,
    pub easing: Easing,
    /// Reverse the reveal when scrolling back above the trigger and play it
    /// again on the next crossing. Off means one-shot.
    pub replay: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            start: TriggerPosition::new(Edge::Top, Edge::Percent(85.0)),
            offset: Point::new(0.0, 50.0),
            duration: 0.8,
            stagger: 0.15,
            easing: Easing::Power3Out,
            replay: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStatus {
    Waiting,
    Playing,
    Shown,
    Reversing,
}

#[derive(Debug, Clone, Copy)]
struct ItemReveal {
    trigger_at: f64,
    delay: f64,
    t: f64,
    status: RevealStatus,
}

#[derive(Debug, Clone)]
pub struct StackedReveal {
    config: RevealConfig,
    items: Vec<ItemReveal>,
}

impl StackedReveal {
    pub fn new(items: &[Rect], viewport_height: f64, config: RevealConfig) -> Self {
        let items = items
            .iter()
            .map(|rect| ItemReveal {
                trigger_at: config.start.resolve(rect, viewport_height),
                delay: 0.0,
                t: 0.0,
                status: RevealStatus::Waiting,
            })
            .collect();
        Self { config, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hide every item, then trigger those already past their line.
    pub fn install(&mut self, offset: f64) -> Vec<SectionCommand> {
        let hidden = VisualState::hidden(self.config.offset);
        let commands = (0..self.items.len())
            .map(|index| SectionCommand::Style {
                index,
                state: hidden,
            })
            .collect();
        self.on_scroll(offset);
        commands
    }

    /// Recompute trigger lines after a layout change. Playback state is kept.
    pub fn remeasure(&mut self, items: &[Rect], viewport_height: f64) {
        for (item, rect) in self.items.iter_mut().zip(items) {
            item.trigger_at = self.config.start.resolve(rect, viewport_height);
        }
    }

    /// Start (or, with replay, reverse) items whose trigger line moved past
    /// `offset`. Returns how many items started playing.
    pub fn on_scroll(&mut self, offset: f64) -> usize {
        let mut batch = 0usize;
        for item in &mut self.items {
            let past = offset >= item.trigger_at;
            match item.status {
                RevealStatus::Waiting | RevealStatus::Reversing if past => {
                    item.delay = if item.status == RevealStatus::Waiting {
                        batch as f64 * self.config.stagger
                    } else {
                        0.0
                    };
                    item.status = RevealStatus::Playing;
                    batch += 1;
                }
                RevealStatus::Playing | RevealStatus::Shown if !past && self.config.replay => {
                    item.delay = 0.0;
                    item.status = RevealStatus::Reversing;
                }
                _ => {}
            }
        }
        batch
    }

    /// Advance playing items by `dt` seconds and emit their new styles.
    pub fn on_frame(&mut self, dt: f64) -> Vec<SectionCommand> {
        let dt = dt.max(0.0);
        let step = if self.config.duration > 0.0 {
            dt / self.config.duration
        } else {
            f64::INFINITY
        };
        let mut commands = Vec::new();
        for (index, item) in self.items.iter_mut().enumerate() {
            let before = item.t;
            match item.status {
                RevealStatus::Playing => {
                    let mut remaining = dt;
                    if item.delay > 0.0 {
                        let used = item.delay.min(remaining);
                        item.delay -= used;
                        remaining -= used;
                        if item.delay > 0.0 {
                            continue;
                        }
                    }
                    let advance = if self.config.duration > 0.0 {
                        remaining / self.config.duration
                    } else {
                        f64::INFINITY
                    };
                    item.t = (item.t + advance).min(1.0);
                    if item.t >= 1.0 {
                        item.status = RevealStatus::Shown;
                    }
                }
                RevealStatus::Reversing => {
                    item.t = (item.t - step).max(0.0);
                    if item.t <= 0.0 {
                        item.status = RevealStatus::Waiting;
                    }
                }
                RevealStatus::Waiting | RevealStatus::Shown => continue,
            }
            if item.t != before {
                let state = Self::state_at(&self.config, item.t);
                commands.push(SectionCommand::Style { index, state });
            }
        }
        commands
    }

    /// Whether any item still needs frames.
    pub fn is_animating(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i.status, RevealStatus::Playing | RevealStatus::Reversing))
    }

    pub fn status(&self, index: usize) -> Option<RevealStatus> {
        self.items.get(index).map(|i| i.status)
    }

    /// How far item `index`'s reveal has played, in [0, 1].
    pub fn item_progress(&self, index: usize) -> Option<f64> {
        self.items.get(index).map(|i| i.t)
    }

    pub fn state(&self, index: usize) -> Option<VisualState> {
        self.items
            .get(index)
            .map(|i| Self::state_at(&self.config, i.t))
    }

    /// Strip every inline style this reveal applied.
    pub fn teardown(&mut self) -> Vec<SectionCommand> {
        for item in &mut self.items {
            *item = ItemReveal {
                trigger_at: item.trigger_at,
                delay: 0.0,
                t: 0.0,
                status: RevealStatus::Waiting,
            };
        }
        (0..self.items.len())
            .map(|index| SectionCommand::ClearStyle { index })
            .collect()
    }

    fn state_at(config: &RevealConfig, t: f64) -> VisualState {
        VisualState::hidden(config.offset).lerp(VisualState::SETTLED, config.easing.apply(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VH: f64 = 800.0;

    /// Three cards stacked 400px apart starting at y = 1000.
    fn cards() -> Vec<Rect> {
        (0..3)
            .map(|i| Rect::new(0.0, 1000.0 + 400.0 * f64::from(i), 360.0, 300.0))
            .collect()
    }

    fn run(reveal: &mut StackedReveal, secs: f64) -> Vec<SectionCommand> {
        let mut all = Vec::new();
        let mut t = 0.0;
        while t < secs {
            all.extend(reveal.on_frame(1.0 / 60.0));
            t += 1.0 / 60.0;
        }
        all
    }

    #[test]
    fn install_hides_everything() {
        let mut reveal = StackedReveal::new(&cards(), VH, RevealConfig::default());
        let commands = reveal.install(0.0);
        assert_eq!(commands.len(), 3);
        assert!(commands.iter().all(|c| matches!(
            c,
            SectionCommand::Style { state, .. } if state.opacity == 0.0
        )));
        assert_eq!(reveal.status(0), Some(RevealStatus::Waiting));
    }

    #[test]
    fn reveals_when_crossing_trigger() {
        let mut reveal = StackedReveal::new(&cards(), VH, RevealConfig::default());
        reveal.install(0.0);
        // "top 85%" of the first card: 1000 - 680 = 320.
        assert_eq!(reveal.on_scroll(319.0), 0);
        assert_eq!(reveal.on_scroll(320.0), 1);
        run(&mut reveal, 1.0);
        assert_eq!(reveal.status(0), Some(RevealStatus::Shown));
        assert_eq!(reveal.state(0), Some(VisualState::SETTLED));
        assert_eq!(reveal.status(1), Some(RevealStatus::Waiting));
    }

    #[test]
    fn simultaneous_triggers_are_staggered() {
        let mut reveal = StackedReveal::new(&cards(), VH, RevealConfig::default());
        reveal.install(0.0);
        assert_eq!(reveal.on_scroll(5000.0), 3);
        run(&mut reveal, 0.1);
        let first = reveal.state(0).map_or(0.0, |s| s.opacity);
        let second = reveal.state(1).map_or(0.0, |s| s.opacity);
        assert!(first > 0.0);
        assert_eq!(second, 0.0);
        run(&mut reveal, 1.5);
        assert!(!reveal.is_animating());
    }

    #[test]
    fn one_shot_stays_revealed() {
        let mut reveal = StackedReveal::new(&cards(), VH, RevealConfig::default());
        reveal.install(400.0);
        run(&mut reveal, 1.0);
        reveal.on_scroll(0.0);
        assert!(run(&mut reveal, 1.0).is_empty());
        assert_eq!(reveal.status(0), Some(RevealStatus::Shown));
    }

    #[test]
    fn replay_reverses_above_trigger() {
        let config = RevealConfig {
            replay: true,
            ..RevealConfig::default()
        };
        let mut reveal = StackedReveal::new(&cards(), VH, config);
        reveal.install(400.0);
        run(&mut reveal, 1.0);
        reveal.on_scroll(0.0);
        assert_eq!(reveal.status(0), Some(RevealStatus::Reversing));
        run(&mut reveal, 1.0);
        assert_eq!(reveal.status(0), Some(RevealStatus::Waiting));
        assert_eq!(reveal.state(0).map(|s| s.opacity), Some(0.0));
    }

    #[test]
    fn teardown_clears_every_item() {
        let mut reveal = StackedReveal::new(&cards(), VH, RevealConfig::default());
        reveal.install(5000.0);
        run(&mut reveal, 0.3);
        let commands = reveal.teardown();
        assert_eq!(
            commands,
            vec![
                SectionCommand::ClearStyle { index: 0 },
                SectionCommand::ClearStyle { index: 1 },
                SectionCommand::ClearStyle { index: 2 },
            ]
        );
        assert!(!reveal.is_animating());
    }
}
