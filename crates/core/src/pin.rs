//! Pinning: hold a section in place while its timeline is scrubbed.
//!
//! The controller is driven only by progress crossing 0 and 1. While
//! `0 < progress < 1` the section is fixed to the viewport; outside it sits
//! in normal flow, released at whichever end it left from. Placeholder space
//! is reserved on the first pin and kept until [`PinController::revert`], so
//! content after the section never jumps.

use scrolly_protocol::{Rect, SectionCommand};
use serde::{Deserialize, Serialize};

use crate::scroll::{Edge, EndPosition, Length, RangeSpec, ScrollRange, TriggerPosition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub start: TriggerPosition,
    pub end: EndPosition,
    /// Reserve the pinned distance in document flow.
    pub spacing: bool,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            start: TriggerPosition::new(Edge::Top, Edge::Top),
            end: EndPosition::Relative(Length::ElementScale(1.5)),
            spacing: true,
        }
    }
}

impl PinConfig {
    pub fn range_spec(&self) -> RangeSpec {
        RangeSpec {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinPhase {
    #[default]
    Unpinned,
    Pinning,
    Pinned,
    Unpinning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinState {
    /// The section is held in place by a `Fix`.
    pub pinned: bool,
    /// A placeholder occupies the section's place in flow.
    pub space_reserved: bool,
}

/// One step of the state machine and the command that realises it.
#[derive(Debug, Clone, PartialEq)]
pub struct PinTransition {
    pub from: PinPhase,
    pub to: PinPhase,
    pub command: Option<SectionCommand>,
}

/// Measured layout the controller pins against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinGeometry {
    /// The section's box in document coordinates, measured unpinned.
    pub section: Rect,
    /// Offsets between which the section stays pinned.
    pub range: ScrollRange,
}

impl PinGeometry {
    pub fn measure(section: Rect, viewport_height: f64, config: &PinConfig) -> Self {
        Self {
            section,
            range: config.range_spec().measure(&section, viewport_height),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PinController {
    geometry: PinGeometry,
    spacing: bool,
    phase: PinPhase,
    state: PinState,
}

impl PinController {
    pub fn new(geometry: PinGeometry, spacing: bool) -> Self {
        Self {
            geometry,
            spacing,
            phase: PinPhase::Unpinned,
            state: PinState::default(),
        }
    }

    pub fn phase(&self) -> PinPhase {
        self.phase
    }

    pub fn state(&self) -> PinState {
        self.state
    }

    pub fn geometry(&self) -> PinGeometry {
        self.geometry
    }

    /// Evaluate against a fresh progress value. Repeated calls on the same
    /// side of a boundary return no transitions.
    pub fn update(&mut self, progress: f64) -> Vec<PinTransition> {
        let within = progress > 0.0 && progress < 1.0 && !self.geometry.range.is_degenerate();
        let mut transitions = Vec::new();
        match (self.phase, within) {
            (PinPhase::Unpinned, true) => {
                let reserve = (self.spacing && !self.state.space_reserved).then(|| {
                    self.state.space_reserved = true;
                    SectionCommand::ReserveSpace {
                        height: self.geometry.section.h + self.geometry.range.distance(),
                    }
                });
                self.step(&mut transitions, PinPhase::Pinning, reserve);
                self.state.pinned = true;
                let fix = SectionCommand::Fix {
                    rect: self.fixed_rect(),
                };
                self.step(&mut transitions, PinPhase::Pinned, Some(fix));
                tracing::debug!(progress, "section pinned");
            }
            (PinPhase::Pinned, false) => {
                let offset = if progress >= 1.0 && self.spacing {
                    self.geometry.range.distance().max(0.0)
                } else {
                    0.0
                };
                self.state.pinned = false;
                self.step(
                    &mut transitions,
                    PinPhase::Unpinning,
                    Some(SectionCommand::Release { offset }),
                );
                self.step(&mut transitions, PinPhase::Unpinned, None);
                tracing::debug!(progress, offset, "section released");
            }
            _ => {}
        }
        transitions
    }

    /// Adopt remeasured geometry and re-evaluate. The caller must have
    /// released the pin first (see [`PinController::release`]) so the
    /// section was measured in flow.
    pub fn refresh(&mut self, geometry: PinGeometry, progress: f64) -> Vec<PinTransition> {
        let mut transitions = self.release();
        self.geometry = geometry;
        if self.state.space_reserved {
            // The placeholder must track the new pinned distance.
            transitions.push(PinTransition {
                from: self.phase,
                to: self.phase,
                command: Some(SectionCommand::ReserveSpace {
                    height: geometry.section.h + geometry.range.distance().max(0.0),
                }),
            });
        }
        transitions.extend(self.update(progress));
        transitions
    }

    /// Drop a held pin back into flow at its natural position. Reserved
    /// space is kept.
    pub fn release(&mut self) -> Vec<PinTransition> {
        let mut transitions = Vec::new();
        if self.phase == PinPhase::Pinned {
            self.state.pinned = false;
            self.step(
                &mut transitions,
                PinPhase::Unpinning,
                Some(SectionCommand::Release { offset: 0.0 }),
            );
            self.step(&mut transitions, PinPhase::Unpinned, None);
        }
        transitions
    }

    /// Release and give the reserved space back to the document.
    pub fn revert(&mut self) -> Vec<PinTransition> {
        let mut transitions = self.release();
        if self.state.space_reserved {
            self.state.space_reserved = false;
            transitions.push(PinTransition {
                from: self.phase,
                to: self.phase,
                command: Some(SectionCommand::RestoreSpace),
            });
        }
        transitions
    }

    fn fixed_rect(&self) -> Rect {
        let s = self.geometry.section;
        Rect::new(s.x, s.y - self.geometry.range.start, s.w, s.h)
    }

    fn step(
        &mut self,
        transitions: &mut Vec<PinTransition>,
        to: PinPhase,
        command: Option<SectionCommand>,
    ) {
        transitions.push(PinTransition {
            from: self.phase,
            to,
            command,
        });
        self.phase = to;
    }
}

/// The commands carried by a list of transitions, in order.
pub fn commands(transitions: Vec<PinTransition>) -> impl Iterator<Item = SectionCommand> {
    transitions.into_iter().filter_map(|t| t.command)
}
