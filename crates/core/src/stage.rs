//! The per-page orchestrator.
//!
//! A [`Stage`] owns the scroll tracker, the responsive mode switch and every
//! mounted section. Host events go in (`on_scroll`, `on_frame`, `refresh`);
//! ordered [`TargetedCommand`]s come out for the presentation layer to apply.
//!
//! Each section runs one driver at a time: a scrubbed timeline (optionally
//! pinned) in [`AnimationMode::Pinned`], a one-shot staggered reveal in
//! [`AnimationMode::Stacked`]. When the mode changes, every section's old
//! driver is torn down and its commands emitted before any new driver is
//! installed.

use scrolly_protocol::{
    ItemFrame, Phase, Rect, SectionCommand, SectionId, TargetedCommand, ViewportSize,
};
use serde::{Deserialize, Serialize};

use crate::active::{ActiveBroadcaster, ActiveChange, Region, Subscription};
use crate::config::ScrollyConfig;
use crate::pin::{self, PinController, PinGeometry, PinState};
use crate::registration::{RegistrationGroup, Revertible};
use crate::responsive::{AnimationMode, ModeSwitch};
use crate::scroll::{RangeSpec, ScrollRange, ScrollSample, ScrollTracker, ScrubSmoother};
use crate::timeline::{RevealStatus, SlotLayout, StackedReveal, Timeline};

/// Measured boxes of a section and its items, in document coordinates.
/// `None` marks an item whose element could not be found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub section: Rect,
    pub items: Vec<Option<Rect>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Used in logs only.
    pub name: String,
    /// Pin the section while its timeline scrubs.
    #[serde(default = "default_pin")]
    pub pin: bool,
    /// Per-section slot layout; the configured one when absent.
    #[serde(default)]
    pub slots: Option<SlotLayout>,
    pub layout: SectionLayout,
}

fn default_pin() -> bool {
    true
}

impl SectionSpec {
    pub fn new(name: impl Into<String>, layout: SectionLayout) -> Self {
        Self {
            name: name.into(),
            pin: true,
            slots: None,
            layout,
        }
    }

    pub fn pinned(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    pub fn with_slots(mut self, slots: SlotLayout) -> Self {
        self.slots = Some(slots);
        self
    }
}

/// A section's layout after missing items were dropped.
#[derive(Debug, Clone)]
struct Shape {
    pin: bool,
    slots: Option<SlotLayout>,
    section: Rect,
    items: Vec<Rect>,
    /// Original ordinal of each remaining item.
    keys: Vec<usize>,
}

impl Shape {
    fn new(name: &str, pin: bool, slots: Option<SlotLayout>, layout: &SectionLayout) -> Self {
        let mut items = Vec::with_capacity(layout.items.len());
        let mut keys = Vec::with_capacity(layout.items.len());
        for (ordinal, item) in layout.items.iter().enumerate() {
            match item {
                Some(rect) => {
                    items.push(*rect);
                    keys.push(ordinal);
                }
                None => tracing::warn!(section = %name, item = ordinal, "item element missing, skipped"),
            }
        }
        Self {
            pin,
            slots,
            section: layout.section,
            items,
            keys,
        }
    }

    fn key(&self, index: usize) -> usize {
        self.keys.get(index).copied().unwrap_or(index)
    }

    /// Rewrite compact item indices to original ordinals.
    fn address(&self, command: SectionCommand) -> SectionCommand {
        match command {
            SectionCommand::Style { index, state } => SectionCommand::Style {
                index: self.key(index),
                state,
            },
            SectionCommand::ClearStyle { index } => SectionCommand::ClearStyle {
                index: self.key(index),
            },
            other => other,
        }
    }
}

/// Scroll-scrubbed timeline with an optional pin.
#[derive(Debug)]
struct Scrubbed {
    timeline: Timeline,
    scrub_range: RangeSpec,
    range: ScrollRange,
    pin: Option<PinController>,
    smoother: ScrubSmoother,
    /// Last state emitted per item, to skip redundant styles.
    shown: Vec<Option<scrolly_protocol::VisualState>>,
}

impl Scrubbed {
    fn install(
        config: &ScrollyConfig,
        shape: &Shape,
        viewport_height: f64,
        offset: f64,
    ) -> (Self, Vec<SectionCommand>) {
        let mut timeline_config = config.timeline.clone();
        if let Some(slots) = &shape.slots {
            timeline_config.slots = slots.clone();
        }
        let timeline = Timeline::new(shape.items.len(), &timeline_config);
        // An empty section renders nothing, so there is nothing to pin.
        let pin = (shape.pin && !timeline.is_empty()).then(|| {
            PinController::new(
                PinGeometry::measure(shape.section, viewport_height, &config.pin),
                config.pin.spacing,
            )
        });
        let range = match &pin {
            Some(pin) => pin.geometry().range,
            None => timeline_config.scrub_range.measure(&shape.section, viewport_height),
        };
        let progress = range.progress(offset);
        let mut driver = Self {
            shown: vec![None; timeline.len()],
            timeline,
            scrub_range: timeline_config.scrub_range,
            range,
            pin,
            smoother: ScrubSmoother::new(config.timeline.scrub_lag, progress),
        };

        let mut commands = Vec::new();
        if let Some(pin) = driver.pin.as_mut() {
            commands.extend(pin::commands(pin.update(progress)));
        }
        driver.emit_styles(&mut commands);
        (driver, commands)
    }

    fn on_scroll(&mut self, offset: f64, commands: &mut Vec<SectionCommand>) {
        let progress = self.range.progress(offset);
        if let Some(pin) = self.pin.as_mut() {
            commands.extend(pin::commands(pin.update(progress)));
        }
        self.smoother.set_target(progress);
        self.emit_styles(commands);
    }

    fn on_frame(&mut self, dt: f64, commands: &mut Vec<SectionCommand>) {
        if self.smoother.tick(dt) {
            self.emit_styles(commands);
        }
    }

    fn remeasure(
        &mut self,
        config: &ScrollyConfig,
        shape: &Shape,
        viewport_height: f64,
        offset: f64,
        commands: &mut Vec<SectionCommand>,
    ) {
        self.range = match self.pin.as_mut() {
            Some(pin) => {
                let geometry = PinGeometry::measure(shape.section, viewport_height, &config.pin);
                let progress = geometry.range.progress(offset);
                commands.extend(pin::commands(pin.refresh(geometry, progress)));
                geometry.range
            }
            None => self.scrub_range.measure(&shape.section, viewport_height),
        };
        self.smoother.snap(self.range.progress(offset));
        self.emit_styles(commands);
    }

    fn emit_styles(&mut self, commands: &mut Vec<SectionCommand>) {
        for frame in self.timeline.frames(self.smoother.value()) {
            let Some(shown) = self.shown.get_mut(frame.index) else {
                continue;
            };
            if *shown != Some(frame.state) {
                *shown = Some(frame.state);
                commands.push(SectionCommand::Style {
                    index: frame.index,
                    state: frame.state,
                });
            }
        }
    }

    fn teardown(&mut self) -> Vec<SectionCommand> {
        let mut commands: Vec<SectionCommand> = self
            .pin
            .as_mut()
            .map(|pin| pin::commands(pin.revert()).collect())
            .unwrap_or_default();
        for (index, shown) in self.shown.iter_mut().enumerate() {
            *shown = None;
            commands.push(SectionCommand::ClearStyle { index });
        }
        commands
    }
}

#[derive(Debug)]
enum Driver {
    Scrubbed(Scrubbed),
    Stacked(StackedReveal),
}

impl Driver {
    fn install(
        mode: AnimationMode,
        config: &ScrollyConfig,
        shape: &Shape,
        viewport_height: f64,
        offset: f64,
    ) -> (Self, Vec<SectionCommand>) {
        match mode {
            AnimationMode::Pinned => {
                let (driver, commands) = Scrubbed::install(config, shape, viewport_height, offset);
                (Driver::Scrubbed(driver), commands)
            }
            AnimationMode::Stacked => {
                let mut reveal =
                    StackedReveal::new(&shape.items, viewport_height, config.reveal.clone());
                let commands = reveal.install(offset);
                (Driver::Stacked(reveal), commands)
            }
        }
    }

    fn on_scroll(&mut self, offset: f64) -> Vec<SectionCommand> {
        let mut commands = Vec::new();
        match self {
            Driver::Scrubbed(d) => d.on_scroll(offset, &mut commands),
            Driver::Stacked(r) => {
                r.on_scroll(offset);
            }
        }
        commands
    }

    fn on_frame(&mut self, dt: f64) -> Vec<SectionCommand> {
        match self {
            Driver::Scrubbed(d) => {
                let mut commands = Vec::new();
                d.on_frame(dt, &mut commands);
                commands
            }
            Driver::Stacked(r) => r.on_frame(dt),
        }
    }

    fn needs_frame(&self) -> bool {
        match self {
            Driver::Scrubbed(d) => !d.smoother.is_settled(),
            Driver::Stacked(r) => r.is_animating(),
        }
    }

    fn release(&mut self) -> Vec<SectionCommand> {
        match self {
            Driver::Scrubbed(Scrubbed { pin: Some(pin), .. }) => pin::commands(pin.release()).collect(),
            _ => Vec::new(),
        }
    }

    fn remeasure(
        &mut self,
        config: &ScrollyConfig,
        shape: &Shape,
        viewport_height: f64,
        offset: f64,
    ) -> Vec<SectionCommand> {
        let mut commands = Vec::new();
        match self {
            Driver::Scrubbed(d) => d.remeasure(config, shape, viewport_height, offset, &mut commands),
            Driver::Stacked(r) => {
                r.remeasure(&shape.items, viewport_height);
                r.on_scroll(offset);
            }
        }
        commands
    }

    fn teardown(&mut self) -> Vec<SectionCommand> {
        match self {
            Driver::Scrubbed(d) => d.teardown(),
            Driver::Stacked(r) => r.teardown(),
        }
    }

    /// Focus regions and the probe that selects among them.
    fn focus(&self, shape: &Shape, sample: &ScrollSample, reference_ratio: f64) -> (Vec<Region>, f64) {
        match self {
            Driver::Scrubbed(d) => {
                let regions = d
                    .timeline
                    .hold_windows()
                    .into_iter()
                    .enumerate()
                    .map(|(i, (start, end))| Region::new(shape.key(i), start, end))
                    .collect();
                (regions, d.range.progress(sample.offset))
            }
            Driver::Stacked(_) => {
                let regions = shape
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, rect)| Region::new(shape.key(i), rect.top(), rect.bottom()))
                    .collect();
                (regions, sample.offset + sample.viewport.height * reference_ratio)
            }
        }
    }

    fn frames(&self, shape: &Shape) -> Vec<ItemFrame> {
        match self {
            Driver::Scrubbed(d) => d
                .timeline
                .frames(d.smoother.value())
                .into_iter()
                .map(|frame| ItemFrame {
                    index: shape.key(frame.index),
                    ..frame
                })
                .collect(),
            Driver::Stacked(r) => (0..r.len())
                .filter_map(|i| {
                    let phase = match r.status(i)? {
                        RevealStatus::Waiting => Phase::Pending,
                        RevealStatus::Playing => Phase::Enter,
                        RevealStatus::Shown => Phase::Hold,
                        RevealStatus::Reversing => Phase::Exit,
                    };
                    Some(ItemFrame {
                        index: shape.key(i),
                        phase,
                        local: r.item_progress(i)?,
                        state: r.state(i)?,
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug)]
struct MountedSection {
    id: SectionId,
    name: String,
    shape: Shape,
    driver: Driver,
    active: ActiveBroadcaster,
    scope: RegistrationGroup,
}

impl MountedSection {
    fn emit(&self, commands: Vec<SectionCommand>, out: &mut Vec<TargetedCommand>) {
        out.extend(
            commands
                .into_iter()
                .map(|c| TargetedCommand::new(self.id, self.shape.address(c))),
        );
    }

    fn sync_active(
        &mut self,
        sample: &ScrollSample,
        reference_ratio: f64,
        out: &mut Vec<TargetedCommand>,
    ) {
        let (regions, probe) = self.driver.focus(&self.shape, sample, reference_ratio);
        if let Some(change) = self.active.update(probe, &regions, sample.direction) {
            out.push(TargetedCommand::new(
                self.id,
                SectionCommand::SetActive {
                    index: Some(change.current),
                },
            ));
        }
    }

    /// Shape for a freshly measured layout; the section keeps its current
    /// one until its driver has been torn down against it.
    fn reshape(&self, layout: &SectionLayout) -> Shape {
        Shape::new(&self.name, self.shape.pin, self.shape.slots.clone(), layout)
    }

    /// Revert every style and pin the driver applied, addressed through the
    /// shape they were applied under.
    fn teardown(&mut self, out: &mut Vec<TargetedCommand>) {
        let commands = self.driver.teardown();
        self.emit(commands, out);
        self.active.reset();
    }
}

pub struct Stage {
    config: ScrollyConfig,
    tracker: ScrollTracker,
    modes: ModeSwitch,
    mode: AnimationMode,
    sections: Vec<MountedSection>,
    next_id: u32,
}

impl Stage {
    pub fn new(config: ScrollyConfig, viewport: ViewportSize) -> Self {
        let mut modes = ModeSwitch::new(config.media.clone());
        let mode = modes
            .evaluate(viewport.width)
            .map_or(config.media.fallback, |change| change.to);
        Self {
            config,
            tracker: ScrollTracker::new(viewport),
            modes,
            mode,
            sections: Vec::new(),
            next_id: 0,
        }
    }

    pub fn config(&self) -> &ScrollyConfig {
        &self.config
    }

    pub fn mode(&self) -> AnimationMode {
        self.mode
    }

    pub fn viewport(&self) -> ViewportSize {
        self.tracker.viewport()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.tracker.offset()
    }

    pub fn section_ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Register a section and install the driver for the current mode.
    /// Sections are expected in document order.
    pub fn mount(&mut self, spec: SectionSpec) -> (SectionId, Vec<TargetedCommand>) {
        let id = SectionId(self.next_id);
        self.next_id += 1;

        let shape = Shape::new(&spec.name, spec.pin, spec.slots, &spec.layout);
        let sample = self.tracker.sample();
        let (driver, commands) = Driver::install(
            self.mode,
            &self.config,
            &shape,
            sample.viewport.height,
            sample.offset,
        );
        tracing::info!(
            section = %spec.name,
            id = id.0,
            items = shape.items.len(),
            mode = ?self.mode,
            "section mounted"
        );

        let mut section = MountedSection {
            id,
            scope: RegistrationGroup::new(spec.name.clone()),
            name: spec.name,
            shape,
            driver,
            active: ActiveBroadcaster::new(),
        };
        let mut out = Vec::new();
        section.emit(commands, &mut out);
        section.sync_active(&sample, self.config.active.reference_ratio, &mut out);
        self.sections.push(section);
        (id, out)
    }

    /// Tear a section down: release its pin, clear every style it applied,
    /// and revert its registrations. Unknown ids are ignored.
    pub fn unmount(&mut self, id: SectionId) -> Vec<TargetedCommand> {
        let Some(position) = self.sections.iter().position(|s| s.id == id) else {
            tracing::warn!(id = id.0, "unmount of unknown section ignored");
            return Vec::new();
        };
        let mut section = self.sections.remove(position);
        let mut out = Vec::new();
        let commands = section.driver.teardown();
        section.emit(commands, &mut out);
        if section.active.current().is_some() {
            out.push(TargetedCommand::new(id, SectionCommand::SetActive { index: None }));
        }
        section.scope.revert();
        tracing::info!(section = %section.name, id = id.0, "section unmounted");
        out
    }

    /// Unmount everything, newest first.
    pub fn revert_all(&mut self) -> Vec<TargetedCommand> {
        let ids: Vec<SectionId> = self.sections.iter().rev().map(|s| s.id).collect();
        ids.into_iter().flat_map(|id| self.unmount(id)).collect()
    }

    /// A scroll event. The sample is taken once, before any section reads it.
    pub fn on_scroll(&mut self, offset: f64) -> Vec<TargetedCommand> {
        let sample = self.tracker.on_scroll(offset);
        let ratio = self.config.active.reference_ratio;
        let mut out = Vec::new();
        for section in &mut self.sections {
            let commands = section.driver.on_scroll(sample.offset);
            section.emit(commands, &mut out);
            section.sync_active(&sample, ratio, &mut out);
        }
        out
    }

    /// An animation frame, `dt` seconds after the previous one.
    pub fn on_frame(&mut self, dt: f64) -> Vec<TargetedCommand> {
        let mut out = Vec::new();
        for section in &mut self.sections {
            let commands = section.driver.on_frame(dt);
            section.emit(commands, &mut out);
        }
        out
    }

    /// Whether any section still animates without further scrolling.
    pub fn needs_frame(&self) -> bool {
        self.sections.iter().any(|s| s.driver.needs_frame())
    }

    /// First half of a refresh: drop every pin back into flow so the host
    /// can measure natural positions.
    pub fn invalidate(&mut self) -> Vec<TargetedCommand> {
        let mut out = Vec::new();
        for section in &mut self.sections {
            let commands = section.driver.release();
            section.emit(commands, &mut out);
        }
        out
    }

    /// Second half of a refresh: adopt the new viewport and the layouts the
    /// host measured, then re-evaluate. Sections missing from `layouts`
    /// keep their previous measurements.
    ///
    /// If the width crossed into another mode, every section's current
    /// driver is reverted before any section installs the new one.
    pub fn refresh(
        &mut self,
        viewport: ViewportSize,
        layouts: &[(SectionId, SectionLayout)],
    ) -> Vec<TargetedCommand> {
        self.tracker.on_resize(viewport);
        let sample = self.tracker.sample();
        let ratio = self.config.active.reference_ratio;
        let mut out = Vec::new();

        for (id, _) in layouts {
            if !self.sections.iter().any(|s| s.id == *id) {
                tracing::warn!(id = id.0, "layout for unknown section ignored");
            }
        }
        let mut reshaped: Vec<Option<Shape>> = self
            .sections
            .iter()
            .map(|section| {
                layouts
                    .iter()
                    .find(|(id, _)| *id == section.id)
                    .map(|(_, layout)| section.reshape(layout))
            })
            .collect();

        if let Some(change) = self.modes.evaluate(viewport.width) {
            for (section, shape) in self.sections.iter_mut().zip(reshaped.iter_mut()) {
                section.teardown(&mut out);
                if let Some(shape) = shape.take() {
                    section.shape = shape;
                }
            }
            self.mode = change.to;
            for section in &mut self.sections {
                let (driver, commands) = Driver::install(
                    self.mode,
                    &self.config,
                    &section.shape,
                    sample.viewport.height,
                    sample.offset,
                );
                section.driver = driver;
                section.emit(commands, &mut out);
                section.sync_active(&sample, ratio, &mut out);
            }
        } else {
            for (section, shape) in self.sections.iter_mut().zip(reshaped) {
                match shape {
                    Some(shape) if shape.keys != section.shape.keys => {
                        section.teardown(&mut out);
                        section.shape = shape;
                        let (driver, commands) = Driver::install(
                            self.mode,
                            &self.config,
                            &section.shape,
                            sample.viewport.height,
                            sample.offset,
                        );
                        section.driver = driver;
                        section.emit(commands, &mut out);
                    }
                    shape => {
                        if let Some(shape) = shape {
                            section.shape = shape;
                        }
                        let commands = section.driver.remeasure(
                            &self.config,
                            &section.shape,
                            sample.viewport.height,
                            sample.offset,
                        );
                        section.emit(commands, &mut out);
                    }
                }
                section.sync_active(&sample, ratio, &mut out);
            }
        }

        self.tracker.mark_measured();
        out
    }

    /// Whether a resize was observed that has not been refreshed yet.
    pub fn needs_refresh(&self) -> bool {
        self.tracker.needs_refresh()
    }

    /// Listen for focus changes in one section. `None` for unknown ids.
    pub fn subscribe_active(
        &self,
        id: SectionId,
        listener: impl FnMut(&ActiveChange) + 'static,
    ) -> Option<Subscription> {
        self.section(id).map(|s| s.active.subscribe(listener))
    }

    /// The focused item's original ordinal.
    pub fn active_index(&self, id: SectionId) -> Option<usize> {
        self.section(id).and_then(|s| s.active.current())
    }

    pub fn pin_state(&self, id: SectionId) -> Option<PinState> {
        self.section(id).map(|s| match &s.driver {
            Driver::Scrubbed(Scrubbed { pin: Some(pin), .. }) => pin.state(),
            _ => PinState::default(),
        })
    }

    /// Scroll progress through the section's range; `None` for stacked
    /// sections, which have no range.
    pub fn progress(&self, id: SectionId) -> Option<f64> {
        self.section(id).and_then(|s| match &s.driver {
            Driver::Scrubbed(d) => Some(d.range.progress(self.tracker.offset())),
            Driver::Stacked(_) => None,
        })
    }

    /// Current state of every present item, indexed by original ordinal.
    pub fn frames(&self, id: SectionId) -> Option<Vec<ItemFrame>> {
        self.section(id).map(|s| s.driver.frames(&s.shape))
    }

    /// Original ordinals of the items in the sequence, in sequence order.
    pub fn element_keys(&self, id: SectionId) -> Option<&[usize]> {
        self.section(id).map(|s| s.shape.keys.as_slice())
    }

    /// Registrations reverted when the section unmounts.
    pub fn scope(&mut self, id: SectionId) -> Option<&mut RegistrationGroup> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| &mut s.scope)
    }

    fn section(&self, id: SectionId) -> Option<&MountedSection> {
        self.sections.iter().find(|s| s.id == id)
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("mode", &self.mode)
            .field("viewport", &self.tracker.viewport())
            .field("offset", &self.tracker.offset())
            .field("sections", &self.sections.len())
            .finish()
    }
}
