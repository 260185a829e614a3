//! A virtual page: lays the content out in pixel space, drives the stage and
//! keeps the state a browser would show after applying its commands.

use scrolly_core::content::SectionContent;
use scrolly_core::projection::HotspotDriver;
use scrolly_core::scroll::{Edge, EndPosition, RangeSpec, ScrollRange, TriggerPosition};
use scrolly_core::timeline::{CountUp, Tween};
use scrolly_core::{
    AnimationMode, Easing, ItemFrame, ModeSwitch, ModelBounds, Rect, ScrollyConfig, SectionCommand,
    SectionId, SectionLayout, SectionSpec, SiteContent, Stage, TargetedCommand, ViewportSize,
    VisualState,
};
use scrolly_protocol::ScreenMarker;

pub const DESKTOP_WIDTH: f64 = 1280.0;
pub const MOBILE_WIDTH: f64 = 400.0;
pub const VIEWPORT_HEIGHT: f64 = 800.0;

const STATS_HEIGHT: f64 = 320.0;
const ITEM_HEIGHT: f64 = 180.0;
const SECTION_PADDING: f64 = 120.0;
const FOOTER_HEIGHT: f64 = 400.0;
/// Edge length of the preview model, in scene units.
const MODEL_SIZE: f32 = 2.0;

/// Where an item stands after the commands applied so far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ItemView {
    /// `None` until styled, and again after the style is cleared.
    pub style: Option<VisualState>,
}

impl ItemView {
    /// Opacity as rendered: unstyled items show normally.
    pub fn opacity(&self) -> f64 {
        self.style.map_or(1.0, |s| s.opacity)
    }
}

#[derive(Debug, Clone)]
pub struct SectionView {
    pub id: SectionId,
    pub content: SectionContent,
    pub items: Vec<ItemView>,
    /// Viewport rect while held in place.
    pub fixed: Option<Rect>,
    /// Height of the placeholder keeping the section's place in flow.
    pub spacer: Option<f64>,
    /// Shift applied after the pin released at the end of its range.
    pub released_at: f64,
    pub active: Option<usize>,
}

impl SectionView {
    fn new(id: SectionId, content: SectionContent) -> Self {
        Self {
            id,
            items: vec![ItemView::default(); content.entries.len()],
            content,
            fixed: None,
            spacer: None,
            released_at: 0.0,
            active: None,
        }
    }

    pub fn apply(&mut self, command: &SectionCommand) {
        match command {
            SectionCommand::Style { index, state } => {
                if let Some(item) = self.items.get_mut(*index) {
                    item.style = Some(*state);
                }
            }
            SectionCommand::ClearStyle { index } => {
                if let Some(item) = self.items.get_mut(*index) {
                    item.style = None;
                }
            }
            SectionCommand::ReserveSpace { height } => self.spacer = Some(*height),
            SectionCommand::RestoreSpace => self.spacer = None,
            SectionCommand::Fix { rect } => self.fixed = Some(*rect),
            SectionCommand::Release { offset } => {
                self.fixed = None;
                self.released_at = *offset;
            }
            SectionCommand::SetActive { index } => self.active = *index,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.fixed.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatView {
    pub label: String,
    pub suffix: String,
    pub target: u64,
    pub shown: u64,
}

/// Pixel boxes of every block for one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub stats: Rect,
    pub sections: Vec<SectionLayout>,
    pub model: Rect,
    pub height: f64,
}

impl DocumentLayout {
    /// Stack the blocks: a one-screen hero, the stats strip, every section,
    /// then the model and a footer. In pinned mode a pinned section is
    /// followed by the space its pin reserves.
    pub fn compute(
        content: &SiteContent,
        config: &ScrollyConfig,
        viewport: ViewportSize,
        mode: AnimationMode,
    ) -> Self {
        let mut y = viewport.height;
        let stats = Rect::new(0.0, y, viewport.width, STATS_HEIGHT);
        y += STATS_HEIGHT;

        let mut sections = Vec::with_capacity(content.sections.len());
        for section in &content.sections {
            let items = section.entries.len();
            let height = (SECTION_PADDING * 2.0 + ITEM_HEIGHT * items as f64).max(viewport.height);
            let rect = Rect::new(0.0, y, viewport.width, height);
            let layout = SectionLayout {
                section: rect,
                items: (0..items)
                    .map(|i| {
                        Some(Rect::new(
                            0.0,
                            y + SECTION_PADDING + ITEM_HEIGHT * i as f64,
                            viewport.width,
                            ITEM_HEIGHT,
                        ))
                    })
                    .collect(),
            };
            y += height;
            if mode == AnimationMode::Pinned && section.pin && items > 0 {
                let range = config.pin.range_spec().measure(&rect, viewport.height);
                y += range.distance().max(0.0);
            }
            sections.push(layout);
        }

        let model = Rect::new(0.0, y, viewport.width, viewport.height);
        y += viewport.height + FOOTER_HEIGHT;
        Self {
            stats,
            sections,
            model,
            height: y,
        }
    }
}

pub struct Page {
    content: SiteContent,
    stage: Stage,
    sections: Vec<SectionView>,
    layout: DocumentLayout,
    stats: Vec<CountUp>,
    stats_line: f64,
    hotspots: HotspotDriver,
    markers: Vec<ScreenMarker>,
    zoom: Tween,
    zoom_range: ScrollRange,
    clock_ms: f64,
    mobile: bool,
}

impl Page {
    pub fn new(content: SiteContent, config: ScrollyConfig) -> Self {
        let viewport = ViewportSize::new(DESKTOP_WIDTH, VIEWPORT_HEIGHT);
        let mut stage = Stage::new(config, viewport);
        let layout = DocumentLayout::compute(&content, stage.config(), viewport, stage.mode());

        let mut sections = Vec::with_capacity(content.sections.len());
        let mut commands = Vec::new();
        for (section, measured) in content.sections.iter().zip(&layout.sections) {
            let spec = SectionSpec::new(section.id.clone(), measured.clone()).pinned(section.pin);
            let (id, mounted) = stage.mount(spec);
            sections.push(SectionView::new(id, section.clone()));
            commands.extend(mounted);
        }

        let mut hotspots = HotspotDriver::new(&stage.config().projection, content.anchors());
        hotspots.model_ready(ModelBounds::cube(MODEL_SIZE));
        let _token = hotspots.start();

        let stats = content.stats.iter().map(|s| CountUp::new(s.value)).collect();
        let mut page = Self {
            stats_line: Self::stats_line(&layout, VIEWPORT_HEIGHT),
            zoom_range: Self::zoom_range(&layout, VIEWPORT_HEIGHT),
            content,
            stage,
            sections,
            layout,
            stats,
            hotspots,
            markers: Vec::new(),
            zoom: Tween::new(1.5, 1.0, Easing::Power2Out),
            clock_ms: 0.0,
            mobile: false,
        };
        page.apply(commands);
        page
    }

    /// "top 85%" of the stats strip.
    fn stats_line(layout: &DocumentLayout, viewport_height: f64) -> f64 {
        TriggerPosition::new(Edge::Top, Edge::Percent(85.0)).resolve(&layout.stats, viewport_height)
    }

    /// The model zooms in while its block scrolls from "top bottom" to
    /// "top top".
    fn zoom_range(layout: &DocumentLayout, viewport_height: f64) -> ScrollRange {
        RangeSpec {
            start: TriggerPosition::new(Edge::Top, Edge::Bottom),
            end: EndPosition::Absolute(TriggerPosition::new(Edge::Top, Edge::Top)),
        }
        .measure(&layout.model, viewport_height)
    }

    fn apply(&mut self, commands: Vec<TargetedCommand>) {
        for targeted in commands {
            if let Some(view) = self.sections.iter_mut().find(|s| s.id == targeted.section) {
                view.apply(&targeted.command);
            }
        }
    }

    pub fn scroll_to(&mut self, offset: f64) {
        let max = (self.layout.height - VIEWPORT_HEIGHT).max(0.0);
        let commands = self.stage.on_scroll(offset.clamp(0.0, max));
        self.apply(commands);
        if self.stage.scroll_offset() >= self.stats_line {
            for stat in &mut self.stats {
                stat.trigger();
            }
        }
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll_to(self.stage.scroll_offset() + delta);
    }

    /// Switch between the desktop and the narrow viewport, then refresh the
    /// way a browser resize would.
    pub fn toggle_mobile(&mut self) {
        self.mobile = !self.mobile;
        let width = if self.mobile { MOBILE_WIDTH } else { DESKTOP_WIDTH };
        let viewport = ViewportSize::new(width, VIEWPORT_HEIGHT);
        let mode = ModeSwitch::new(self.stage.config().media.clone()).resolve(width).0;
        self.layout = DocumentLayout::compute(&self.content, self.stage.config(), viewport, mode);
        self.stats_line = Self::stats_line(&self.layout, VIEWPORT_HEIGHT);
        self.zoom_range = Self::zoom_range(&self.layout, VIEWPORT_HEIGHT);

        let mut commands = self.stage.invalidate();
        let layouts: Vec<(SectionId, SectionLayout)> = self
            .sections
            .iter()
            .map(|s| s.id)
            .zip(self.layout.sections.iter().cloned())
            .collect();
        commands.extend(self.stage.refresh(viewport, &layouts));
        self.apply(commands);
        tracing::info!(mobile = self.mobile, mode = ?self.stage.mode(), "viewport toggled");
    }

    /// Advance time by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        let commands = self.stage.on_frame(dt);
        self.apply(commands);
        for stat in &mut self.stats {
            stat.tick(dt);
        }
        self.clock_ms += dt * 1000.0;
        let canvas = ViewportSize::new(self.layout.model.w, self.layout.model.h);
        if let Some(markers) = self.hotspots.tick(self.clock_ms, canvas) {
            self.markers = markers;
        }
    }

    pub fn offset(&self) -> f64 {
        self.stage.scroll_offset()
    }

    pub fn max_offset(&self) -> f64 {
        (self.layout.height - VIEWPORT_HEIGHT).max(0.0)
    }

    pub fn mode(&self) -> AnimationMode {
        self.stage.mode()
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub fn sections(&self) -> &[SectionView] {
        &self.sections
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    /// Scroll progress through a scrubbed section.
    pub fn progress(&self, id: SectionId) -> Option<f64> {
        self.stage.progress(id)
    }

    /// Per-item phases as the stage sees them.
    pub fn frames(&self, id: SectionId) -> Vec<ItemFrame> {
        self.stage.frames(id).unwrap_or_default()
    }

    pub fn stats(&self) -> Vec<StatView> {
        self.content
            .stats
            .iter()
            .zip(&self.stats)
            .map(|(stat, counter)| StatView {
                label: stat.label.clone(),
                suffix: stat.suffix.clone(),
                target: counter.target(),
                shown: counter.value(),
            })
            .collect()
    }

    pub fn markers(&self) -> &[ScreenMarker] {
        &self.markers
    }

    pub fn model_zoom(&self) -> f64 {
        self.zoom.at(self.zoom_range.progress(self.offset()))
    }

    pub fn hotspot_label(&self, id: u32) -> Option<&str> {
        self.content.hotspot(id).map(|h| h.description.as_str())
    }

    /// Whether more frames are needed without input.
    pub fn is_animating(&self) -> bool {
        self.stage.needs_frame()
            || self
                .stats
                .iter()
                .any(|s| s.is_triggered() && s.value() < s.target())
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        let commands = self.stage.revert_all();
        self.apply(commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE: &str = include_str!("../assets/course.json");

    fn page() -> Page {
        let content = SiteContent::from_json(COURSE).expect("bundled content parses");
        Page::new(content, ScrollyConfig::default())
    }

    fn section<'a>(page: &'a Page, name: &str) -> &'a SectionView {
        page.sections()
            .iter()
            .find(|s| s.content.id == name)
            .expect("section exists")
    }

    #[test]
    fn pinned_layout_reserves_room_after_pinned_sections() {
        let content = SiteContent::from_json(COURSE).expect("parses");
        let config = ScrollyConfig::default();
        let viewport = ViewportSize::new(DESKTOP_WIDTH, VIEWPORT_HEIGHT);
        let pinned = DocumentLayout::compute(&content, &config, viewport, AnimationMode::Pinned);
        let stacked = DocumentLayout::compute(&content, &config, viewport, AnimationMode::Stacked);
        // steps and curriculum pin; testimonials does not.
        let steps = pinned.sections[0].section;
        let gap = pinned.sections[1].section.y - steps.bottom();
        assert_eq!(gap, 1.5 * steps.h);
        assert!(pinned.height > stacked.height);
    }

    #[test]
    fn scrolling_through_steps_pins_and_focuses() {
        let mut page = page();
        let steps = page.layout().sections[0].section;
        page.scroll_to(steps.y + steps.h * 0.75);
        let view = section(&page, "steps");
        assert!(view.is_pinned());
        assert!(view.spacer.is_some());
        assert!(view.active.is_some());

        page.scroll_to(steps.y + steps.h * 1.5 + 10.0);
        let view = section(&page, "steps");
        assert!(!view.is_pinned());
        assert_eq!(view.active, Some(3));
        assert_eq!(view.items[3].opacity(), 1.0);
    }

    #[test]
    fn toggling_mobile_restores_flow() {
        let mut page = page();
        let steps = page.layout().sections[0].section;
        page.scroll_to(steps.y + 100.0);
        assert!(section(&page, "steps").is_pinned());

        page.toggle_mobile();
        assert_eq!(page.mode(), AnimationMode::Stacked);
        let view = section(&page, "steps");
        assert!(!view.is_pinned());
        assert_eq!(view.spacer, None);
        // Stacked reveal hid every item again.
        assert!(view.items.iter().all(|i| i.style.is_some()));

        page.toggle_mobile();
        assert_eq!(page.mode(), AnimationMode::Pinned);
    }

    #[test]
    fn stats_count_up_once_visible() {
        let mut page = page();
        assert!(page.stats().iter().all(|s| s.shown == 0));
        let line = page.stats_line;
        page.scroll_to(line);
        for _ in 0..200 {
            page.tick(1.0 / 60.0);
        }
        let stats = page.stats();
        assert_eq!(stats[0].shown, 10_000);
        assert_eq!(stats[1].shown, 95);
        assert!(!page.is_animating());
    }

    #[test]
    fn model_zooms_in_as_it_arrives() {
        let mut page = page();
        assert_eq!(page.model_zoom(), 1.5);
        let model = page.layout().model;
        page.scroll_to(model.y);
        assert_eq!(page.model_zoom(), 1.0);
    }

    #[test]
    fn hotspots_project_each_frame() {
        let mut page = page();
        page.tick(0.016);
        page.tick(0.016);
        assert!(!page.markers().is_empty());
        assert!(page.markers().iter().all(|m| page.hotspot_label(m.id).is_some()));
    }
}
