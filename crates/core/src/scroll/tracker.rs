use scrolly_protocol::ViewportSize;

/// Which way the page last moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// One immutable observation of the page scroll, computed in full before
/// any consumer reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    /// Document scroll offset in pixels.
    pub offset: f64,
    /// Change since the previous scroll event.
    pub delta: f64,
    /// Direction of the last non-zero move.
    pub direction: Direction,
    pub viewport: ViewportSize,
}

/// Observes scroll offset and viewport size.
///
/// Holds only the latest observation. Measurements derived from layout
/// (range boundaries, item regions) are owned by the consumers; the tracker
/// only flags when they have gone stale.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    offset: f64,
    direction: Direction,
    viewport: ViewportSize,
    stale: bool,
}

impl ScrollTracker {
    pub fn new(viewport: ViewportSize) -> Self {
        Self {
            offset: 0.0,
            direction: Direction::Forward,
            viewport,
            stale: false,
        }
    }

    /// Record a scroll event. A zero delta keeps the previous direction so
    /// that repeated events at the same offset are not read as reversals.
    pub fn on_scroll(&mut self, offset: f64) -> ScrollSample {
        let offset = if offset.is_finite() { offset.max(0.0) } else { self.offset };
        let delta = offset - self.offset;
        if delta > 0.0 {
            self.direction = Direction::Forward;
        } else if delta < 0.0 {
            self.direction = Direction::Backward;
        }
        self.offset = offset;
        self.sample_with_delta(delta)
    }

    /// Record a viewport size change. Cached pixel positions of range
    /// markers are invalid until the owner remeasures.
    pub fn on_resize(&mut self, viewport: ViewportSize) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.stale = true;
        }
    }

    /// Whether a resize happened since the last [`ScrollTracker::mark_measured`].
    pub fn needs_refresh(&self) -> bool {
        self.stale
    }

    pub fn mark_measured(&mut self) {
        self.stale = false;
    }

    /// The current observation without recording a new event.
    pub fn sample(&self) -> ScrollSample {
        self.sample_with_delta(0.0)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    fn sample_with_delta(&self, delta: f64) -> ScrollSample {
        ScrollSample {
            offset: self.offset,
            delta,
            direction: self.direction,
            viewport: self.viewport,
        }
    }
}
