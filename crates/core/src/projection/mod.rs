//! Keeps flat markers glued to a rotating 3D model.
//!
//! Runs per animation frame, independent of scroll.

pub mod adapter;
pub mod frame;
pub mod scene;

pub use adapter::{AnchorPoint, ModelBounds, ProjectedAnchor, ProjectionAdapter, Visibility};
pub use frame::{CancelToken, FrameClock};
pub use scene::{OrbitScene, PerspectiveCamera, ProjectionConfig, SceneView};

use scrolly_protocol::{ScreenMarker, ViewportSize};

/// The per-frame tick: advances the scene and reprojects the anchors.
///
/// Started with a fresh [`CancelToken`]; once the token is cancelled,
/// [`HotspotDriver::tick`] returns `None` and the host stops requesting
/// frames.
#[derive(Debug)]
pub struct HotspotDriver {
    scene: OrbitScene,
    adapter: ProjectionAdapter,
    clock: FrameClock,
    token: Option<CancelToken>,
}

impl HotspotDriver {
    pub fn new(config: &ProjectionConfig, anchors: Vec<AnchorPoint>) -> Self {
        Self {
            scene: OrbitScene::new(config),
            adapter: ProjectionAdapter::new(anchors, config.cull_far_side),
            clock: FrameClock::default(),
            token: None,
        }
    }

    pub fn model_ready(&mut self, bounds: ModelBounds) {
        self.adapter.model_ready(bounds);
    }

    /// Begin ticking. Any previous run is cancelled first.
    pub fn start(&mut self) -> CancelToken {
        self.stop();
        self.clock.reset();
        let token = CancelToken::new();
        self.token = Some(token.clone());
        token
    }

    pub fn stop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// One frame at `timestamp_ms`. `None` once cancelled; otherwise the
    /// markers to show this frame (empty until the model is ready).
    pub fn tick(&mut self, timestamp_ms: f64, canvas: ViewportSize) -> Option<Vec<ScreenMarker>> {
        if !self.is_running() {
            return None;
        }
        let dt = self.clock.tick(timestamp_ms);
        self.scene.tick(dt);
        Some(self.adapter.project(&self.scene, canvas))
    }

    pub fn scene(&self) -> &OrbitScene {
        &self.scene
    }

    pub fn adapter(&self) -> &ProjectionAdapter {
        &self.adapter
    }
}

impl Drop for HotspotDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
