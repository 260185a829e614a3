use glam::{Vec3, Vec4Swizzles};
use scrolly_protocol::{Point, ScreenMarker, SharedStr, ViewportSize};

use super::scene::SceneView;

/// Clip-space `w` at or below this is treated as behind the camera.
const MIN_CLIP_W: f32 = 1e-6;

/// A marker attached to the model. `position` is in normalized model space:
/// each axis runs from -1 to 1 across the model's bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorPoint {
    pub id: u32,
    pub label: SharedStr,
    pub position: Vec3,
}

/// The loaded model's bounding box in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl ModelBounds {
    pub fn cube(size: f32) -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(size / 2.0),
        }
    }

    fn to_model(self, normalized: Vec3) -> Vec3 {
        self.center + normalized * self.half_extents
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    BehindCamera,
    /// Nearer than the near plane or past the far plane.
    OutsideDepth,
    OffCanvas,
    /// On the side of the model facing away from the camera.
    FarSide,
}

/// One anchor's projection this frame, visible or not.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedAnchor {
    pub id: u32,
    pub position: Point,
    pub depth: f64,
    pub visibility: Visibility,
}

impl ProjectedAnchor {
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }
}

/// Projects model anchors to canvas pixels.
///
/// No anchors exist until [`ProjectionAdapter::model_ready`]; before that,
/// and whenever the scene cannot supply a transform, projection is empty.
#[derive(Debug, Clone)]
pub struct ProjectionAdapter {
    anchors: Vec<AnchorPoint>,
    bounds: Option<ModelBounds>,
    cull_far_side: bool,
}

impl ProjectionAdapter {
    pub fn new(anchors: Vec<AnchorPoint>, cull_far_side: bool) -> Self {
        Self {
            anchors,
            bounds: None,
            cull_far_side,
        }
    }

    pub fn model_ready(&mut self, bounds: ModelBounds) {
        tracing::info!(anchors = self.anchors.len(), "model ready, anchors resolved");
        self.bounds = Some(bounds);
    }

    pub fn model_unloaded(&mut self) {
        self.bounds = None;
    }

    pub fn is_ready(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn anchors(&self) -> &[AnchorPoint] {
        &self.anchors
    }

    /// Every anchor with its visibility this frame.
    pub fn project_all(&self, view: &dyn SceneView, canvas: ViewportSize) -> Vec<ProjectedAnchor> {
        let Some(bounds) = self.bounds else {
            return Vec::new();
        };
        if canvas.width <= 0.0 || canvas.height <= 0.0 {
            return Vec::new();
        }
        let aspect = (canvas.width / canvas.height) as f32;
        let (Some(world), Some(view_proj), Some(camera)) = (
            view.world_transform(),
            view.view_projection(aspect),
            view.camera_position(),
        ) else {
            return Vec::new();
        };
        let center = world.transform_point3(bounds.center);

        self.anchors
            .iter()
            .map(|anchor| {
                let world_pos = world.transform_point3(bounds.to_model(anchor.position));
                let clip = view_proj * world_pos.extend(1.0);
                if clip.w <= MIN_CLIP_W {
                    return ProjectedAnchor {
                        id: anchor.id,
                        position: Point::ZERO,
                        depth: f64::from(clip.w),
                        visibility: Visibility::BehindCamera,
                    };
                }
                let ndc = clip.xyz() / clip.w;
                let x = f64::from(ndc.x + 1.0) / 2.0 * canvas.width;
                let y = f64::from(1.0 - ndc.y) / 2.0 * canvas.height;
                let visibility = if !(-1.0..=1.0).contains(&ndc.z) {
                    Visibility::OutsideDepth
                } else if !(0.0..=canvas.width).contains(&x) || !(0.0..=canvas.height).contains(&y) {
                    Visibility::OffCanvas
                } else if self.cull_far_side
                    && (world_pos - center).dot(camera - world_pos) < 0.0
                {
                    Visibility::FarSide
                } else {
                    Visibility::Visible
                };
                ProjectedAnchor {
                    id: anchor.id,
                    position: Point::new(x, y),
                    depth: f64::from(ndc.z),
                    visibility,
                }
            })
            .collect()
    }

    /// Markers to draw this frame. Hidden anchors are omitted entirely.
    pub fn project(&self, view: &dyn SceneView, canvas: ViewportSize) -> Vec<ScreenMarker> {
        let projected = self.project_all(view, canvas);
        projected
            .into_iter()
            .filter(ProjectedAnchor::is_visible)
            .filter_map(|p| {
                let anchor = self.anchors.iter().find(|a| a.id == p.id)?;
                Some(ScreenMarker {
                    id: p.id,
                    label: anchor.label.clone(),
                    position: p.position,
                    depth: p.depth,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::projection::scene::{OrbitScene, PerspectiveCamera, ProjectionConfig};

    const CANVAS: ViewportSize = ViewportSize {
        width: 800.0,
        height: 600.0,
    };

    fn anchor(id: u32, position: Vec3) -> AnchorPoint {
        AnchorPoint {
            id,
            label: SharedStr::from(format!("anchor {id}")),
            position,
        }
    }

    /// A fixed scene with the model at the origin and no rotation.
    struct StillScene {
        camera: PerspectiveCamera,
    }

    impl SceneView for StillScene {
        fn world_transform(&self) -> Option<Mat4> {
            Some(Mat4::IDENTITY)
        }
        fn view_projection(&self, aspect: f32) -> Option<Mat4> {
            Some(self.camera.projection(aspect) * self.camera.view())
        }
        fn camera_position(&self) -> Option<Vec3> {
            Some(self.camera.position)
        }
    }

    struct NoCamera;

    impl SceneView for NoCamera {
        fn world_transform(&self) -> Option<Mat4> {
            Some(Mat4::IDENTITY)
        }
        fn view_projection(&self, _aspect: f32) -> Option<Mat4> {
            None
        }
        fn camera_position(&self) -> Option<Vec3> {
            None
        }
    }

    fn still() -> StillScene {
        StillScene {
            camera: PerspectiveCamera {
                position: Vec3::new(0.0, 0.0, 5.0),
                ..PerspectiveCamera::default()
            },
        }
    }

    #[test]
    fn no_markers_before_model_ready() {
        let adapter = ProjectionAdapter::new(vec![anchor(1, Vec3::ZERO)], true);
        assert!(adapter.project(&still(), CANVAS).is_empty());
        assert!(adapter.project_all(&still(), CANVAS).is_empty());
    }

    #[test]
    fn no_markers_without_camera() {
        let mut adapter = ProjectionAdapter::new(vec![anchor(1, Vec3::ZERO)], true);
        adapter.model_ready(ModelBounds::cube(1.5));
        assert!(adapter.project(&NoCamera, CANVAS).is_empty());
    }

    #[test]
    fn front_anchor_lands_in_canvas() {
        let mut adapter = ProjectionAdapter::new(vec![anchor(1, Vec3::new(0.0, 0.0, 1.0))], true);
        adapter.model_ready(ModelBounds::cube(2.0));
        let markers = adapter.project(&still(), CANVAS);
        assert_eq!(markers.len(), 1);
        assert!((markers[0].position.x - 400.0).abs() < 1e-3);
        assert!((markers[0].position.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn upward_anchor_moves_up_the_screen() {
        let mut adapter = ProjectionAdapter::new(vec![anchor(1, Vec3::new(0.0, 0.5, 1.0))], true);
        adapter.model_ready(ModelBounds::cube(2.0));
        let markers = adapter.project(&still(), CANVAS);
        assert_eq!(markers.len(), 1);
        assert!(markers[0].position.y < 300.0);
    }

    #[test]
    fn far_side_anchor_is_omitted() {
        let mut adapter = ProjectionAdapter::new(
            vec![anchor(1, Vec3::new(0.0, 0.0, 1.0)), anchor(2, Vec3::new(0.0, 0.0, -1.0))],
            true,
        );
        adapter.model_ready(ModelBounds::cube(2.0));
        let all = adapter.project_all(&still(), CANVAS);
        assert_eq!(all[1].visibility, Visibility::FarSide);
        let markers = adapter.project(&still(), CANVAS);
        assert_eq!(markers.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn anchor_behind_camera_is_hidden() {
        // Model huge enough that one anchor sits behind the camera at z = 5.
        let mut adapter = ProjectionAdapter::new(vec![anchor(1, Vec3::new(0.0, 0.0, 1.0))], false);
        adapter.model_ready(ModelBounds {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(10.0),
        });
        let all = adapter.project_all(&still(), CANVAS);
        assert_eq!(all[0].visibility, Visibility::BehindCamera);
        assert!(adapter.project(&still(), CANVAS).is_empty());
    }

    #[test]
    fn anchor_inside_near_plane_is_hidden() {
        let mut adapter = ProjectionAdapter::new(vec![anchor(1, Vec3::new(0.0, 0.0, 1.0))], false);
        adapter.model_ready(ModelBounds {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(4.95),
        });
        let all = adapter.project_all(&still(), CANVAS);
        assert_ne!(all[0].visibility, Visibility::Visible);
        assert!(adapter.project(&still(), CANVAS).is_empty());
    }

    #[test]
    fn rotating_scene_eventually_hides_each_anchor() {
        let config = ProjectionConfig::default();
        let mut scene = OrbitScene::new(&config);
        let mut adapter = ProjectionAdapter::new(vec![anchor(1, Vec3::new(-0.5, 0.8, 0.0))], true);
        adapter.model_ready(ModelBounds::cube(1.5));
        let mut seen_visible = false;
        let mut seen_hidden = false;
        for _ in 0..600 {
            scene.tick(0.1);
            match adapter.project(&scene, CANVAS).len() {
                0 => seen_hidden = true,
                _ => seen_visible = true,
            }
        }
        assert!(seen_visible && seen_hidden);
    }
}
