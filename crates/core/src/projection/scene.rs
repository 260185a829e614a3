use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// What the projection adapter needs from a 3D viewer.
///
/// Each getter may return `None` while the viewer is not ready (no camera,
/// model not in the scene yet); projection then yields no markers.
pub trait SceneView {
    /// Current model-to-world transform.
    fn world_transform(&self) -> Option<Mat4>;
    /// World-to-clip transform for a canvas of the given aspect ratio.
    fn view_projection(&self, aspect: f32) -> Option<Mat4>;
    fn camera_position(&self) -> Option<Vec3>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(5.0, 5.0, 5.0),
            target: Vec3::ZERO,
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// OpenGL-style projection: visible depth maps to NDC z in [-1, 1].
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect, self.near, self.far)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub camera: PerspectiveCamera,
    /// Rotation speed about x and y, radians per second.
    pub rotation_rate: Vec2,
    pub model_scale: f32,
    /// Hide anchors on the side of the model facing away from the camera.
    pub cull_far_side: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            camera: PerspectiveCamera::default(),
            rotation_rate: Vec2::new(0.2, 0.3),
            model_scale: 1.5,
            cull_far_side: true,
        }
    }
}

/// A model spinning at a constant rate in front of a fixed camera.
#[derive(Debug, Clone)]
pub struct OrbitScene {
    camera: PerspectiveCamera,
    rate: Vec2,
    scale: f32,
    rotation: Vec2,
}

impl OrbitScene {
    pub fn new(config: &ProjectionConfig) -> Self {
        Self {
            camera: config.camera,
            rate: config.rotation_rate,
            scale: config.model_scale,
            rotation: Vec2::ZERO,
        }
    }

    /// Advance the rotation by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        let dt = dt.max(0.0) as f32;
        self.rotation += self.rate * dt;
        self.rotation.x %= std::f32::consts::TAU;
        self.rotation.y %= std::f32::consts::TAU;
    }

    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec2) {
        self.rotation = rotation;
    }
}

impl SceneView for OrbitScene {
    fn world_transform(&self) -> Option<Mat4> {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0);
        Some(Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            rotation,
            Vec3::ZERO,
        ))
    }

    fn view_projection(&self, aspect: f32) -> Option<Mat4> {
        if !(aspect.is_finite() && aspect > 0.0) {
            return None;
        }
        Some(self.camera.projection(aspect) * self.camera.view())
    }

    fn camera_position(&self) -> Option<Vec3> {
        Some(self.camera.position)
    }
}
