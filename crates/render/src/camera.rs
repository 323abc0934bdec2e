use glam::{Mat3, Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Radius floor keeping the camera strictly outside the origin.
const MIN_RADIUS: f32 = 1e-3;

/// Camera orbiting the origin on a sphere: azimuth, polar angle (clamped
/// to the poles), and radius. View looks at the origin with +Y up.
pub struct OrbitCamera {
    radius: f32,
    theta: f32,
    phi: f32,
    position: Vec3,
    view: Mat4,
    projection: Mat4,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut camera = Self {
            radius: 2.0,
            theta: 0.0,
            phi: 0.0,
            position: Vec3::ZERO,
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh(
                std::f32::consts::FRAC_PI_4,
                16.0 / 9.0,
                0.001,
                20.0,
            ),
        };
        camera.update_view();
        camera
    }
}

impl OrbitCamera {
    pub fn new(radius: f32) -> Self {
        let mut camera = Self::default();
        camera.set_radius(radius);
        camera
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    /// Eye position on the orbit sphere.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Accumulate azimuth and polar deltas; the polar angle clamps at the
    /// poles instead of flipping over.
    pub fn rotate(&mut self, dtheta: f32, dphi: f32) {
        self.theta += dtheta;
        self.phi = (self.phi + dphi).clamp(-FRAC_PI_2, FRAC_PI_2);
        self.update_view();
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(MIN_RADIUS);
        self.update_view();
    }

    /// Multiply the orbit radius (wheel zoom).
    pub fn zoom(&mut self, factor: f32) {
        self.set_radius(self.radius * factor);
    }

    /// Recompute the projection; called on resize.
    pub fn perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Mat4::perspective_rh(fov_y, aspect, near, far);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Object-space → view-space normal transform for the display shader.
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.view).inverse().transpose()
    }

    fn update_view(&mut self) {
        let rotation = Mat4::from_rotation_y(self.theta) * Mat4::from_rotation_x(self.phi);
        self.position = rotation.transform_point3(Vec3::new(0.0, 0.0, self.radius));
        self.view = Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y);
    }
}
