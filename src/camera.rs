use glam::{Mat4, Vec3};
use std::f32::consts::PI;

/// Perspective camera orbiting a target, with damped rotation and auto-rotate.
///
/// Angles follow the usual orbit-control convention: `theta` around +Y,
/// `phi` measured from +Y.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    theta: f32,
    phi: f32,
    radius: f32,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,

    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

const EPS: f32 = 1e-6;

impl OrbitCamera {
    /// Camera at `eye` looking at the origin
    pub fn new(eye: Vec3, aspect: f32) -> Self {
        let radius = eye.length().max(EPS);
        let theta = eye.x.atan2(eye.z);
        let phi = (eye.y / radius).clamp(-1.0, 1.0).acos();

        Self {
            target: Vec3::ZERO,
            fov_y: 60f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1500.0,
            theta,
            phi,
            radius,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            damping: 0.04,
            rotate_speed: 0.3,
            zoom_speed: 1.0,
            min_distance: 30.0,
            max_distance: 300.0,
            auto_rotate: true,
            auto_rotate_speed: 0.15,
        }
    }

    /// Default framing: 90 units back on +Z
    pub fn framing(width: u32, height: u32) -> Self {
        let mut camera = Self::new(Vec3::new(0.0, 0.0, 90.0), 1.0);
        camera.set_viewport(width, height);
        camera
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn azimuth(&self) -> f32 {
        self.theta
    }

    pub fn eye(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    /// Pointer drag in pixels; a full viewport height of drag is one turn at speed 1
    pub fn drag(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.theta_delta -= 2.0 * PI * dx / h * self.rotate_speed;
        self.phi_delta -= 2.0 * PI * dy / h * self.rotate_speed;
    }

    /// Wheel input, positive = scroll toward the scene
    pub fn zoom(&mut self, steps: f32) {
        let factor = 0.95f32.powf(self.zoom_speed * steps.abs());
        if steps > 0.0 {
            self.scale *= factor;
        } else if steps < 0.0 {
            self.scale /= factor;
        }
    }

    /// Apply pending input, damping and auto-rotation for one frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.auto_rotate {
            // auto_rotate_speed 1.0 is one turn per minute
            self.theta_delta -= 2.0 * PI / 60.0 * self.auto_rotate_speed * dt;
        }

        self.theta += self.theta_delta * self.damping;
        self.phi += self.phi_delta * self.damping;
        self.phi = self.phi.clamp(EPS, PI - EPS);

        self.radius = (self.radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;

        self.theta_delta *= 1.0 - self.damping;
        self.phi_delta *= 1.0 - self.damping;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect.max(EPS), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_positive_z() {
        let cam = OrbitCamera::framing(800, 600);
        assert!((cam.eye() - Vec3::new(0.0, 0.0, 90.0)).length() < 1e-3);
        assert!((cam.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrbitCamera::framing(100, 100);
        for _ in 0..200 {
            cam.zoom(1.0);
            cam.update(0.0);
        }
        assert!((cam.distance() - 30.0).abs() < 1e-4);

        for _ in 0..200 {
            cam.zoom(-1.0);
            cam.update(0.0);
        }
        assert!((cam.distance() - 300.0).abs() < 1e-3);
    }

    #[test]
    fn auto_rotate_keeps_distance() {
        let mut cam = OrbitCamera::framing(100, 100);
        let start = cam.azimuth();
        for _ in 0..120 {
            cam.update(1.0 / 60.0);
        }
        assert!(cam.azimuth() != start);
        assert!((cam.eye().length() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn drag_motion_decays() {
        let mut cam = OrbitCamera::framing(100, 100);
        cam.auto_rotate = false;
        cam.drag(50.0, 0.0, 100.0);
        cam.update(0.0);
        let first = cam.azimuth();
        for _ in 0..500 {
            cam.update(0.0);
        }
        let settled = cam.azimuth();
        cam.update(0.0);
        assert!(first != 0.0);
        assert!((cam.azimuth() - settled).abs() < 1e-6);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut cam = OrbitCamera::framing(100, 100);
        cam.set_viewport(1920, 1080);
        assert!((cam.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        cam.set_viewport(0, 0);
        assert!((cam.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }
}
