//! Look-at camera with a cached view-projection matrix

use std::cell::Cell;

use glam::{Mat4, Vec3};

use super::math::{look_at, perspective};

/// Camera state.
///
/// The combined view-projection matrix is rebuilt on first use after any
/// setter runs. The cache sits in a `Cell`, so a `Camera` is not `Sync`.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    /// Vertical field of view in degrees
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,

    view_projection: Cell<Option<Mat4>>,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, up: Vec3, fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect,
            near,
            far,
            view_projection: Cell::new(None),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.invalidate();
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.invalidate();
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.invalidate();
    }

    pub fn set_projection(&mut self, fov: f32, aspect: f32, near: f32, far: f32) {
        self.fov = fov;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.invalidate();
    }

    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.position = eye;
        self.target = target;
        self.up = up;
        self.invalidate();
    }

    /// Match the aspect ratio to a viewport. Zero height is ignored.
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.invalidate();
    }

    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// projection * view, recomputed only when the camera changed
    pub fn view_projection(&self) -> Mat4 {
        if let Some(vp) = self.view_projection.get() {
            return vp;
        }
        let vp = self.projection_matrix() * self.view_matrix();
        self.view_projection.set(Some(vp));
        vp
    }

    pub fn mvp(&self, model: Mat4) -> Mat4 {
        self.view_projection() * model
    }

    pub fn is_dirty(&self) -> bool {
        self.view_projection.get().is_none()
    }

    fn invalidate(&mut self) {
        self.view_projection.set(None);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, 45.0, 4.0 / 3.0, 0.1, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_projection_is_cached() {
        let cam = Camera::default();
        assert!(cam.is_dirty());
        let vp = cam.view_projection();
        assert!(!cam.is_dirty());
        assert_eq!(cam.view_projection(), vp);
        assert_eq!(vp, cam.projection_matrix() * cam.view_matrix());
    }

    #[test]
    fn test_setters_mark_dirty() {
        let mut cam = Camera::default();
        let before = cam.view_projection();

        cam.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(cam.is_dirty());
        assert_ne!(cam.view_projection(), before);

        cam.set_viewport(800, 400);
        assert!(cam.is_dirty());
        assert!((cam.aspect() - 2.0).abs() < 0.0001);

        cam.view_projection();
        cam.set_projection(60.0, 1.0, 0.5, 50.0);
        assert!(cam.is_dirty());

        cam.view_projection();
        cam.look_at(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO, Vec3::Y);
        assert!(cam.is_dirty());
    }

    #[test]
    fn test_mvp_applies_model_last() {
        let cam = Camera::default();
        let model = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(cam.mvp(model), cam.view_projection() * model);
        assert_eq!(cam.mvp(Mat4::IDENTITY), cam.view_projection());
    }

    #[test]
    fn test_zero_height_viewport_ignored() {
        let mut cam = Camera::default();
        cam.set_viewport(100, 0);
        assert!((cam.aspect() - 4.0 / 3.0).abs() < 0.0001);
    }
}
