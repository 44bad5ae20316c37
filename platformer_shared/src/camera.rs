//! Side-view camera.
//!
//! The camera is a plain transform holder. Each frame the client reads the
//! followed player's position and moves the camera; nothing subscribes to
//! position changes.

use crate::{
    config::ViewConfig,
    math::{Mat4, Vec3},
    transform::{HasTransform, TransformState},
};

const DEPTH: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct Camera {
    transform: TransformState,
    pub view: ViewConfig,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl Camera {
    pub fn new(view: ViewConfig) -> Self {
        let mut transform = TransformState::new();
        transform.look_at(-Vec3::UNIT_Z);
        Self { transform, view }
    }

    /// Centers the view on `target` plus the configured offset.
    pub fn follow(&mut self, target: Vec3) {
        self.set_position(target + self.view.follow_offset);
    }

    /// World to camera space.
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.rotation_matrix() * Mat4::from_translation(-self.position())
    }

    pub fn projection(&self) -> Mat4 {
        let (w, h) = (self.view.half_width, self.view.half_height);
        Mat4::orthographic(-w, w, -h, h, -DEPTH, DEPTH)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view_matrix()
    }

    /// Whether a world point lands inside the visible rectangle.
    pub fn sees(&self, point: Vec3) -> bool {
        let p = self.view_proj().transform_point(point);
        p.x.abs() <= 1.0 && p.y.abs() <= 1.0
    }
}

impl HasTransform for Camera {
    fn transform(&self) -> &TransformState {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut TransformState {
        &mut self.transform
    }
}
