//! Transform composition.
//!
//! Every entity owns one `TransformState`:
//! - translation, rotation and scale multiply into the model matrix
//!   (`translation * rotation * scale`);
//! - shear and replication only touch UV sampling. Shear selects one band of a
//!   texture atlas, replication tiles a texture across a stretched quad.
//!
//! Rotation keeps a right/up/target basis. Each `rotate` call turns that basis
//! and rebuilds an orthonormal frame from it, so repeated calls do not drift.

use crate::{
    error::{CoreError, CoreResult},
    math::{Mat3, Mat4, Quat, Vec3},
};

const PARALLEL_EPS: f32 = 1e-6;

/// Position/orientation/scale plus UV slicing of a single object.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    translation: Mat4,
    rotation: Mat4,
    scale: Mat4,
    shear: Mat4,
    replication: Mat4,
    right: Vec3,
    up: Vec3,
    target: Vec3,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            translation: Mat4::IDENTITY,
            rotation: Mat4::IDENTITY,
            scale: Mat4::IDENTITY,
            shear: Mat4::IDENTITY,
            replication: Mat4::IDENTITY,
            right: Vec3::UNIT_X,
            up: Vec3::UNIT_Y,
            target: -Vec3::UNIT_Z,
        }
    }
}

impl TransformState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform placed at `position` with the given scale factors.
    pub fn at(position: Vec3, scale: Vec3) -> Self {
        let mut t = Self::default();
        t.set_position(position);
        t.scale = Mat4::from_scale(scale);
        t
    }

    pub fn position(&self) -> Vec3 {
        self.translation.translation()
    }

    /// Writes the translation column. Zero is a valid position.
    pub fn set_position(&mut self, position: Vec3) {
        self.translation.set_translation(position);
    }

    pub fn translate(&mut self, delta: Vec3) {
        let p = self.position();
        self.set_position(p + delta);
    }

    /// Rotates the basis about `axis` by `degrees`. A zero axis is ignored.
    pub fn rotate(&mut self, axis: Vec3, degrees: f32) {
        if axis == Vec3::ZERO {
            return;
        }
        let turn = Quat::from_axis_angle(axis.normalize(), degrees.to_radians())
            .normalize()
            .to_mat3();
        let target = (turn * self.target).normalize();
        let up = (turn * self.up).normalize();

        let right = target.cross(up).normalize();
        let up = right.cross(target).normalize();
        self.store_basis(right, up, target);
    }

    /// Orients the object so that it faces `direction`. A zero direction is
    /// ignored. When `direction` is parallel to the world up axis the previous
    /// right vector is kept.
    pub fn look_at(&mut self, direction: Vec3) {
        if direction == Vec3::ZERO {
            return;
        }
        let forward = -direction.normalize();
        let right = if forward.cross(Vec3::UNIT_Y).len_sq() > PARALLEL_EPS {
            Vec3::UNIT_Y.cross(forward).normalize()
        } else {
            self.right
        };
        let up = forward.cross(right).normalize();
        self.store_basis(right, up, -forward);
    }

    fn store_basis(&mut self, right: Vec3, up: Vec3, target: Vec3) {
        self.right = right;
        self.up = up;
        self.target = target;
        self.rotation = Mat4::from_rotation(Mat3::from_rows(right, up, -target));
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Display angles in degrees as (pitch, yaw, roll).
    pub fn euler_angles(&self) -> Vec3 {
        let e = Quat::from_mat3(&self.rotation.rotation_block()).to_euler();
        Vec3::new(e.x.to_degrees(), e.y.to_degrees(), e.z.to_degrees())
    }

    pub fn scale_x(&mut self, factor: f32) {
        self.scale.m[0][0] *= factor;
    }

    pub fn scale_y(&mut self, factor: f32) {
        self.scale.m[1][1] *= factor;
    }

    pub fn scale_z(&mut self, factor: f32) {
        self.scale.m[2][2] *= factor;
    }

    pub fn scale(&self) -> Vec3 {
        Vec3::new(self.scale.m[0][0], self.scale.m[1][1], self.scale.m[2][2])
    }

    /// Selects atlas column `slice` out of `total` on the U axis.
    pub fn shear_x(&mut self, slice: u32, total: u32) -> CoreResult<()> {
        self.shear_axis(0, slice, total)
    }

    /// Selects atlas row `slice` out of `total` on the V axis.
    pub fn shear_y(&mut self, slice: u32, total: u32) -> CoreResult<()> {
        self.shear_axis(1, slice, total)
    }

    fn shear_axis(&mut self, axis: usize, slice: u32, total: u32) -> CoreResult<()> {
        if slice >= total {
            return Err(CoreError::InvalidSlice { slice, total });
        }
        let width = 1.0 / total as f32;
        self.shear.m[axis][axis] = width;
        self.shear.m[axis][3] = slice as f32 * width;
        Ok(())
    }

    pub fn replicate_x(&mut self, factor: f32) {
        self.replication.m[0][0] = factor;
    }

    pub fn replicate_y(&mut self, factor: f32) {
        self.replication.m[1][1] = factor;
    }

    /// Local-to-world matrix.
    pub fn model_matrix(&self) -> Mat4 {
        self.translation * self.rotation * self.scale
    }

    /// Translation and scale only; colliders never rotate.
    pub fn translation_scale(&self) -> Mat4 {
        self.translation * self.scale
    }

    /// UV transform handed to the sprite shader.
    pub fn uv_matrix(&self) -> Mat4 {
        self.shear * self.replication
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        self.rotation
    }

    /// UV interval covered on the U axis, after slicing and tiling.
    pub fn uv_band_x(&self) -> (f32, f32) {
        let uv = self.uv_matrix();
        (uv.transform_point(Vec3::ZERO).x, uv.transform_point(Vec3::UNIT_X).x)
    }

    pub fn uv_band_y(&self) -> (f32, f32) {
        let uv = self.uv_matrix();
        (uv.transform_point(Vec3::ZERO).y, uv.transform_point(Vec3::UNIT_Y).y)
    }
}

/// Objects placed in the world by a `TransformState`.
pub trait HasTransform {
    fn transform(&self) -> &TransformState;
    fn transform_mut(&mut self) -> &mut TransformState;

    fn position(&self) -> Vec3 {
        self.transform().position()
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform_mut().set_position(position);
    }
}
