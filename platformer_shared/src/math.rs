//! Math types.
//!
//! This module intentionally stays small and deterministic.
//! It avoids SIMD/unsafe and focuses on stable semantics:
//! - `Vec3` compares exactly (no epsilon).
//! - `Mat3`/`Mat4` are row-major; `m[row][col]`.
//! - Out-of-range element reads yield NaN, out-of-range writes are ignored.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UNIT_X: Self = Self::new(1.0, 0.0, 0.0);
    pub const UNIT_Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const UNIT_Z: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.len_sq().sqrt()
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::ZERO;
        }
        self / len
    }

    pub fn approx_eq(self, rhs: Self, eps: f32) -> bool {
        (self.x - rhs.x).abs() <= eps && (self.y - rhs.y).abs() <= eps && (self.z - rhs.z).abs() <= eps
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl MulAssign<f32> for Vec3 {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// 3x3 matrix (row-major).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    pub m: [[f32; 3]; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const ZERO: Self = Self { m: [[0.0; 3]; 3] };

    pub fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self {
            m: [r0.to_array(), r1.to_array(), r2.to_array()],
        }
    }

    /// Row as a vector; NaN components when out of range.
    pub fn row(&self, row: usize) -> Vec3 {
        Vec3::new(self.get(row, 0), self.get(row, 1), self.get(row, 2))
    }

    /// Element at (row, col); NaN when out of range.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(f32::NAN)
    }

    /// Writes (row, col); ignored when out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        if let Some(cell) = self.m.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::ZERO;
        for r in 0..3 {
            for c in 0..3 {
                out.m[c][r] = self.m[r][c];
            }
        }
        out
    }
}

impl Mul for Mat3 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut out = Self::ZERO;
        for r in 0..3 {
            for c in 0..3 {
                out.m[r][c] = (0..3).map(|k| self.m[r][k] * rhs.m[k][c]).sum();
            }
        }
        out
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        Vec3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }
}

impl Mul<f32> for Mat3 {
    type Output = Self;
    fn mul(mut self, s: f32) -> Self {
        self.m.iter_mut().flatten().for_each(|e| *e *= s);
        self
    }
}

impl Add for Mat3 {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        for r in 0..3 {
            for c in 0..3 {
                self.m[r][c] += rhs.m[r][c];
            }
        }
        self
    }
}

impl Sub for Mat3 {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        for r in 0..3 {
            for c in 0..3 {
                self.m[r][c] -= rhs.m[r][c];
            }
        }
        self
    }
}

/// 4x4 matrix (row-major). Translation lives in the last column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Self = Self { m: [[0.0; 4]; 4] };

    pub fn from_translation(t: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.set_translation(t);
        out
    }

    pub fn from_scale(s: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][0] = s.x;
        out.m[1][1] = s.y;
        out.m[2][2] = s.z;
        out
    }

    /// Embeds a 3x3 rotation block into an otherwise identity matrix.
    pub fn from_rotation(r: Mat3) -> Self {
        let mut out = Self::IDENTITY;
        for row in 0..3 {
            out.m[row][..3].copy_from_slice(&r.m[row]);
        }
        out
    }

    /// Orthographic projection mapping the given box to clip space.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][0] = 2.0 / (right - left);
        out.m[1][1] = 2.0 / (top - bottom);
        out.m[2][2] = -2.0 / (far - near);
        out.m[0][3] = -(right + left) / (right - left);
        out.m[1][3] = -(top + bottom) / (top - bottom);
        out.m[2][3] = -(far + near) / (far - near);
        out
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }

    pub fn set_translation(&mut self, t: Vec3) {
        self.m[0][3] = t.x;
        self.m[1][3] = t.y;
        self.m[2][3] = t.z;
    }

    pub fn rotation_block(&self) -> Mat3 {
        let mut out = Mat3::ZERO;
        for r in 0..3 {
            out.m[r].copy_from_slice(&self.m[r][..3]);
        }
        out
    }

    /// Element at (row, col); NaN when out of range.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(f32::NAN)
    }

    /// Writes (row, col); ignored when out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        if let Some(cell) = self.m.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.m[c][r] = self.m[r][c];
            }
        }
        out
    }

    /// Transforms a point (w = 1).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let row = |r: usize| self.m[r][0] * p.x + self.m[r][1] * p.y + self.m[r][2] * p.z + self.m[r][3];
        Vec3::new(row(0), row(1), row(2))
    }

    /// Transforms a direction (w = 0).
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        let row = |r: usize| self.m[r][0] * v.x + self.m[r][1] * v.y + self.m[r][2] * v.z;
        Vec3::new(row(0), row(1), row(2))
    }
}

impl Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut out = Self::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.m[r][c] = (0..4).map(|k| self.m[r][k] * rhs.m[k][c]).sum();
            }
        }
        out
    }
}

/// Matrix times point.
impl Mul<Vec3> for Mat4 {
    type Output = Vec3;
    fn mul(self, p: Vec3) -> Vec3 {
        self.transform_point(p)
    }
}

impl Mul<f32> for Mat4 {
    type Output = Self;
    fn mul(mut self, s: f32) -> Self {
        self.m.iter_mut().flatten().for_each(|e| *e *= s);
        self
    }
}

impl Add for Mat4 {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        for r in 0..4 {
            for c in 0..4 {
                self.m[r][c] += rhs.m[r][c];
            }
        }
        self
    }
}

impl Sub for Mat4 {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        for r in 0..4 {
            for c in 0..4 {
                self.m[r][c] -= rhs.m[r][c];
            }
        }
        self
    }
}

/// Rotation quaternion. Only used to build rotation matrices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// `axis` is expected to be normalized.
    pub fn from_axis_angle(axis: Vec3, radians: f32) -> Self {
        let (s, c) = (radians * 0.5).sin_cos();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: c,
        }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::IDENTITY;
        }
        Self {
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
            w: self.w / len,
        }
    }

    pub fn conjugate(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    /// Rotates `v` by this (unit) quaternion: q * v * q^-1.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Quat { x: v.x, y: v.y, z: v.z, w: 0.0 };
        let r = self * p * self.conjugate();
        Vec3::new(r.x, r.y, r.z)
    }

    pub fn to_mat3(self) -> Mat3 {
        let Quat { x, y, z, w } = self;
        Mat3 {
            m: [
                [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - z * w), 2.0 * (x * z + y * w)],
                [2.0 * (x * y + z * w), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - x * w)],
                [2.0 * (x * z - y * w), 2.0 * (y * z + x * w), 1.0 - 2.0 * (x * x + y * y)],
            ],
        }
    }

    /// Extracts the rotation of an orthonormal matrix.
    pub fn from_mat3(r: &Mat3) -> Self {
        let m = &r.m;
        let trace = m[0][0] + m[1][1] + m[2][2];
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Quat {
                w: 0.25 * s,
                x: (m[2][1] - m[1][2]) / s,
                y: (m[0][2] - m[2][0]) / s,
                z: (m[1][0] - m[0][1]) / s,
            }
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
            Quat {
                w: (m[2][1] - m[1][2]) / s,
                x: 0.25 * s,
                y: (m[0][1] + m[1][0]) / s,
                z: (m[0][2] + m[2][0]) / s,
            }
        } else if m[1][1] > m[2][2] {
            let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
            Quat {
                w: (m[0][2] - m[2][0]) / s,
                x: (m[0][1] + m[1][0]) / s,
                y: 0.25 * s,
                z: (m[1][2] + m[2][1]) / s,
            }
        } else {
            let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
            Quat {
                w: (m[1][0] - m[0][1]) / s,
                x: (m[0][2] + m[2][0]) / s,
                y: (m[1][2] + m[2][1]) / s,
                z: 0.25 * s,
            }
        };
        q.normalize()
    }

    /// Euler angles in radians as (pitch about X, yaw about Y, roll about Z).
    pub fn to_euler(self) -> Vec3 {
        let Quat { x, y, z, w } = self;
        let pitch = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let sin_yaw = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);
        let yaw = sin_yaw.asin();
        let roll = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        Vec3::new(pitch, yaw, roll)
    }
}

/// Hamilton product; `a * b` applies `b` first.
impl Mul for Quat {
    type Output = Self;
    fn mul(self, b: Self) -> Self {
        let a = self;
        Quat {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_cross_follows_right_hand_rule() {
        assert_eq!(Vec3::UNIT_X.cross(Vec3::UNIT_Y), Vec3::UNIT_Z);
        assert_eq!(Vec3::UNIT_Y.cross(Vec3::UNIT_Z), Vec3::UNIT_X);
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        assert_eq!(Vec3::new(0.0, 3.0, 4.0).length(), 5.0);
    }

    #[test]
    fn matrix_out_of_range_access() {
        let mut m = Mat4::IDENTITY;
        assert!(m.get(4, 0).is_nan());
        assert!(m.get(0, 7).is_nan());
        m.set(9, 9, 3.0);
        assert_eq!(m, Mat4::IDENTITY);

        let mut m3 = Mat3::IDENTITY;
        assert!(m3.get(3, 3).is_nan());
        m3.set(1, 2, 5.0);
        assert_eq!(m3.get(1, 2), 5.0);
    }

    #[test]
    fn translation_times_scale_moves_points() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 0.0)) * Mat4::from_scale(Vec3::new(2.0, 3.0, 1.0));
        assert_eq!(m * Vec3::new(1.0, 1.0, 0.0), Vec3::new(3.0, 5.0, 0.0));
        assert_eq!(m.transform_vector(Vec3::new(1.0, 1.0, 0.0)), Vec3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn transpose_and_arithmetic() {
        let mut a = Mat4::IDENTITY;
        a.set(0, 3, 7.0);
        assert_eq!(a.transpose().get(3, 0), 7.0);
        let doubled = a * 2.0;
        assert_eq!(doubled - a, a);
        assert_eq!(a + a, doubled);
    }

    #[test]
    fn quat_quarter_turn_about_z() {
        let q = Quat::from_axis_angle(Vec3::UNIT_Z, std::f32::consts::FRAC_PI_2).normalize();
        assert!(q.rotate(Vec3::UNIT_X).approx_eq(Vec3::UNIT_Y, 1e-6));
        assert!((q.to_mat3() * Vec3::UNIT_X).approx_eq(Vec3::UNIT_Y, 1e-6));
    }

    #[test]
    fn quat_matrix_roundtrip_and_euler() {
        let q = Quat::from_axis_angle(Vec3::UNIT_Z, 0.5);
        let back = Quat::from_mat3(&q.to_mat3());
        assert!((back.w - q.w).abs() < 1e-5);
        assert!((back.z - q.z).abs() < 1e-5);
        let e = q.to_euler();
        assert!((e.z - 0.5).abs() < 1e-5);
        assert!(e.x.abs() < 1e-5 && e.y.abs() < 1e-5);
    }
}
