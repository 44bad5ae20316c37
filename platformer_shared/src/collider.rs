//! Axis-aligned colliders.
//!
//! A collider is a quad in local space with corners stored in a fixed order:
//! top-right, top-left, bottom-left, bottom-right. World-space corners are
//! produced on demand from the owner's translation and scale; rotation is
//! never applied.
//!
//! `WorldBox::collides` is a corner-containment test evaluated from the
//! receiver's frame, so `a.collides(b)` and `b.collides(a)` can disagree. A box
//! fully containing the receiver, or two boxes crossing without any corner
//! inside the other, report `Side::None`. Gameplay depends on this, so it is
//! kept as is.

use serde::{Deserialize, Serialize};

use crate::{
    math::Vec3,
    transform::{HasTransform, TransformState},
};

/// Face of the reference box penetrated by the other box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Side {
    #[default]
    None,
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn is_contact(self) -> bool {
        self != Side::None
    }
}

/// Corner indices.
pub const TOP_RIGHT: usize = 0;
pub const TOP_LEFT: usize = 1;
pub const BOTTOM_LEFT: usize = 2;
pub const BOTTOM_RIGHT: usize = 3;

/// Local-space quad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    corners: [Vec3; 4],
}

impl Default for Collider {
    fn default() -> Self {
        Self::from_half_extents(0.5, 0.5)
    }
}

impl Collider {
    /// Quad centered on the local origin.
    pub fn from_half_extents(half_width: f32, half_height: f32) -> Self {
        Self::from_bounds(-half_width, half_width, -half_height, half_height)
    }

    pub fn from_bounds(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            corners: [
                Vec3::new(right, top, 0.0),
                Vec3::new(left, top, 0.0),
                Vec3::new(left, bottom, 0.0),
                Vec3::new(right, bottom, 0.0),
            ],
        }
    }

    pub fn corners(&self) -> &[Vec3; 4] {
        &self.corners
    }

    /// Corners in world space (translation and scale only).
    pub fn world_box(&self, transform: &TransformState) -> WorldBox {
        let m = transform.translation_scale();
        WorldBox {
            corners: self.corners.map(|c| m.transform_point(c)),
        }
    }
}

/// World-space quad, same corner order as `Collider`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBox {
    pub corners: [Vec3; 4],
}

impl WorldBox {
    pub fn left(&self) -> f32 {
        self.corners[TOP_LEFT].x
    }

    pub fn right(&self) -> f32 {
        self.corners[TOP_RIGHT].x
    }

    pub fn bottom(&self) -> f32 {
        self.corners[BOTTOM_RIGHT].y
    }

    pub fn top(&self) -> f32 {
        self.corners[TOP_RIGHT].y
    }

    /// Inclusive point containment in the XY plane.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.bottom() && p.y <= self.top()
    }

    /// Which of this box's faces `other` penetrates.
    ///
    /// The first corner of `other` (in corner order) lying inside this box is
    /// classified against the two diagonals anchored at this box's bottom
    /// corners. Checks run TOP, BOTTOM, LEFT, RIGHT and the first match wins.
    pub fn collides(&self, other: &WorldBox) -> Side {
        match other.corners.iter().find(|c| self.contains(**c)) {
            Some(corner) => self.classify(*corner),
            None => Side::None,
        }
    }

    fn classify(&self, p: Vec3) -> Side {
        let bl = self.corners[BOTTOM_LEFT];
        let br = self.corners[BOTTOM_RIGHT];
        // > 0: p is above the bottom-left -> top-right diagonal.
        let rising = cross_z(self.corners[TOP_RIGHT] - bl, p - bl);
        // > 0: p is left of the bottom-right -> top-left diagonal.
        let falling = cross_z(self.corners[TOP_LEFT] - br, p - br);

        if rising >= 0.0 && falling <= 0.0 {
            Side::Top
        } else if rising <= 0.0 && falling >= 0.0 {
            Side::Bottom
        } else if rising >= 0.0 && falling >= 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Distance along `dir` (unit) at which a ray from `origin` enters this
    /// box, if it does so within `max_dist`.
    pub fn ray_hit(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_dist;
        let slabs = [
            (origin.x, dir.x, self.left(), self.right()),
            (origin.y, dir.y, self.bottom(), self.top()),
        ];
        for (o, d, lo, hi) in slabs {
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

fn cross_z(a: Vec3, b: Vec3) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Objects that carry a collider.
pub trait HasCollision: HasTransform {
    fn collider(&self) -> &Collider;

    fn world_box(&self) -> WorldBox {
        self.collider().world_box(self.transform())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> WorldBox {
        let t = TransformState::at(Vec3::new(x, y, 0.0), Vec3::new(w, h, 1.0));
        Collider::default().world_box(&t)
    }

    #[test]
    fn world_box_applies_translation_and_scale() {
        let b = boxed(0.0, -0.5, 4.0, 1.0);
        assert_eq!(b.left(), -2.0);
        assert_eq!(b.right(), 2.0);
        assert_eq!(b.bottom(), -1.0);
        assert_eq!(b.top(), 0.0);
        assert_eq!(b.corners[TOP_RIGHT], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(b.corners[BOTTOM_LEFT], Vec3::new(-2.0, -1.0, 0.0));
    }

    #[test]
    fn rotation_does_not_affect_world_box() {
        let mut t = TransformState::at(Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 1.0));
        let before = Collider::default().world_box(&t);
        t.rotate(Vec3::UNIT_Z, 45.0);
        assert_eq!(Collider::default().world_box(&t), before);
    }

    #[test]
    fn separated_boxes_do_not_collide() {
        let a = boxed(0.0, 0.0, 1.0, 1.0);
        assert_eq!(a.collides(&boxed(3.0, 0.0, 1.0, 1.0)), Side::None);
        assert_eq!(a.collides(&boxed(0.0, -3.0, 1.0, 1.0)), Side::None);
        assert_eq!(a.collides(&boxed(-1.01, 0.0, 1.0, 1.0)), Side::None);
    }

    #[test]
    fn contained_corner_reports_face() {
        let floor = boxed(0.0, 0.0, 10.0, 10.0);
        // Bottom corners of a box resting on the top face.
        assert_eq!(floor.collides(&boxed(0.0, 5.4, 1.0, 1.0)), Side::Top);
        // Top corners poking into the bottom face.
        assert_eq!(floor.collides(&boxed(0.0, -5.4, 1.0, 1.0)), Side::Bottom);
        // Right corners entering the left face.
        assert_eq!(floor.collides(&boxed(-5.4, 0.0, 1.0, 1.0)), Side::Left);
        // Left corners entering the right face.
        assert_eq!(floor.collides(&boxed(5.4, 0.0, 1.0, 1.0)), Side::Right);
    }

    #[test]
    fn classification_is_deterministic() {
        let floor = boxed(0.0, 0.0, 4.0, 4.0);
        let sample = boxed(1.7, 1.8, 1.0, 1.0);
        let first = floor.collides(&sample);
        assert!(first.is_contact());
        for _ in 0..10 {
            assert_eq!(floor.collides(&sample), first);
        }
    }

    #[test]
    fn touching_edges_count_as_contact() {
        let floor = boxed(0.0, -0.5, 4.0, 1.0);
        let resting = boxed(0.0, 0.5, 1.0, 1.0);
        assert_eq!(floor.collides(&resting), Side::Top);
    }

    #[test]
    fn containment_test_is_asymmetric() {
        let big = boxed(0.0, 0.0, 10.0, 10.0);
        let small = boxed(0.0, 0.0, 1.0, 1.0);
        assert!(big.collides(&small).is_contact());
        // No corner of the big box lies inside the small one.
        assert_eq!(small.collides(&big), Side::None);
    }

    #[test]
    fn crossing_without_contained_corner_is_missed() {
        let wide = boxed(0.0, 0.0, 6.0, 1.0);
        let tall = boxed(0.0, 0.0, 1.0, 6.0);
        assert_eq!(wide.collides(&tall), Side::None);
        assert_eq!(tall.collides(&wide), Side::None);
    }

    #[test]
    fn ray_enters_box() {
        let b = boxed(5.0, 0.0, 2.0, 2.0);
        let hit = b.ray_hit(Vec3::ZERO, Vec3::UNIT_X, 100.0).unwrap();
        assert!((hit - 4.0).abs() < 1e-6);
        assert!(b.ray_hit(Vec3::ZERO, -Vec3::UNIT_X, 100.0).is_none());
        assert!(b.ray_hit(Vec3::ZERO, Vec3::UNIT_X, 3.0).is_none());
        assert!(b.ray_hit(Vec3::new(0.0, 3.0, 0.0), Vec3::UNIT_X, 100.0).is_none());
    }
}
