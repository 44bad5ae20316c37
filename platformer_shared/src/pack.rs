//! Pickups.
//!
//! Packs are passive: no gravity, never a collision subject. They hover on a
//! sine bob around the position they had on their first frame and cycle
//! through the frames of their atlas strip.

use serde::{Deserialize, Serialize};

use crate::{entity::Body, math::Vec3};

const BOB_AMPLITUDE: f32 = 0.15;
const BOB_SPEED: f32 = 2.5;
const FRAME_RATE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Health,
    Armor,
    PrimaryAmmo,
    SecondaryAmmo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pack {
    pub payload: Payload,
    pub value: f32,
    /// Number of animation frames in the atlas strip.
    pub frames: u32,
    base: Option<Vec3>,
    elapsed: f32,
}

impl Pack {
    pub fn new(payload: Payload, value: f32) -> Self {
        Self {
            payload,
            value,
            frames: 1,
            base: None,
            elapsed: 0.0,
        }
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames.max(1);
        self
    }

    /// Current atlas frame.
    pub fn frame(&self) -> u32 {
        (self.elapsed * FRAME_RATE) as u32 % self.frames.max(1)
    }

    pub(crate) fn animate(&mut self, body: &mut Body, dt: f32) {
        self.elapsed += dt;
        let base = *self.base.get_or_insert_with(|| body.transform.position());
        let lift = BOB_AMPLITUDE * (self.elapsed * BOB_SPEED).sin();
        body.transform.set_position(base + Vec3::UNIT_Y * lift);

        if let Err(err) = body.transform.shear_x(self.frame(), self.frames.max(1)) {
            tracing::warn!(%err, "pack frame rejected");
        }
    }
}
