//! Weapon behavior.
//!
//! State machine:
//! `Available --pick--> Picked --throw--> Thrown --land--> Available`.
//! Weapons are never destroyed.
//!
//! While picked, a weapon fires when its trigger was pulled this frame and the
//! firing-rate timer allows it. Shots are emitted as `ShotTrace`s and resolved
//! by the scene.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    entity::{Body, EntityId, FrameContext},
    math::{Quat, Vec3},
};

/// Idle tilt amplitude in degrees.
const BOB_AMPLITUDE: f32 = 8.0;
/// Idle tilt angular speed in radians per second.
const BOB_SPEED: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponState {
    Available,
    Picked,
    Thrown,
}

/// Inventory slot a weapon occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    #[default]
    Primary,
    Secondary,
    Melee,
}

/// Loader-provided weapon parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    pub slot: Slot,
    pub max_ammo: u32,
    pub ammo: u32,
    /// Full spread cone in degrees.
    pub grouping_angle: f32,
    /// Shots per second.
    pub firing_speed: f32,
    pub damage: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            slot: Slot::Primary,
            max_ammo: 30,
            ammo: 30,
            grouping_angle: 4.0,
            firing_speed: 8.0,
            damage: 10.0,
        }
    }
}

impl WeaponStats {
    pub fn new(slot: Slot, max_ammo: u32, ammo: u32) -> Self {
        Self {
            slot,
            max_ammo,
            ammo: ammo.min(max_ammo),
            ..Self::default()
        }
    }
}

/// A fired shot, before hit resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotTrace {
    pub weapon: EntityId,
    pub carrier: Option<EntityId>,
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
    pub damage: f32,
    pub melee: bool,
}

#[derive(Debug, Clone)]
pub struct Weapon {
    pub stats: WeaponStats,
    state: WeaponState,
    carrier: Option<EntityId>,
    aim: Vec3,
    trigger: bool,
    cooldown: f32,
    elapsed: f32,
    tilt: f32,
}

impl Weapon {
    pub fn new(stats: WeaponStats) -> Self {
        Self {
            stats,
            state: WeaponState::Available,
            carrier: None,
            aim: Vec3::UNIT_X,
            trigger: false,
            cooldown: 0.0,
            elapsed: 0.0,
            tilt: 0.0,
        }
    }

    pub fn state(&self) -> WeaponState {
        self.state
    }

    pub fn carrier(&self) -> Option<EntityId> {
        self.carrier
    }

    /// `Available -> Picked`. Returns false from any other state.
    pub fn pick(&mut self, carrier: EntityId) -> bool {
        if self.state != WeaponState::Available {
            return false;
        }
        self.state = WeaponState::Picked;
        self.carrier = Some(carrier);
        true
    }

    /// `Picked -> Thrown`.
    pub fn throw(&mut self) -> bool {
        if self.state != WeaponState::Picked {
            return false;
        }
        self.state = WeaponState::Thrown;
        self.carrier = None;
        self.trigger = false;
        true
    }

    /// `Thrown -> Available`.
    pub fn land(&mut self) -> bool {
        if self.state != WeaponState::Thrown {
            return false;
        }
        self.state = WeaponState::Available;
        self.elapsed = 0.0;
        true
    }

    /// Points the weapon along `direction`; zero directions are ignored.
    pub fn set_aim(&mut self, direction: Vec3) {
        if direction.len_sq() > 0.0 {
            self.aim = direction.normalize();
        }
    }

    pub fn aim(&self) -> Vec3 {
        self.aim
    }

    pub fn facing(&self) -> f32 {
        if self.aim.x < 0.0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Pulls the trigger for the current frame.
    pub fn fire(&mut self) {
        self.trigger = true;
    }

    /// Rounds missing from a full magazine; melee weapons never need any.
    pub fn missing_ammo(&self) -> u32 {
        match self.stats.slot {
            Slot::Melee => 0,
            _ => self.stats.max_ammo.saturating_sub(self.stats.ammo),
        }
    }

    pub fn reload(&mut self, rounds: u32) {
        self.stats.ammo = (self.stats.ammo + rounds).min(self.stats.max_ammo);
    }

    /// Muzzle position for a weapon placed at `position`.
    pub fn muzzle(&self, position: Vec3, offset: Vec3) -> Vec3 {
        position + Vec3::new(offset.x * self.facing(), offset.y, offset.z)
    }

    fn set_tilt(&mut self, body: &mut Body, tilt: f32) {
        body.transform.rotate(Vec3::UNIT_Z, tilt - self.tilt);
        self.tilt = tilt;
    }

    pub(crate) fn animate(&mut self, id: EntityId, body: &mut Body, ctx: &mut FrameContext<'_>) {
        let dt = ctx.dt;
        self.elapsed += dt;
        self.cooldown = (self.cooldown - dt).max(0.0);

        match self.state {
            WeaponState::Available => {
                let tilt = self.facing() * BOB_AMPLITUDE * (self.elapsed * BOB_SPEED).sin();
                self.set_tilt(body, tilt);
            }
            WeaponState::Picked => {
                self.set_tilt(body, 0.0);
                if self.trigger {
                    if let Some(shot) = self.try_fire(id, body, &mut *ctx.rng) {
                        ctx.shots.push(shot);
                    }
                }
            }
            WeaponState::Thrown => {}
        }

        let slice = if self.facing() < 0.0 { 1 } else { 0 };
        if let Err(err) = body.transform.shear_x(slice, 2) {
            tracing::warn!(%err, "weapon facing slice rejected");
        }
        self.trigger = false;
    }

    fn try_fire(&mut self, id: EntityId, body: &Body, rng: &mut impl Rng) -> Option<ShotTrace> {
        let melee = self.stats.slot == Slot::Melee;
        if self.cooldown > 0.0 || (!melee && self.stats.ammo == 0) {
            return None;
        }
        if !melee {
            self.stats.ammo -= 1;
        }
        self.cooldown = if self.stats.firing_speed > 0.0 {
            1.0 / self.stats.firing_speed
        } else {
            f32::INFINITY
        };

        let half = self.stats.grouping_angle.abs() * 0.5;
        let spread = if half > 0.0 { rng.gen_range(-half..=half) } else { 0.0 };
        let direction = Quat::from_axis_angle(Vec3::UNIT_Z, spread.to_radians())
            .normalize()
            .rotate(self.aim)
            .normalize();

        Some(ShotTrace {
            weapon: id,
            carrier: self.carrier,
            origin: self.muzzle(body.transform.position(), body.origin),
            direction,
            damage: self.stats.damage,
            melee,
        })
    }
}
