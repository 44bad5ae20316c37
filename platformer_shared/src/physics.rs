//! Fixed-substep physics.
//!
//! A rendered frame is cut into `ceil(frame_time / frame_step)` substeps, the
//! last one clipped to the remaining time. Each substep:
//! - applies gravity to every active entity (collidable, not passive, not
//!   destroyed, not carried),
//! - tests it against every other participating entity in storage order,
//!   zeroing the velocity component that points into the contacted face and
//!   running the subject's collision hook,
//! - then integrates every active position.
//!
//! Pair rules:
//! - weapon/weapon, weapon/pack and pack/pack pairs are never tested;
//! - player/weapon and player/pack pairs run the hook but never block;
//! - carried weapons are neither subjects nor objects.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    collider::{HasCollision, Side},
    entity::{Entity, EntityId, HasBehavior, KindTag},
    event::{CollisionEvent, EventBus},
    math::Vec3,
};

/// Physics parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Substep length in seconds.
    pub frame_step: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -35.0, 0.0),
            frame_step: 0.001,
        }
    }
}

/// Physics stepper trait.
pub trait PhysicsBackend: Send + Sync {
    /// Advances `entities` by one rendered frame and returns the number of
    /// substeps run.
    fn step(&mut self, entities: &mut [Entity], events: &mut EventBus, frame_time: f32) -> usize;
}

/// Frozen world: nothing moves, nothing collides.
#[derive(Default)]
pub struct NullPhysics;

impl PhysicsBackend for NullPhysics {
    fn step(&mut self, _entities: &mut [Entity], _events: &mut EventBus, _frame_time: f32) -> usize {
        0
    }
}

/// How a pair of kinds interacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    Skip,
    /// Hook only; velocities are left alone.
    Overlap,
    Blocking,
}

impl Pairing {
    pub fn of(subject: KindTag, other: KindTag) -> Self {
        use KindTag::*;
        match (subject, other) {
            (Weapon | Pack, Weapon | Pack) => Pairing::Skip,
            (Player, Weapon | Pack) | (Weapon | Pack, Player) => Pairing::Overlap,
            _ => Pairing::Blocking,
        }
    }
}

/// Zeroes the velocity component moving into the contacted face.
pub fn block(speed: &mut Vec3, side: Side) {
    match side {
        Side::Top if speed.y < 0.0 => speed.y = 0.0,
        Side::Bottom if speed.y > 0.0 => speed.y = 0.0,
        Side::Left if speed.x > 0.0 => speed.x = 0.0,
        Side::Right if speed.x < 0.0 => speed.x = 0.0,
        _ => {}
    }
}

/// The default integrator.
#[derive(Debug, Default)]
pub struct SubstepPhysics {
    pub config: PhysicsConfig,
}

impl SubstepPhysics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    fn substep(
        &self,
        entities: &mut [Entity],
        events: &mut EventBus,
        dt: f32,
        contacts: &mut BTreeSet<(EntityId, EntityId)>,
    ) {
        let gravity = self.config.gravity * dt;

        for i in 0..entities.len() {
            if !entities[i].is_active() {
                continue;
            }
            entities[i].body.speed += gravity;

            for j in 0..entities.len() {
                if i == j || !entities[j].participates() {
                    continue;
                }
                // A hook may have picked the subject up.
                if !entities[i].is_active() {
                    break;
                }
                let pairing = Pairing::of(entities[i].tag(), entities[j].tag());
                if pairing == Pairing::Skip {
                    continue;
                }
                let side = entities[j].world_box().collides(&entities[i].world_box());
                if !side.is_contact() {
                    continue;
                }

                let (subject, other) = pair_mut(entities, i, j);
                if pairing == Pairing::Blocking {
                    block(&mut subject.body.speed, side);
                }
                subject.on_collision(other, side, events);

                if contacts.insert((subject.id(), other.id())) {
                    tracing::trace!(subject = ?subject.id(), other = ?other.id(), ?side, "contact");
                    events.push(CollisionEvent {
                        subject: subject.id(),
                        other: other.id(),
                        side,
                    });
                }
            }
        }

        for e in entities.iter_mut().filter(|e| e.is_active()) {
            let delta = e.body.speed * dt;
            e.body.transform.translate(delta);
        }
    }
}

impl PhysicsBackend for SubstepPhysics {
    fn step(&mut self, entities: &mut [Entity], events: &mut EventBus, frame_time: f32) -> usize {
        let frame_step = self.config.frame_step;
        if frame_time <= 0.0 || frame_step <= 0.0 {
            return 0;
        }

        let steps = (frame_time / frame_step).ceil() as usize;
        let mut contacts = BTreeSet::new();
        let mut elapsed = 0.0_f32;
        let mut ran = 0;
        for _ in 0..steps {
            let dt = frame_step.min(frame_time - elapsed);
            if dt <= 0.0 {
                break;
            }
            self.substep(entities, events, dt, &mut contacts);
            elapsed += dt;
            ran += 1;
        }
        ran
    }
}

/// Two distinct mutable entries of one slice.
pub(crate) fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    if i < j {
        let (lo, hi) = entities.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = entities.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}
