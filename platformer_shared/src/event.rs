//! Event and messaging system.
//!
//! This is a small typed event bus. The scene pushes gameplay events into it
//! while updating; the client (renderer, audio, HUD) drains them after the
//! frame completes.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use crate::{
    collider::Side,
    entity::EntityId,
    math::Vec3,
    pack::Payload,
    weapon::WeaponState,
};

/// Typed event bus.
#[derive(Default)]
pub struct EventBus {
    queues: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventBus {
    /// Pushes an event into the queue.
    pub fn push<E: 'static + Send + Sync>(&mut self, e: E) {
        let q = self
            .queues
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<E>::new()));
        if let Some(q) = q.downcast_mut::<Vec<E>>() {
            q.push(e);
        }
    }

    /// Drains all queued events of a type.
    pub fn drain<E: 'static + Send + Sync>(&mut self) -> Vec<E> {
        self.queues
            .remove(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast::<Vec<E>>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default()
    }

    /// Number of queued events of a type.
    pub fn pending<E: 'static + Send + Sync>(&self) -> usize {
        self.queues
            .get(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_ref::<Vec<E>>())
            .map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}

/// A subject touched another entity during a frame. Reported once per pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub subject: EntityId,
    pub other: EntityId,
    pub side: Side,
}

/// A player consumed a pack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupEvent {
    pub player: EntityId,
    pub pack: EntityId,
    pub payload: Payload,
    pub value: f32,
}

/// A weapon changed state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponEvent {
    pub weapon: EntityId,
    pub player: Option<EntityId>,
    pub state: WeaponState,
}

/// A weapon fired a shot trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotEvent {
    pub weapon: EntityId,
    pub origin: Vec3,
    pub end: Vec3,
    pub hit: Option<EntityId>,
}

/// A player took damage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub target: EntityId,
    pub amount: f32,
    pub health: f32,
}
