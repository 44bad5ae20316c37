//! Entities.
//!
//! An entity is a `Body` (kinematics, flags, transform, collider) plus a
//! kind-specific payload. Kinds are a closed sum type; the scene matches on
//! them instead of downcasting.
//!
//! Behavior hooks:
//! - `animate` runs once per rendered frame;
//! - `on_collision` runs for every contact found during a physics substep,
//!   with the entity as subject. A player and an available weapon pair up
//!   whichever of the two is the subject.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::{
    collider::{Collider, HasCollision, Side},
    config::PlayerTuning,
    event::{EventBus, PickupEvent, WeaponEvent},
    math::Vec3,
    pack::Pack,
    player::Player,
    resources::{Handle, SpriteSheet},
    transform::{HasTransform, TransformState},
    weapon::{ShotTrace, Weapon, WeaponState},
};

/// Opaque entity id. Ids grow with creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

bitflags::bitflags! {
    /// Entity flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u8 {
        const NONE = 0;
        const COLLIDABLE = 1 << 0;   // Takes part in collision checks
        const PASSIVE = 1 << 1;      // No gravity, never a collision subject
        const VISIBLE = 1 << 2;      // Drawn by the renderer
        const DESTROYED = 1 << 3;    // Reaped at the end of the physics pass
    }
}

impl Default for EntityFlags {
    fn default() -> Self {
        Self::COLLIDABLE | Self::VISIBLE
    }
}

/// Level geometry flavor of a generic entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Visible, blocking.
    Solid,
    /// Invisible, blocking.
    Clip,
    /// Visible, not blocking (backgrounds, decorations).
    Passable,
}

impl Surface {
    pub fn default_flags(self) -> EntityFlags {
        match self {
            Surface::Solid => EntityFlags::COLLIDABLE | EntityFlags::VISIBLE | EntityFlags::PASSIVE,
            Surface::Clip => EntityFlags::COLLIDABLE | EntityFlags::PASSIVE,
            Surface::Passable => EntityFlags::VISIBLE | EntityFlags::PASSIVE,
        }
    }
}

/// Screen overlay anchored to another entity (health readout).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Widget {
    pub anchor: Option<EntityId>,
    pub offset: Vec3,
    pub label: String,
}

/// Kind-specific state.
#[derive(Debug, Clone)]
pub enum EntityKind {
    Generic(Surface),
    Player(Player),
    Weapon(Weapon),
    Pack(Pack),
    Widget(Widget),
}

/// Kind discriminant. The derived order is the update and draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KindTag {
    Generic,
    Pack,
    Player,
    Weapon,
    Widget,
}

impl EntityKind {
    pub fn tag(&self) -> KindTag {
        match self {
            EntityKind::Generic(_) => KindTag::Generic,
            EntityKind::Player(_) => KindTag::Player,
            EntityKind::Weapon(_) => KindTag::Weapon,
            EntityKind::Pack(_) => KindTag::Pack,
            EntityKind::Widget(_) => KindTag::Widget,
        }
    }
}

/// Kinematic and geometric state shared by every kind.
#[derive(Debug, Clone, Default)]
pub struct Body {
    pub speed: Vec3,
    /// Anchor offset from the position: hand for players, muzzle for weapons.
    pub origin: Vec3,
    pub flags: EntityFlags,
    pub transform: TransformState,
    pub collider: Collider,
}

impl Body {
    pub fn new(transform: TransformState, collider: Collider, flags: EntityFlags) -> Self {
        Self {
            speed: Vec3::ZERO,
            origin: Vec3::ZERO,
            flags,
            transform,
            collider,
        }
    }

    pub fn is_collidable(&self) -> bool {
        self.flags.contains(EntityFlags::COLLIDABLE)
    }

    pub fn is_passive(&self) -> bool {
        self.flags.contains(EntityFlags::PASSIVE)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(EntityFlags::VISIBLE)
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags.contains(EntityFlags::DESTROYED)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.flags.set(EntityFlags::VISIBLE, visible);
    }

    /// Flags the body for removal; the scene reaps it after the physics pass.
    pub fn destroy(&mut self) {
        self.flags.insert(EntityFlags::DESTROYED);
    }
}

/// Per-frame inputs handed to `animate`.
pub struct FrameContext<'a> {
    /// Rendered frame time.
    pub dt: f32,
    pub tuning: &'a PlayerTuning,
    pub rng: &'a mut StdRng,
    /// Shot traces emitted this frame; resolved by the scene.
    pub shots: &'a mut Vec<ShotTrace>,
}

/// Per-frame and per-contact behavior.
pub trait HasBehavior {
    fn animate(&mut self, ctx: &mut FrameContext<'_>);
    fn on_collision(&mut self, other: &mut Entity, side: Side, events: &mut EventBus);
}

/// A simulated object.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pub name: String,
    pub sprite: Option<Handle<SpriteSheet>>,
    pub body: Body,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>, body: Body, kind: EntityKind) -> Self {
        Self {
            id,
            name: name.into(),
            sprite: None,
            body,
            kind,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    /// Storage key: grouped by kind, then creation order.
    pub fn order_key(&self) -> (KindTag, EntityId) {
        (self.tag(), self.id)
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_weapon(&self) -> Option<&Weapon> {
        match &self.kind {
            EntityKind::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_weapon_mut(&mut self) -> Option<&mut Weapon> {
        match &mut self.kind {
            EntityKind::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_pack(&self) -> Option<&Pack> {
        match &self.kind {
            EntityKind::Pack(p) => Some(p),
            _ => None,
        }
    }

    /// Weapons carried by a player sit out of every collision check.
    pub fn is_carried(&self) -> bool {
        self.as_weapon().is_some_and(|w| w.state() == WeaponState::Picked)
    }

    /// Can be the object of a collision check.
    pub fn participates(&self) -> bool {
        self.body.is_collidable() && !self.body.is_destroyed() && !self.is_carried()
    }

    /// Receives gravity, collision resolution and position integration.
    pub fn is_active(&self) -> bool {
        self.participates() && !self.body.is_passive()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl HasTransform for Entity {
    fn transform(&self) -> &TransformState {
        &self.body.transform
    }

    fn transform_mut(&mut self) -> &mut TransformState {
        &mut self.body.transform
    }
}

impl HasCollision for Entity {
    fn collider(&self) -> &Collider {
        &self.body.collider
    }
}

impl HasBehavior for Entity {
    fn animate(&mut self, ctx: &mut FrameContext<'_>) {
        let id = self.id;
        match &mut self.kind {
            EntityKind::Generic(_) | EntityKind::Widget(_) => {}
            EntityKind::Player(player) => player.animate(&mut self.body, ctx),
            EntityKind::Weapon(weapon) => weapon.animate(id, &mut self.body, ctx),
            EntityKind::Pack(pack) => pack.animate(&mut self.body, ctx.dt),
        }
    }

    fn on_collision(&mut self, other: &mut Entity, side: Side, events: &mut EventBus) {
        let other_id = other.id;
        match (&mut self.kind, &mut other.kind) {
            (EntityKind::Player(player), EntityKind::Pack(pack)) => {
                if other.body.is_destroyed() {
                    return;
                }
                if player.consume(pack) {
                    other.body.destroy();
                    events.push(PickupEvent {
                        player: self.id,
                        pack: other_id,
                        payload: pack.payload,
                        value: pack.value,
                    });
                }
            }
            (EntityKind::Player(player), EntityKind::Weapon(weapon)) => {
                if player.weapon().is_none() && weapon.pick(self.id) {
                    player.hold(other_id);
                    other.body.speed = Vec3::ZERO;
                    events.push(WeaponEvent {
                        weapon: other_id,
                        player: Some(self.id),
                        state: WeaponState::Picked,
                    });
                }
            }
            (EntityKind::Weapon(weapon), EntityKind::Player(player)) => {
                if player.weapon().is_none() && weapon.pick(other_id) {
                    player.hold(self.id);
                    self.body.speed = Vec3::ZERO;
                    events.push(WeaponEvent {
                        weapon: self.id,
                        player: Some(other_id),
                        state: WeaponState::Picked,
                    });
                }
            }
            (EntityKind::Weapon(weapon), kind) => {
                let lands = side == Side::Top && !matches!(kind, EntityKind::Player(_));
                if lands && weapon.land() {
                    self.body.speed.x = 0.0;
                    events.push(WeaponEvent {
                        weapon: self.id,
                        player: None,
                        state: WeaponState::Available,
                    });
                }
            }
            _ => {}
        }
    }
}
