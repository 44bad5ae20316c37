//! `platformer_shared`
//!
//! Simulation core of a 2D side-scroller: transforms, colliders, entities and
//! the fixed-substep frame update, plus the level loader and the rendering
//! seam used by the client.
//!
//! Design goals:
//! - Deterministic iteration and seeded randomness, so frames replay exactly.
//! - Entities as a closed sum type; no runtime type inspection.
//! - Caches and configuration are owned values passed in, never globals.
//! - No `unsafe`.

pub mod camera;
pub mod collider;
pub mod config;
pub mod effects;
pub mod entity;
pub mod error;
pub mod event;
pub mod level;
pub mod math;
pub mod pack;
pub mod physics;
pub mod player;
pub mod render;
pub mod resources;
pub mod scene;
pub mod transform;
pub mod weapon;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::camera::Camera;
    pub use crate::collider::{Collider, HasCollision, Side};
    pub use crate::config::*;
    pub use crate::entity::*;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::event::*;
    pub use crate::math::*;
    pub use crate::pack::{Pack, Payload};
    pub use crate::player::{Player, PlayerState, PlayerStats};
    pub use crate::scene::{DrawItem, FrameStats, Scene};
    pub use crate::transform::{HasTransform, TransformState};
    pub use crate::weapon::{Slot, Weapon, WeaponState, WeaponStats};
}
