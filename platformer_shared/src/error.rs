//! Core error types.
//!
//! Only invalid-argument conditions surface as errors; zero-direction inputs
//! to `rotate`/`look_at` are silent no-ops and never reach this type.

use crate::entity::EntityId;

/// Errors raised synchronously by core operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// An atlas slice index outside `0..total`.
    #[error("invalid slice {slice} for {total} slices")]
    InvalidSlice { slice: u32, total: u32 },
    /// Aiming requires a non-zero direction.
    #[error("aim direction must be non-zero")]
    ZeroAimDirection,
    #[error("no entity with id {0:?}")]
    UnknownEntity(EntityId),
    #[error("entity {0:?} is not a player")]
    NotAPlayer(EntityId),
    #[error("entity {0:?} is not a weapon")]
    NotAWeapon(EntityId),
}

pub type CoreResult<T> = Result<T, CoreError>;
