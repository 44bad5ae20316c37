//! Shared fixtures for the integration tests.

use platformer_shared::prelude::*;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// Solid floor whose top surface sits at y = 0.
pub fn floor(scene: &mut Scene, center_x: f32, width: f32) -> EntityId {
    scene.spawn(
        "floor",
        Body::new(
            TransformState::at(Vec3::new(center_x, -0.5, 0.0), Vec3::new(width, 1.0, 1.0)),
            Collider::default(),
            Surface::Solid.default_flags(),
        ),
        EntityKind::Generic(Surface::Solid),
    )
}

/// Player standing at `(x, y)` with a 1 x 1.8 collider above its feet.
pub fn player(scene: &mut Scene, x: f32, y: f32, stats: PlayerStats) -> EntityId {
    let mut body = Body::new(
        TransformState::at(Vec3::new(x, y, 0.0), Vec3::new(1.0, 1.0, 1.0)),
        Collider::from_bounds(-0.5, 0.5, 0.0, 1.8),
        EntityFlags::default(),
    );
    body.origin = Vec3::new(0.4, 1.0, 0.0);
    scene.spawn("player", body, EntityKind::Player(Player::new(stats)))
}

pub fn weapon(scene: &mut Scene, x: f32, y: f32, stats: WeaponStats) -> EntityId {
    let mut body = Body::new(
        TransformState::at(Vec3::new(x, y, 0.0), Vec3::new(1.0, 1.0, 1.0)),
        Collider::from_bounds(-0.3, 0.3, 0.0, 0.3),
        EntityFlags::default(),
    );
    body.origin = Vec3::new(0.5, 0.1, 0.0);
    scene.spawn("weapon", body, EntityKind::Weapon(Weapon::new(stats)))
}

pub fn health_of(scene: &Scene, id: EntityId) -> Option<f32> {
    scene.get(id).and_then(Entity::as_player).map(|p| p.stats.health)
}

pub fn position_of(scene: &Scene, id: EntityId) -> Option<Vec3> {
    scene.get(id).map(|e| e.body.transform.position())
}
