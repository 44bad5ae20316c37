//! Frame-loop scenarios run through the full scene update.

use platformer_shared::prelude::*;
use platformer_tests::{floor, health_of, init_tracing, player, position_of, weapon};

const FRAME: f32 = 0.016;

fn scene() -> Scene {
    Scene::new(&GameConfig::default())
}

#[test]
fn falling_body_comes_to_rest_on_floor() -> anyhow::Result<()> {
    init_tracing();
    let mut scene = scene();
    floor(&mut scene, 0.0, 4.0);
    let body = scene.spawn(
        "crate",
        Body::new(
            TransformState::at(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            Collider::from_bounds(-0.5, 0.5, 0.0, 1.0),
            EntityFlags::COLLIDABLE | EntityFlags::VISIBLE,
        ),
        EntityKind::Generic(Surface::Solid),
    );

    for _ in 0..90 {
        scene.update(FRAME);
    }

    let e = scene.get(body).ok_or_else(|| anyhow::anyhow!("crate vanished"))?;
    assert_eq!(e.body.speed.y, 0.0);
    let y = e.body.transform.position().y;
    assert!(y.abs() < 0.03, "resting height {y}");

    // Stays put.
    for _ in 0..30 {
        scene.update(FRAME);
    }
    let after = position_of(&scene, body).ok_or_else(|| anyhow::anyhow!("crate vanished"))?;
    assert!((after.y - y).abs() < 1e-6);
    Ok(())
}

#[test]
fn walking_approaches_but_never_exceeds_max_speed() -> anyhow::Result<()> {
    init_tracing();
    let mut scene = scene();
    floor(&mut scene, 0.0, 200.0);
    let hero = player(&mut scene, 0.0, 0.0, PlayerStats::default());

    let frames = (1.0 / FRAME).ceil() as usize;
    let mut speed = 0.0;
    for _ in 0..frames {
        scene.set_player_state(hero, PlayerState::RIGHT_STEP)?;
        scene.update(FRAME);
        speed = scene.get(hero).map_or(0.0, |e| e.body.speed.x);
        assert!(speed <= 8.0, "overshoot {speed}");
    }
    assert!(speed > 7.9);
    assert_eq!(scene.get(hero).map(|e| e.body.speed.y), Some(0.0));
    Ok(())
}

#[test]
fn health_pack_is_consumed_once() -> anyhow::Result<()> {
    init_tracing();
    let mut scene = scene();
    floor(&mut scene, 0.0, 20.0);
    let wounded = PlayerStats {
        health: 80.0,
        ..PlayerStats::default()
    };
    let first = player(&mut scene, 0.0, 0.0, wounded);
    let second = player(
        &mut scene,
        0.0,
        0.0,
        PlayerStats {
            health: 50.0,
            ..PlayerStats::default()
        },
    );
    let pack = scene.spawn(
        "medkit",
        Body::new(
            TransformState::at(Vec3::new(0.0, 0.5, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            Collider::from_bounds(-0.5, 0.5, 0.0, 1.8),
            EntityFlags::COLLIDABLE | EntityFlags::VISIBLE | EntityFlags::PASSIVE,
        ),
        EntityKind::Pack(Pack::new(Payload::Health, 25.0)),
    );

    let stats = scene.update(FRAME);
    assert_eq!(stats.reaped, 1);
    assert!(scene.get(pack).is_none());
    assert_eq!(health_of(&scene, first), Some(100.0));
    assert_eq!(health_of(&scene, second), Some(50.0));

    let pickups = scene.events.drain::<PickupEvent>();
    assert_eq!(pickups.len(), 1);
    assert_eq!(pickups[0].player, first);
    assert_eq!(pickups[0].payload, Payload::Health);

    scene.update(FRAME);
    assert!(scene.events.drain::<PickupEvent>().is_empty());
    Ok(())
}

#[test]
fn unclaimed_pickups_never_block_a_walking_player() -> anyhow::Result<()> {
    init_tracing();
    let mut scene = scene();
    floor(&mut scene, 0.0, 40.0);
    let hero = player(&mut scene, 0.0, 0.0, PlayerStats::default());
    let sidearm = weapon(&mut scene, 0.0, 0.0, WeaponStats::new(Slot::Secondary, 10, 10));
    assert!(scene.equip(hero, sidearm)?);

    // Full health keeps the pack in place; the armed player leaves the rifle.
    let pack = scene.spawn(
        "medkit",
        Body::new(
            TransformState::at(Vec3::new(2.5, 0.5, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            Collider::from_bounds(-0.5, 0.5, 0.0, 1.8),
            EntityFlags::COLLIDABLE | EntityFlags::VISIBLE | EntityFlags::PASSIVE,
        ),
        EntityKind::Pack(Pack::new(Payload::Health, 25.0)),
    );
    let rifle = weapon(&mut scene, 4.5, 0.0, WeaponStats::new(Slot::Primary, 10, 10));

    let mut contacts = Vec::new();
    let mut prev = 0.0;
    for _ in 0..60 {
        scene.set_player_state(hero, PlayerState::RIGHT_STEP)?;
        scene.update(FRAME);
        contacts.extend(scene.events.drain::<CollisionEvent>());
        let speed = scene.get(hero).map_or(0.0, |e| e.body.speed.x);
        assert!(speed >= prev, "slowed from {prev} to {speed}");
        prev = speed;
    }

    assert!(contacts.iter().any(|c| c.subject == hero && c.other == pack));
    assert!(contacts.iter().any(|c| c.subject == rifle && c.other == hero));
    let x = position_of(&scene, hero).map_or(f32::NAN, |p| p.x);
    assert!(x > 5.5, "stopped at {x}");
    assert!(scene.get(pack).is_some());
    assert_eq!(health_of(&scene, hero), Some(100.0));
    let state = scene.get(rifle).and_then(Entity::as_weapon).map(Weapon::state);
    assert_eq!(state, Some(WeaponState::Available));
    Ok(())
}

#[test]
fn passive_and_non_collidable_bodies_never_fall() -> anyhow::Result<()> {
    init_tracing();
    let mut scene = scene();
    floor(&mut scene, 0.0, 20.0);
    let ghost = scene.spawn(
        "ghost",
        Body::new(
            TransformState::at(Vec3::new(3.0, 5.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            Collider::default(),
            EntityFlags::VISIBLE,
        ),
        EntityKind::Generic(Surface::Passable),
    );
    let ledge = scene.spawn(
        "ledge",
        Body::new(
            TransformState::at(Vec3::new(6.0, 5.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            Collider::default(),
            EntityFlags::COLLIDABLE | EntityFlags::PASSIVE,
        ),
        EntityKind::Generic(Surface::Clip),
    );
    // Something that does fall, landing on the ledge.
    let falling = scene.spawn(
        "falling",
        Body::new(
            TransformState::at(Vec3::new(6.0, 8.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            Collider::from_bounds(-0.3, 0.3, 0.0, 1.0),
            EntityFlags::default(),
        ),
        EntityKind::Generic(Surface::Solid),
    );

    for _ in 0..60 {
        scene.update(FRAME);
    }

    assert_eq!(position_of(&scene, ghost), Some(Vec3::new(3.0, 5.0, 0.0)));
    assert_eq!(position_of(&scene, ledge), Some(Vec3::new(6.0, 5.0, 0.0)));
    assert_eq!(scene.get(ghost).map(|e| e.body.speed), Some(Vec3::ZERO));
    assert_eq!(scene.get(ledge).map(|e| e.body.speed), Some(Vec3::ZERO));
    let y = position_of(&scene, falling).map_or(f32::NAN, |p| p.y);
    assert!((y - 5.5).abs() < 0.03, "landed at {y}");
    Ok(())
}

#[test]
fn carried_weapon_takes_part_in_no_collision_checks() -> anyhow::Result<()> {
    init_tracing();
    let mut scene = scene();
    floor(&mut scene, 0.0, 20.0);
    let hero = player(&mut scene, 0.0, 0.0, PlayerStats::default());
    let carried = weapon(&mut scene, 0.0, 0.0, WeaponStats::new(Slot::Primary, 10, 10));
    let loose = weapon(&mut scene, 5.0, 0.0, WeaponStats::new(Slot::Primary, 10, 10));
    assert!(scene.equip(hero, carried)?);

    let mut contacts = Vec::new();
    for _ in 0..30 {
        scene.update(FRAME);
        contacts.extend(scene.events.drain::<CollisionEvent>());
    }

    assert!(contacts.iter().all(|c| c.subject != carried && c.other != carried));
    assert!(contacts.iter().any(|c| c.subject == loose));
    assert_eq!(scene.get(carried).map(|e| e.body.speed), Some(Vec3::ZERO));
    Ok(())
}

#[test]
fn drop_throws_once_per_press() -> anyhow::Result<()> {
    init_tracing();
    let mut scene = scene();
    floor(&mut scene, 0.0, 40.0);
    let hero = player(&mut scene, 0.0, 0.0, PlayerStats::default());
    let gun = weapon(&mut scene, 0.0, 0.0, WeaponStats::new(Slot::Primary, 10, 10));
    scene.equip(hero, gun)?;
    scene.events.clear();

    let thrown = |scene: &mut Scene| {
        scene
            .events
            .drain::<WeaponEvent>()
            .iter()
            .filter(|e| e.weapon == gun && e.state == WeaponState::Thrown)
            .count()
    };

    let mut throws = 0;
    for _ in 0..40 {
        scene.set_player_state(hero, PlayerState::DROP_WEAPON)?;
        scene.update(FRAME);
        throws += thrown(&mut scene);
    }
    assert_eq!(throws, 1);
    let hero_weapon = scene.get(hero).and_then(Entity::as_player).and_then(Player::weapon);
    assert_eq!(hero_weapon, None);
    let state = scene.get(gun).and_then(Entity::as_weapon).map(Weapon::state);
    assert_eq!(state, Some(WeaponState::Available));

    // Release, re-arm, press again.
    scene.update(FRAME);
    assert!(scene.equip(hero, gun)?);
    scene.set_player_state(hero, PlayerState::DROP_WEAPON)?;
    scene.update(FRAME);
    assert_eq!(thrown(&mut scene), 1);
    Ok(())
}

#[test]
fn transform_basis_survives_rotation_round_trip() -> anyhow::Result<()> {
    let mut t = TransformState::new();
    let axis = Vec3::new(0.3, 1.0, -0.4);
    for degrees in [15.0, 90.0, 137.0, -60.0] {
        let before = (t.right(), t.up(), t.target());
        t.rotate(axis, degrees);
        t.rotate(axis, -degrees);
        assert!(t.right().approx_eq(before.0, 1e-4));
        assert!(t.up().approx_eq(before.1, 1e-4));
        assert!(t.target().approx_eq(before.2, 1e-4));
    }

    let rotation = t.rotation_matrix();
    t.rotate(Vec3::ZERO, 45.0);
    assert_eq!(t.rotation_matrix(), rotation);

    assert!(t.shear_x(3, 3).is_err());
    t.shear_x(1, 4)?;
    let (u0, u1) = t.uv_band_x();
    assert!((u0 - 0.25).abs() < 1e-6 && (u1 - 0.5).abs() < 1e-6);
    Ok(())
}
