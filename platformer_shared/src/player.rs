//! Player behavior.
//!
//! Input arrives as a `PlayerState` bitmask set once per frame by the input
//! collaborator. `animate` consumes it and resets it to `IDLE`.
//!
//! A player counts as grounded when its vertical speed is exactly zero; the
//! collision pass zeroes it on contact with a floor.

use serde::{Deserialize, Serialize};

use crate::{
    entity::{Body, EntityId, FrameContext},
    error::{CoreError, CoreResult},
    math::Vec3,
    pack::{Pack, Payload},
    weapon::Slot,
};

bitflags::bitflags! {
    /// Per-frame input state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PlayerState: u8 {
        const IDLE = 0;
        const LEFT_STEP = 1 << 0;
        const RIGHT_STEP = 1 << 1;
        const JUMP = 1 << 2;
        const DROP_WEAPON = 1 << 3;
    }
}

/// Share of incoming damage soaked by armor.
const ARMOR_ABSORPTION: f32 = 0.5;

/// Loader-provided player parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub max_move_speed: f32,
    pub max_jump_speed: f32,
    pub max_jump_time: f32,
    pub max_health: f32,
    pub max_armor: f32,
    pub health: f32,
    pub armor: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            max_move_speed: 8.0,
            max_jump_speed: 12.0,
            max_jump_time: 0.25,
            max_health: 100.0,
            max_armor: 100.0,
            health: 100.0,
            armor: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub stats: PlayerStats,
    state: PlayerState,
    prev_state: PlayerState,
    jump_time: f32,
    since_drop: f32,
    aim: Vec3,
    trigger: bool,
    weapon: Option<EntityId>,
    drop_requested: bool,
    primary_ammo: u32,
    secondary_ammo: u32,
}

impl Player {
    pub fn new(stats: PlayerStats) -> Self {
        Self {
            stats,
            state: PlayerState::IDLE,
            prev_state: PlayerState::IDLE,
            jump_time: 0.0,
            since_drop: f32::MAX,
            aim: Vec3::UNIT_X,
            trigger: false,
            weapon: None,
            drop_requested: false,
            primary_ammo: 0,
            secondary_ammo: 0,
        }
    }

    /// Buffers this frame's input; read by the next `animate`.
    ///
    /// A step against the current facing turns the player right away, so a
    /// carried weapon aims the new way in the same frame.
    pub fn set_state(&mut self, state: PlayerState) {
        self.state = state;
        let step = step_of(state);
        if step != 0.0 && step != self.facing() {
            self.aim.x = -self.aim.x;
            if self.aim.x == 0.0 {
                self.aim = Vec3::new(step, 0.0, 0.0);
            }
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Points the player (and its weapon) at `direction`.
    pub fn aim_at(&mut self, direction: Vec3) -> CoreResult<()> {
        if direction.len_sq() == 0.0 {
            return Err(CoreError::ZeroAimDirection);
        }
        self.aim = direction.normalize();
        Ok(())
    }

    pub fn aim(&self) -> Vec3 {
        self.aim
    }

    /// +1 facing right, -1 facing left.
    pub fn facing(&self) -> f32 {
        if self.aim.x < 0.0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Requests a shot from the carried weapon this frame.
    pub fn shoot(&mut self) {
        self.trigger = true;
    }

    pub fn trigger_pulled(&self) -> bool {
        self.trigger
    }

    pub fn weapon(&self) -> Option<EntityId> {
        self.weapon
    }

    pub fn hold(&mut self, weapon: EntityId) {
        self.weapon = Some(weapon);
    }

    /// Releases the carried weapon if a drop was requested this frame.
    pub fn take_drop_request(&mut self) -> Option<EntityId> {
        if !std::mem::take(&mut self.drop_requested) {
            return None;
        }
        self.weapon.take()
    }

    pub fn is_dead(&self) -> bool {
        self.stats.health <= 0.0
    }

    pub fn ammo_reserve(&self, slot: Slot) -> u32 {
        match slot {
            Slot::Primary => self.primary_ammo,
            Slot::Secondary => self.secondary_ammo,
            Slot::Melee => 0,
        }
    }

    /// Removes up to `wanted` rounds from the reserve of `slot`.
    pub fn draw_ammo(&mut self, slot: Slot, wanted: u32) -> u32 {
        let reserve = match slot {
            Slot::Primary => &mut self.primary_ammo,
            Slot::Secondary => &mut self.secondary_ammo,
            Slot::Melee => return 0,
        };
        let taken = wanted.min(*reserve);
        *reserve -= taken;
        taken
    }

    /// Applies a pack. Returns false when the pack would change nothing, in
    /// which case it stays in the level.
    pub fn consume(&mut self, pack: &Pack) -> bool {
        let value = pack.value.max(0.0);
        match pack.payload {
            Payload::Health => {
                if self.stats.health >= self.stats.max_health {
                    return false;
                }
                self.stats.health = (self.stats.health + value).min(self.stats.max_health);
            }
            Payload::Armor => {
                if self.stats.armor >= self.stats.max_armor {
                    return false;
                }
                self.stats.armor = (self.stats.armor + value).min(self.stats.max_armor);
            }
            Payload::PrimaryAmmo => self.primary_ammo += value as u32,
            Payload::SecondaryAmmo => self.secondary_ammo += value as u32,
        }
        true
    }

    /// Applies damage, armor first. Returns the remaining health.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let amount = amount.max(0.0);
        let absorbed = (amount * ARMOR_ABSORPTION).min(self.stats.armor);
        self.stats.armor -= absorbed;
        self.stats.health = (self.stats.health - (amount - absorbed)).max(0.0);
        self.stats.health
    }

    pub(crate) fn animate(&mut self, body: &mut Body, ctx: &mut FrameContext<'_>) {
        let dt = ctx.dt;
        let tuning = ctx.tuning;
        let state = self.state;
        let speed = &mut body.speed;
        let grounded = speed.y == 0.0;

        let step = step_of(state);
        if step != 0.0 {
            let max = self.stats.max_move_speed;
            let next = speed.x + step * tuning.move_accel * dt;
            speed.x = if step > 0.0 { next.min(max) } else { next.max(-max) };
        } else if grounded && speed.x != 0.0 {
            let friction = 0.5 * tuning.move_accel * dt;
            speed.x = if speed.x > 0.0 {
                (speed.x - friction).max(0.0)
            } else {
                (speed.x + friction).min(0.0)
            };
        }

        let held = state.contains(PlayerState::JUMP);
        let was_held = self.prev_state.contains(PlayerState::JUMP);
        if speed.y < 0.0 && self.jump_time > 0.0 {
            // Falling ends the jump; it can only restart from the ground.
            self.jump_time = self.stats.max_jump_time;
        }
        if grounded && !held {
            self.jump_time = 0.0;
        }
        let starts = held && !was_held && grounded && self.jump_time == 0.0;
        let continues = held && was_held && self.jump_time > 0.0;
        if (starts || continues) && self.jump_time < self.stats.max_jump_time && speed.y >= 0.0 {
            speed.y = (speed.y + tuning.jump_accel * dt).min(self.stats.max_jump_speed);
            self.jump_time += dt;
        }

        self.since_drop += dt;
        let drop_pressed = state.contains(PlayerState::DROP_WEAPON) && !self.prev_state.contains(PlayerState::DROP_WEAPON);
        if drop_pressed && self.weapon.is_some() && self.since_drop >= tuning.min_drop_time {
            self.drop_requested = true;
            self.since_drop = 0.0;
        }

        let slice = if self.facing() < 0.0 { 1 } else { 0 };
        if let Err(err) = body.transform.shear_x(slice, 2) {
            tracing::warn!(%err, "player facing slice rejected");
        }

        self.prev_state = state;
        self.state = PlayerState::IDLE;
        self.trigger = false;
    }
}

/// -1 for a left step, +1 for a right step, 0 for neither or both.
fn step_of(state: PlayerState) -> f32 {
    match (state.contains(PlayerState::LEFT_STEP), state.contains(PlayerState::RIGHT_STEP)) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PlayerTuning, transform::TransformState, collider::Collider, entity::EntityFlags};
    use rand::{rngs::StdRng, SeedableRng};

    struct Rig {
        player: Player,
        body: Body,
        tuning: PlayerTuning,
        rng: StdRng,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                player: Player::new(PlayerStats::default()),
                body: Body::new(TransformState::new(), Collider::default(), EntityFlags::default()),
                tuning: PlayerTuning::default(),
                rng: StdRng::seed_from_u64(1),
            }
        }

        fn frame(&mut self, state: PlayerState, dt: f32) {
            let mut shots = Vec::new();
            let mut ctx = FrameContext {
                dt,
                tuning: &self.tuning,
                rng: &mut self.rng,
                shots: &mut shots,
            };
            self.player.set_state(state);
            self.player.animate(&mut self.body, &mut ctx);
        }
    }

    #[test]
    fn stepping_never_overshoots_max_speed() {
        let mut rig = Rig::new();
        for _ in 0..100 {
            rig.frame(PlayerState::RIGHT_STEP, 0.016);
            assert!(rig.body.speed.x <= rig.player.stats.max_move_speed);
        }
        assert_eq!(rig.body.speed.x, 8.0);
        for _ in 0..100 {
            rig.frame(PlayerState::LEFT_STEP, 0.016);
            assert!(rig.body.speed.x >= -8.0);
        }
        assert_eq!(rig.body.speed.x, -8.0);
        assert_eq!(rig.player.facing(), -1.0);
    }

    #[test]
    fn ground_friction_is_half_rate_and_stops_at_zero() {
        let mut rig = Rig::new();
        rig.body.speed.x = 1.0;
        rig.frame(PlayerState::IDLE, 0.01);
        assert!((rig.body.speed.x - 0.8).abs() < 1e-6);
        for _ in 0..10 {
            rig.frame(PlayerState::IDLE, 0.01);
        }
        assert_eq!(rig.body.speed.x, 0.0);
    }

    #[test]
    fn no_friction_in_the_air() {
        let mut rig = Rig::new();
        rig.body.speed = Vec3::new(3.0, -2.0, 0.0);
        rig.frame(PlayerState::IDLE, 0.1);
        assert_eq!(rig.body.speed.x, 3.0);
    }

    #[test]
    fn jump_is_capped_in_time_and_speed() {
        let mut rig = Rig::new();
        rig.frame(PlayerState::JUMP, 0.016);
        assert!(rig.body.speed.y > 0.0);
        for _ in 0..60 {
            rig.frame(PlayerState::JUMP, 0.016);
            assert!(rig.body.speed.y <= rig.player.stats.max_jump_speed);
        }
        let held_speed = rig.body.speed.y;
        rig.frame(PlayerState::JUMP, 0.016);
        assert_eq!(rig.body.speed.y, held_speed);
    }

    #[test]
    fn holding_jump_through_landing_does_not_rejump() {
        let mut rig = Rig::new();
        rig.frame(PlayerState::JUMP, 0.016);
        rig.body.speed.y = -1.0;
        rig.frame(PlayerState::JUMP, 0.016);
        // Landed while still holding jump.
        rig.body.speed.y = 0.0;
        rig.frame(PlayerState::JUMP, 0.016);
        assert_eq!(rig.body.speed.y, 0.0);
        // Release, then press again.
        rig.frame(PlayerState::IDLE, 0.016);
        rig.frame(PlayerState::JUMP, 0.016);
        assert!(rig.body.speed.y > 0.0);
    }

    #[test]
    fn drop_fires_once_per_press_with_cooldown() {
        let mut rig = Rig::new();
        rig.player.hold(EntityId(7));
        rig.frame(PlayerState::DROP_WEAPON, 0.016);
        assert_eq!(rig.player.take_drop_request(), Some(EntityId(7)));

        rig.player.hold(EntityId(8));
        for _ in 0..5 {
            rig.frame(PlayerState::DROP_WEAPON, 0.016);
            assert_eq!(rig.player.take_drop_request(), None);
        }
        // Re-press before the cooldown expired.
        rig.frame(PlayerState::IDLE, 0.016);
        rig.frame(PlayerState::DROP_WEAPON, 0.016);
        assert_eq!(rig.player.take_drop_request(), None);

        for _ in 0..40 {
            rig.frame(PlayerState::IDLE, 0.016);
        }
        rig.frame(PlayerState::DROP_WEAPON, 0.016);
        assert_eq!(rig.player.take_drop_request(), Some(EntityId(8)));
    }

    #[test]
    fn stepping_turns_before_animate() {
        let mut p = Player::new(PlayerStats::default());
        p.aim_at(Vec3::new(1.0, 1.0, 0.0)).unwrap();
        p.set_state(PlayerState::LEFT_STEP);
        assert_eq!(p.facing(), -1.0);
        assert!(p.aim().y > 0.0);
        p.set_state(PlayerState::LEFT_STEP | PlayerState::RIGHT_STEP);
        assert_eq!(p.facing(), -1.0);
    }

    #[test]
    fn state_resets_after_animate() {
        let mut rig = Rig::new();
        rig.frame(PlayerState::RIGHT_STEP | PlayerState::JUMP, 0.016);
        assert_eq!(rig.player.state(), PlayerState::IDLE);
    }

    #[test]
    fn aim_rejects_zero_direction() {
        let mut p = Player::new(PlayerStats::default());
        assert_eq!(p.aim_at(Vec3::ZERO), Err(CoreError::ZeroAimDirection));
        p.aim_at(Vec3::new(-3.0, 0.0, 0.0)).unwrap();
        assert_eq!(p.aim(), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(p.facing(), -1.0);
    }

    #[test]
    fn packs_clamp_and_skip_when_full() {
        let mut stats = PlayerStats::default();
        stats.health = 80.0;
        let mut p = Player::new(stats);
        assert!(p.consume(&Pack::new(Payload::Health, 25.0)));
        assert_eq!(p.stats.health, 100.0);
        assert!(!p.consume(&Pack::new(Payload::Health, 25.0)));

        assert!(p.consume(&Pack::new(Payload::PrimaryAmmo, 30.0)));
        assert_eq!(p.draw_ammo(Slot::Primary, 50), 30);
        assert_eq!(p.ammo_reserve(Slot::Primary), 0);
    }

    #[test]
    fn armor_absorbs_half_of_damage() {
        let mut stats = PlayerStats::default();
        stats.armor = 10.0;
        let mut p = Player::new(stats);
        assert_eq!(p.take_damage(10.0), 95.0);
        assert_eq!(p.stats.armor, 5.0);
        assert_eq!(p.take_damage(20.0), 80.0);
        assert_eq!(p.stats.armor, 0.0);
        p.take_damage(500.0);
        assert!(p.is_dead());
    }
}
