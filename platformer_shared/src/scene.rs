//! Scene and frame update.
//!
//! The scene owns every entity, grouped by kind and then by creation order,
//! so iteration (and with it collision tie-breaking) is deterministic.
//!
//! One `update` call advances one rendered frame:
//! 1. physics substeps,
//! 2. reap destroyed entities,
//! 3. carried weapons follow their players (aim, trigger, ammo, position),
//! 4. `animate` every entity once,
//! 5. resolve weapon drops,
//! 6. refresh widgets from their anchors,
//! 7. resolve shot traces and age effects.
//!
//! Input (`set_player_state`, `aim_at`, `shoot`) is buffered on the player and
//! read by the next `update`.

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::{
    collider::HasCollision,
    config::{GameConfig, PlayerTuning},
    effects::{EffectRegistry, IMPACT, SHOT_TRACE},
    entity::{Body, Entity, EntityId, EntityKind, FrameContext, HasBehavior, KindTag},
    error::{CoreError, CoreResult},
    event::{DamageEvent, EventBus, ShotEvent, WeaponEvent},
    math::{Mat4, Vec3},
    physics::{pair_mut, PhysicsBackend, SubstepPhysics},
    player::{Player, PlayerState},
    resources::{Handle, SpriteSheet},
    transform::HasTransform,
    weapon::{ShotTrace, WeaponState},
};

/// Reach of melee weapons.
pub const MELEE_RANGE: f32 = 1.5;

/// What happened during one `update`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub substeps: usize,
    pub reaped: usize,
    pub shots: usize,
}

/// One sprite to draw.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub entity: EntityId,
    pub kind: KindTag,
    pub model: Mat4,
    pub uv: Mat4,
    pub sprite: Option<Handle<SpriteSheet>>,
    /// Text overlay for widgets.
    pub label: Option<String>,
}

pub struct Scene {
    entities: Vec<Entity>,
    next_id: u64,
    pub events: EventBus,
    pub effects: EffectRegistry,
    physics: Box<dyn PhysicsBackend>,
    rng: StdRng,
    tuning: PlayerTuning,
    shot_range: f32,
    max_frame_time: f32,
    elapsed: f32,
    frame: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

impl Scene {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            entities: Vec::new(),
            next_id: 0,
            events: EventBus::default(),
            effects: EffectRegistry::with_defaults(),
            physics: Box::new(SubstepPhysics::new(cfg.physics())),
            rng: StdRng::seed_from_u64(cfg.seed),
            tuning: cfg.player.clone(),
            shot_range: cfg.shot_range,
            max_frame_time: cfg.max_frame_time,
            elapsed: 0.0,
            frame: 0,
        }
    }

    /// Replaces the physics stepper.
    pub fn with_physics(mut self, physics: Box<dyn PhysicsBackend>) -> Self {
        self.physics = physics;
        self
    }

    /// Adds an entity and returns its id.
    pub fn spawn(&mut self, name: impl Into<String>, body: Body, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let entity = Entity::new(id, name, body, kind);
        let key = entity.order_key();
        let at = self.entities.partition_point(|e| e.order_key() < key);
        debug!(entity = ?id, name = %entity.name, kind = ?key.0, "spawn");
        self.entities.insert(at, entity);
        id
    }

    /// Entities in update order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    /// First entity with the given name.
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn players(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.tag() == KindTag::Player)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn tuning(&self) -> &PlayerTuning {
        &self.tuning
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id() == id)
    }

    fn player_mut(&mut self, id: EntityId) -> CoreResult<&mut Player> {
        self.get_mut(id)
            .ok_or(CoreError::UnknownEntity(id))?
            .as_player_mut()
            .ok_or(CoreError::NotAPlayer(id))
    }

    /// Buffers the input state of a player for the next frame.
    pub fn set_player_state(&mut self, id: EntityId, state: PlayerState) -> CoreResult<()> {
        self.player_mut(id)?.set_state(state);
        Ok(())
    }

    pub fn aim_at(&mut self, id: EntityId, direction: Vec3) -> CoreResult<()> {
        self.player_mut(id)?.aim_at(direction)
    }

    pub fn shoot(&mut self, id: EntityId) -> CoreResult<()> {
        self.player_mut(id)?.shoot();
        Ok(())
    }

    /// Puts `weapon` in the hands of `player`. Returns false when either side
    /// is not free (player already armed, weapon not available).
    pub fn equip(&mut self, player: EntityId, weapon: EntityId) -> CoreResult<bool> {
        let pi = self.index_of(player).ok_or(CoreError::UnknownEntity(player))?;
        let wi = self.index_of(weapon).ok_or(CoreError::UnknownEntity(weapon))?;
        if pi == wi {
            return Err(CoreError::NotAWeapon(weapon));
        }
        let (pe, we) = pair_mut(&mut self.entities, pi, wi);
        let p = pe.as_player_mut().ok_or(CoreError::NotAPlayer(player))?;
        let w = we.as_weapon_mut().ok_or(CoreError::NotAWeapon(weapon))?;
        if p.weapon().is_some() || !w.pick(player) {
            return Ok(false);
        }
        p.hold(weapon);
        we.body.speed = Vec3::ZERO;
        self.events.push(WeaponEvent {
            weapon,
            player: Some(player),
            state: WeaponState::Picked,
        });
        self.carry_weapons();
        Ok(true)
    }

    /// Advances the scene by one rendered frame.
    pub fn update(&mut self, frame_time: f32) -> FrameStats {
        let dt = frame_time.min(self.max_frame_time).max(0.0);
        if dt < frame_time {
            debug!(frame_time, clamped = dt, "long frame clamped");
        }

        let substeps = self.physics.step(&mut self.entities, &mut self.events, dt);
        let reaped = self.reap();
        self.carry_weapons();

        let mut shots = Vec::new();
        {
            let mut ctx = FrameContext {
                dt,
                tuning: &self.tuning,
                rng: &mut self.rng,
                shots: &mut shots,
            };
            for e in &mut self.entities {
                e.animate(&mut ctx);
            }
        }

        self.resolve_drops();
        self.refresh_widgets();
        let fired = shots.len();
        for shot in shots {
            self.resolve_shot(shot);
        }
        self.effects.tick(dt);

        self.elapsed += dt;
        self.frame += 1;
        trace!(frame = self.frame, substeps, reaped, shots = fired, "frame");
        FrameStats {
            substeps,
            reaped,
            shots: fired,
        }
    }

    fn reap(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| {
            if e.body.is_destroyed() {
                debug!(entity = ?e.id(), name = %e.name, "reaped");
                false
            } else {
                true
            }
        });
        before - self.entities.len()
    }

    /// (player index, weapon index) for every weapon currently carried.
    fn carried_pairs(&self) -> Vec<(usize, usize)> {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(pi, e)| {
                let wid = e.as_player()?.weapon()?;
                let wi = self.index_of(wid)?;
                let carried_by_e = self.entities[wi].as_weapon()?.carrier() == Some(e.id());
                carried_by_e.then_some((pi, wi))
            })
            .collect()
    }

    fn carry_weapons(&mut self) {
        for (pi, wi) in self.carried_pairs() {
            let (pe, we) = pair_mut(&mut self.entities, pi, wi);
            let hand = pe.body.transform.position() + mirror(pe.body.origin, facing_of(pe));
            let (Some(player), Some(weapon)) = (pe.as_player_mut(), we.as_weapon_mut()) else {
                continue;
            };

            weapon.set_aim(player.aim());
            if player.trigger_pulled() {
                weapon.fire();
            }
            let missing = weapon.missing_ammo();
            if missing > 0 {
                let rounds = player.draw_ammo(weapon.stats.slot, missing);
                if rounds > 0 {
                    weapon.reload(rounds);
                    debug!(weapon = ?we.id(), rounds, "reloaded from reserve");
                }
            }
            we.body.transform.set_position(hand);
        }
    }

    fn resolve_drops(&mut self) {
        let throw = self.tuning.throw_speed;
        for pi in 0..self.entities.len() {
            let pe = &mut self.entities[pi];
            let pid = pe.id();
            let Some(player) = pe.as_player_mut() else {
                continue;
            };
            let Some(wid) = player.take_drop_request() else {
                continue;
            };
            let facing = player.facing();
            let hand = pe.body.transform.position() + mirror(pe.body.origin, facing);

            let Some(wi) = self.index_of(wid) else {
                warn!(player = ?pid, weapon = ?wid, "dropped weapon is gone");
                continue;
            };
            let we = &mut self.entities[wi];
            let thrown = we.as_weapon_mut().is_some_and(|w| w.throw());
            if !thrown {
                continue;
            }
            we.body.speed = mirror(throw, facing);
            we.body.transform.set_position(hand);
            info!(player = ?pid, weapon = ?wid, "weapon thrown");
            self.events.push(WeaponEvent {
                weapon: wid,
                player: Some(pid),
                state: WeaponState::Thrown,
            });
        }
    }

    fn refresh_widgets(&mut self) {
        let mut updates = Vec::new();
        for (i, e) in self.entities.iter().enumerate() {
            let EntityKind::Widget(widget) = &e.kind else {
                continue;
            };
            let anchor = widget.anchor.and_then(|id| self.get(id));
            let update = anchor.map(|a| {
                let label = match a.as_player() {
                    Some(p) => format!(
                        "HP {:.0}/{:.0} AR {:.0}",
                        p.stats.health, p.stats.max_health, p.stats.armor
                    ),
                    None => a.name.clone(),
                };
                (a.body.transform.position() + widget.offset, label)
            });
            updates.push((i, update));
        }

        for (i, update) in updates {
            let e = &mut self.entities[i];
            match update {
                Some((position, label)) => {
                    e.body.transform.set_position(position);
                    if let EntityKind::Widget(w) = &mut e.kind {
                        w.label = label;
                    }
                }
                None => e.body.set_visible(false),
            }
        }
    }

    fn resolve_shot(&mut self, shot: ShotTrace) {
        let range = if shot.melee { MELEE_RANGE } else { self.shot_range };

        let mut best: Option<(f32, usize)> = None;
        for (i, e) in self.entities.iter().enumerate() {
            if !e.participates() || e.id() == shot.weapon || Some(e.id()) == shot.carrier {
                continue;
            }
            if matches!(e.tag(), KindTag::Weapon | KindTag::Pack) {
                continue;
            }
            if let Some(t) = e.world_box().ray_hit(shot.origin, shot.direction, range) {
                if best.map_or(true, |(bt, _)| t < bt) {
                    best = Some((t, i));
                }
            }
        }

        let end = shot.origin + shot.direction * best.map_or(range, |(t, _)| t);
        let mut hit = None;
        if let Some((_, i)) = best {
            let target = &mut self.entities[i];
            let tid = target.id();
            hit = Some(tid);
            if let Some(p) = target.as_player_mut() {
                let health = p.take_damage(shot.damage);
                info!(target = ?tid, damage = shot.damage, health, "player hit");
                if p.is_dead() {
                    info!(target = ?tid, "player down");
                }
                self.events.push(DamageEvent {
                    target: tid,
                    amount: shot.damage,
                    health,
                });
            }
            self.effects.spawn(IMPACT, end, end);
        }
        self.effects.spawn(SHOT_TRACE, shot.origin, end);
        self.events.push(ShotEvent {
            weapon: shot.weapon,
            origin: shot.origin,
            end,
            hit,
        });
    }

    /// Sprites to draw this frame, in storage order.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        self.entities
            .iter()
            .filter(|e| e.body.is_visible() && !e.body.is_destroyed())
            .map(|e| DrawItem {
                entity: e.id(),
                kind: e.tag(),
                model: e.transform().model_matrix(),
                uv: e.transform().uv_matrix(),
                sprite: e.sprite,
                label: match &e.kind {
                    EntityKind::Widget(w) => Some(w.label.clone()),
                    _ => None,
                },
            })
            .collect()
    }
}

fn facing_of(e: &Entity) -> f32 {
    e.as_player().map_or(1.0, Player::facing)
}

/// Mirrors the x component for left-facing owners.
fn mirror(v: Vec3, facing: f32) -> Vec3 {
    Vec3::new(v.x * facing, v.y, v.z)
}
