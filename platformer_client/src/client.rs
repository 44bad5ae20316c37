//! Client implementation.
//!
//! The client owns one session:
//! - the scene and the resource caches its level was built with,
//! - the camera, moved onto the player after every update,
//! - a render backend that receives the finished frame,
//! - a tally of gameplay events drained after each frame.
//!
//! Each frame runs update-then-render; nothing reads the scene while it is
//! being updated.

use std::path::PathBuf;

use anyhow::Context;
use platformer_shared::{
    camera::Camera,
    config::GameConfig,
    entity::EntityId,
    event::{CollisionEvent, DamageEvent, PickupEvent, ShotEvent, WeaponEvent},
    level::{spawn_level, LevelDef, SpawnReport},
    render::{render_scene, RenderBackend},
    resources::Resources,
    scene::{FrameStats, Scene},
    transform::HasTransform,
    weapon::WeaponState,
};
use tracing::{debug, info, warn};

use crate::input::InputState;

/// Gameplay events seen since the level was loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    pub contacts: u64,
    pub pickups: u64,
    pub weapon_picks: u64,
    pub weapon_throws: u64,
    pub shots: u64,
    pub hits: u64,
}

/// High-level game client.
pub struct GameClient<R: RenderBackend> {
    pub cfg: GameConfig,
    pub scene: Scene,
    pub camera: Camera,
    pub resources: Resources,
    pub renderer: R,
    pub tally: EventTally,
    player: Option<EntityId>,
    level: Option<String>,
    frames: u64,
}

impl<R: RenderBackend> GameClient<R> {
    pub fn new(cfg: GameConfig, renderer: R) -> Self {
        Self {
            scene: Scene::new(&cfg),
            camera: Camera::new(cfg.view),
            resources: Resources::default(),
            renderer,
            tally: EventTally::default(),
            player: None,
            level: None,
            frames: 0,
            cfg,
        }
    }

    /// Loads `<levels_dir>/<name>.json` into a fresh scene.
    pub fn load_level(&mut self, name: &str) -> anyhow::Result<SpawnReport> {
        let path = LevelDef::path_for(PathBuf::from(&self.cfg.levels_dir), name);
        info!(level = %name, path = %path.display(), "Loading level");
        let level = LevelDef::load(&path).with_context(|| format!("load level {name}"))?;
        Ok(self.start_level(&level))
    }

    /// Replaces the session with one built from `level`.
    pub fn start_level(&mut self, level: &LevelDef) -> SpawnReport {
        self.scene = Scene::new(&self.cfg);
        self.resources = Resources::default();
        self.tally = EventTally::default();
        self.frames = 0;

        let report = spawn_level(&mut self.scene, level, &mut self.resources.sprites);
        self.player = report.player;
        if self.player.is_none() {
            warn!(level = %level.name, "level has no player, input is ignored");
        }
        self.level = Some(level.name.clone());
        self.follow_player();
        info!(
            level = %level.name,
            entities = self.scene.len(),
            player = ?self.player,
            "Level ready"
        );
        report
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Buffers `input`, updates the scene, moves the camera and renders.
    pub fn frame(&mut self, input: &InputState, frame_time: f32) -> FrameStats {
        self.apply_input(input);
        let stats = self.scene.update(frame_time);
        self.follow_player();
        render_scene(&mut self.renderer, &self.scene, &self.camera);
        self.drain_events();
        self.frames += 1;
        stats
    }

    fn apply_input(&mut self, input: &InputState) {
        let Some(id) = self.player else {
            return;
        };
        let mut result = self.scene.set_player_state(id, input.player_state());
        if let (true, Some(aim)) = (result.is_ok(), input.aim) {
            result = self.scene.aim_at(id, aim);
        }
        if result.is_ok() && input.fire {
            result = self.scene.shoot(id);
        }
        if let Err(err) = result {
            warn!(player = ?id, %err, "input rejected");
        }
    }

    fn follow_player(&mut self) {
        let target = self
            .player
            .and_then(|id| self.scene.get(id))
            .map(|p| p.position());
        if let Some(target) = target {
            self.camera.follow(target);
        }
    }

    fn drain_events(&mut self) {
        let events = &mut self.scene.events;
        self.tally.contacts += events.drain::<CollisionEvent>().len() as u64;

        for e in events.drain::<PickupEvent>() {
            info!(player = ?e.player, payload = ?e.payload, value = e.value, "Pickup");
            self.tally.pickups += 1;
        }
        for e in events.drain::<WeaponEvent>() {
            debug!(weapon = ?e.weapon, player = ?e.player, state = ?e.state, "Weapon state");
            match e.state {
                WeaponState::Picked => self.tally.weapon_picks += 1,
                WeaponState::Thrown => self.tally.weapon_throws += 1,
                WeaponState::Available => {}
            }
        }
        for e in events.drain::<ShotEvent>() {
            self.tally.shots += 1;
            if e.hit.is_some() {
                self.tally.hits += 1;
            }
        }
        for e in events.drain::<DamageEvent>() {
            info!(target = ?e.target, amount = e.amount, health = e.health, "Damage");
        }
    }

    /// Human-readable session summary.
    pub fn status(&self) -> Vec<String> {
        let mut out = Vec::new();
        out.push(format!("Level: {}", self.level.as_deref().unwrap_or("-")));
        out.push(format!("Frames: {}", self.frames));
        out.push(format!("Simulated: {:.2}s", self.scene.elapsed()));
        out.push(format!("Entities: {}", self.scene.len()));
        if let Some(p) = self.player.and_then(|id| self.scene.get(id)) {
            let pos = p.position();
            out.push(format!("Player: ({:.2}, {:.2})", pos.x, pos.y));
            if let Some(player) = p.as_player() {
                out.push(format!(
                    "Health: {:.0}/{:.0}  Armor: {:.0}",
                    player.stats.health, player.stats.max_health, player.stats.armor
                ));
                out.push(format!("Weapon: {}", player.weapon().map_or("none".to_string(), |w| format!("{w:?}"))));
            }
        }
        out.push(format!(
            "Events: {} pickups, {} shots ({} hits), {} picks, {} throws",
            self.tally.pickups, self.tally.shots, self.tally.hits, self.tally.weapon_picks, self.tally.weapon_throws
        ));
        out
    }
}
