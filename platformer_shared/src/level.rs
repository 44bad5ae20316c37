//! Level loader.
//!
//! Levels are JSON documents holding sprite sheets and a flat list of entity
//! records. A record is a loose key/value object; fields are read one at a
//! time so that a missing or malformed value only costs a warning and a
//! default, never the whole level. Broken JSON is a setup error.
//!
//! # Usage
//! ```ignore
//! let level = LevelDef::load("levels/demo.json")?;
//! let report = spawn_level(&mut scene, &level, &mut resources.sprites);
//! ```
//!
//! Record fields:
//! - `kind`: solid, clip, passable, player, weapon, pack or widget;
//! - `name`, `position`, `size`, `origin`, `collider` (left, right, bottom, top);
//! - `collision`, `visible`, `passive` override the kind defaults;
//! - `sprite`: sheet name or inline sheet, `tile`: UV replication;
//! - player: `max_move_speed`, `max_jump_speed`, `max_jump_time`,
//!   `max_health`, `max_armor`, `health`, `armor`;
//! - weapon: `slot`, `max_ammo`, `ammo`, `grouping_angle`, `firing_speed`,
//!   `damage`, optional `held_by`;
//! - pack: `payload`, `value`;
//! - widget: `anchor`, `offset`.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    collider::Collider,
    entity::{Body, EntityFlags, EntityId, EntityKind, Surface, Widget},
    math::Vec3,
    pack::{Pack, Payload},
    player::{Player, PlayerStats},
    resources::{Handle, ResourceCache, SpriteSheet},
    scene::Scene,
    transform::TransformState,
    weapon::{Slot, Weapon, WeaponStats},
};

/// A parsed level file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelDef {
    #[serde(default)]
    pub name: String,
    /// Named sprite sheets referenced by records.
    #[serde(default)]
    pub sprites: HashMap<String, SpriteSheet>,
    #[serde(default)]
    pub entities: Vec<Map<String, Value>>,
}

impl LevelDef {
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        serde_json::from_str(s).context("parse level json")
    }

    /// Loads a level file from disk. The file stem names the level when the
    /// document does not.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let mut level =
            Self::from_json_str(&text).with_context(|| format!("load level {}", path.display()))?;
        if level.name.is_empty() {
            level.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
        }
        Ok(level)
    }

    /// `<dir>/<name>.json`
    pub fn path_for(dir: impl AsRef<Path>, name: &str) -> PathBuf {
        dir.as_ref().join(format!("{name}.json"))
    }
}

/// Outcome of `spawn_level`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnReport {
    pub spawned: Vec<EntityId>,
    pub skipped: usize,
    /// First player in the file.
    pub player: Option<EntityId>,
}

/// Read-only view of one record with warn-and-default accessors.
struct Record<'a> {
    level: &'a str,
    name: String,
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    fn new(level: &'a str, index: usize, fields: &'a Map<String, Value>) -> Self {
        let name = match fields.get("name").and_then(Value::as_str) {
            Some(n) => n.to_string(),
            None => format!("entity{index}"),
        };
        Self { level, name, fields }
    }

    /// Optional field; a malformed value is reported and ignored.
    fn opt<T>(&self, key: &str, parse: fn(&Value) -> Option<T>) -> Option<T> {
        let raw = self.fields.get(key)?;
        let parsed = parse(raw);
        if parsed.is_none() {
            warn!(level = %self.level, entity = %self.name, field = key, value = %raw, "malformed field, using default");
        }
        parsed
    }

    /// Expected field; missing or malformed values fall back to `default`.
    fn req<T>(&self, key: &str, parse: fn(&Value) -> Option<T>, default: T) -> T {
        if !self.fields.contains_key(key) {
            warn!(level = %self.level, entity = %self.name, field = key, "missing field, using default");
            return default;
        }
        self.opt(key, parse).unwrap_or(default)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.opt(key, Value::as_bool)
    }
}

fn number(v: &Value) -> Option<f32> {
    v.as_f64().map(|f| f as f32)
}

fn count(v: &Value) -> Option<u32> {
    v.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

/// `[x, y]` or `[x, y, z]`.
fn vec3(v: &Value) -> Option<Vec3> {
    let parts: Vec<f32> = v.as_array()?.iter().map(number).collect::<Option<_>>()?;
    match parts[..] {
        [x, y] => Some(Vec3::new(x, y, 0.0)),
        [x, y, z] => Some(Vec3::new(x, y, z)),
        _ => None,
    }
}

fn bounds(v: &Value) -> Option<Collider> {
    let parts: Vec<f32> = v.as_array()?.iter().map(number).collect::<Option<_>>()?;
    match parts[..] {
        [l, r, b, t] if l <= r && b <= t => Some(Collider::from_bounds(l, r, b, t)),
        _ => None,
    }
}

fn enumeration<T: DeserializeOwned>(v: &Value) -> Option<T> {
    serde_json::from_value(v.clone()).ok()
}

/// Builds every record of `level` into `scene`. Unknown kinds are skipped.
pub fn spawn_level(
    scene: &mut Scene,
    level: &LevelDef,
    sprites: &mut ResourceCache<SpriteSheet>,
) -> SpawnReport {
    let mut report = SpawnReport::default();
    let mut by_name: HashMap<String, EntityId> = HashMap::new();
    // Links resolved once every record exists.
    let mut anchors: Vec<(EntityId, String)> = Vec::new();
    let mut holders: Vec<(EntityId, String)> = Vec::new();

    for (index, fields) in level.entities.iter().enumerate() {
        let rec = Record::new(&level.name, index, fields);
        let Some(kind_name) = rec.opt("kind", string) else {
            warn!(level = %level.name, entity = %rec.name, "record without kind skipped");
            report.skipped += 1;
            continue;
        };

        let Some((kind, flags, collider)) = build_kind(&rec, &kind_name) else {
            warn!(level = %level.name, entity = %rec.name, kind = %kind_name, "unknown entity kind skipped");
            report.skipped += 1;
            continue;
        };

        let body = build_body(&rec, flags, collider);
        let frames = match &kind {
            EntityKind::Pack(_) => sprite_columns(&rec, level),
            _ => 1,
        };
        let kind = match kind {
            EntityKind::Pack(p) => EntityKind::Pack(p.with_frames(frames)),
            other => other,
        };
        let is_player = matches!(kind, EntityKind::Player(_));

        let sprite = resolve_sprite(&rec, level, sprites);
        let id = scene.spawn(rec.name.clone(), body, kind);
        if let Some(e) = scene.get_mut(id) {
            e.sprite = sprite;
        }

        if is_player && report.player.is_none() {
            report.player = Some(id);
        }
        if let Some(anchor) = rec.opt("anchor", string) {
            anchors.push((id, anchor));
        }
        if let Some(holder) = rec.opt("held_by", string) {
            holders.push((id, holder));
        }
        by_name.insert(rec.name.clone(), id);
        report.spawned.push(id);
    }

    for (widget, anchor) in anchors {
        let target = by_name.get(&anchor).copied();
        if target.is_none() {
            warn!(level = %level.name, widget = ?widget, anchor = %anchor, "widget anchor not found");
        }
        if let Some(EntityKind::Widget(w)) = scene.get_mut(widget).map(|e| &mut e.kind) {
            w.anchor = target;
        }
    }

    for (weapon, holder) in holders {
        let Some(&player) = by_name.get(&holder) else {
            warn!(level = %level.name, weapon = ?weapon, holder = %holder, "weapon holder not found");
            continue;
        };
        match scene.equip(player, weapon) {
            Ok(true) => {}
            Ok(false) => warn!(level = %level.name, weapon = ?weapon, holder = %holder, "holder already armed"),
            Err(err) => warn!(level = %level.name, weapon = ?weapon, %err, "cannot equip"),
        }
    }

    info!(
        level = %level.name,
        spawned = report.spawned.len(),
        skipped = report.skipped,
        sprites = sprites.len(),
        "level spawned"
    );
    report
}

/// Kind payload, default flags and default local collider for a record.
fn build_kind(rec: &Record<'_>, kind: &str) -> Option<(EntityKind, EntityFlags, Collider)> {
    let feet = Collider::from_bounds(-0.5, 0.5, 0.0, 1.0);
    let movable = EntityFlags::COLLIDABLE | EntityFlags::VISIBLE;
    let built = match kind {
        "solid" | "clip" | "passable" => {
            let surface = match kind {
                "solid" => Surface::Solid,
                "clip" => Surface::Clip,
                _ => Surface::Passable,
            };
            (EntityKind::Generic(surface), surface.default_flags(), Collider::default())
        }
        "player" => {
            let d = PlayerStats::default();
            let max_health = rec.req("max_health", number, d.max_health);
            let max_armor = rec.req("max_armor", number, d.max_armor);
            let stats = PlayerStats {
                max_move_speed: rec.req("max_move_speed", number, d.max_move_speed),
                max_jump_speed: rec.req("max_jump_speed", number, d.max_jump_speed),
                max_jump_time: rec.req("max_jump_time", number, d.max_jump_time),
                max_health,
                max_armor,
                health: rec.opt("health", number).unwrap_or(max_health).min(max_health),
                armor: rec.opt("armor", number).unwrap_or(d.armor).min(max_armor),
            };
            (EntityKind::Player(Player::new(stats)), movable, feet)
        }
        "weapon" => {
            let d = WeaponStats::default();
            let max_ammo = rec.req("max_ammo", count, d.max_ammo);
            let stats = WeaponStats {
                slot: rec.req("slot", enumeration::<Slot>, d.slot),
                max_ammo,
                ammo: rec.opt("ammo", count).unwrap_or(max_ammo).min(max_ammo),
                grouping_angle: rec.req("grouping_angle", number, d.grouping_angle),
                firing_speed: rec.req("firing_speed", number, d.firing_speed),
                damage: rec.opt("damage", number).unwrap_or(d.damage),
            };
            (EntityKind::Weapon(Weapon::new(stats)), movable, feet)
        }
        "pack" => {
            let payload = rec.req("payload", enumeration::<Payload>, Payload::Health);
            let value = rec.req("value", number, 25.0);
            (
                EntityKind::Pack(Pack::new(payload, value)),
                movable | EntityFlags::PASSIVE,
                feet,
            )
        }
        "widget" => {
            let widget = Widget {
                anchor: None,
                offset: rec.opt("offset", vec3).unwrap_or(Vec3::new(0.0, 2.5, 0.0)),
                label: String::new(),
            };
            (
                EntityKind::Widget(widget),
                EntityFlags::VISIBLE | EntityFlags::PASSIVE,
                Collider::default(),
            )
        }
        _ => return None,
    };
    Some(built)
}

fn build_body(rec: &Record<'_>, mut flags: EntityFlags, collider: Collider) -> Body {
    let position = rec.req("position", vec3, Vec3::ZERO);
    let size = rec.opt("size", vec3).unwrap_or(Vec3::new(1.0, 1.0, 1.0));
    let size = Vec3::new(size.x, size.y, if size.z == 0.0 { 1.0 } else { size.z });

    for (key, flag) in [
        ("collision", EntityFlags::COLLIDABLE),
        ("visible", EntityFlags::VISIBLE),
        ("passive", EntityFlags::PASSIVE),
    ] {
        if let Some(on) = rec.flag(key) {
            flags.set(flag, on);
        }
    }

    let mut transform = TransformState::at(position, size);
    if let Some(tile) = rec.opt("tile", vec3) {
        transform.replicate_x(tile.x);
        transform.replicate_y(tile.y);
    }

    let mut body = Body::new(transform, rec.opt("collider", bounds).unwrap_or(collider), flags);
    body.origin = rec.opt("origin", vec3).unwrap_or(Vec3::ZERO);
    body
}

fn sprite_columns(rec: &Record<'_>, level: &LevelDef) -> u32 {
    match rec.fields.get("sprite") {
        Some(Value::String(name)) => level.sprites.get(name).map_or(1, |s| s.columns),
        Some(inline @ Value::Object(_)) => enumeration::<SpriteSheet>(inline).map_or(1, |s| s.columns),
        _ => 1,
    }
}

fn resolve_sprite(
    rec: &Record<'_>,
    level: &LevelDef,
    sprites: &mut ResourceCache<SpriteSheet>,
) -> Option<Handle<SpriteSheet>> {
    match rec.fields.get("sprite")? {
        Value::String(name) => {
            let sheet = match level.sprites.get(name) {
                Some(sheet) => sheet.clone(),
                None => {
                    warn!(level = %level.name, entity = %rec.name, sprite = %name, "sprite sheet not declared, assuming single frame");
                    SpriteSheet::single(format!("{name}.png"))
                }
            };
            Some(sprites.get_or_insert_with(name, || sheet))
        }
        inline @ Value::Object(_) => match enumeration::<SpriteSheet>(inline) {
            Some(sheet) => {
                let key = sheet.path.clone();
                Some(sprites.get_or_insert_with(&key, || sheet))
            }
            None => {
                warn!(level = %level.name, entity = %rec.name, "malformed inline sprite ignored");
                None
            }
        },
        other => {
            warn!(level = %level.name, entity = %rec.name, value = %other, "malformed sprite ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::KindTag, transform::HasTransform, weapon::WeaponState};

    const LEVEL: &str = r#"{
        "name": "test",
        "sprites": {
            "medkit": { "path": "medkit.png", "columns": 4, "rows": 1 }
        },
        "entities": [
            { "kind": "solid", "name": "ground", "position": [0, -0.5], "size": [40, 1], "sprite": "ground", "tile": [40, 1] },
            { "kind": "player", "name": "hero", "position": [0, 0], "size": [1, 1.8],
              "max_move_speed": 8, "max_jump_speed": "fast", "max_health": 100, "health": 80 },
            { "kind": "weapon", "name": "rifle", "position": [3, 0], "slot": "secondary",
              "max_ammo": 12, "ammo": 50, "held_by": "hero" },
            { "kind": "pack", "name": "health", "position": [6, 0.5], "payload": "health", "value": 25, "sprite": "medkit" },
            { "kind": "widget", "name": "hud", "anchor": "hero", "position": [0, 0] },
            { "kind": "turret", "name": "unknown" },
            { "name": "nameless" }
        ]
    }"#;

    #[test]
    fn spawns_records_with_defaults() {
        let level = LevelDef::from_json_str(LEVEL).unwrap();
        let mut scene = Scene::default();
        let mut sprites = ResourceCache::default();
        let report = spawn_level(&mut scene, &level, &mut sprites);

        assert_eq!(report.spawned.len(), 5);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.player, scene.find("hero").map(|e| e.id()));

        let hero = scene.find("hero").unwrap();
        let stats = &hero.as_player().unwrap().stats;
        assert_eq!(stats.max_move_speed, 8.0);
        // Malformed value: default kept.
        assert_eq!(stats.max_jump_speed, PlayerStats::default().max_jump_speed);
        assert_eq!(stats.health, 80.0);
        assert_eq!(hero.transform().scale(), Vec3::new(1.0, 1.8, 1.0));

        let rifle = scene.find("rifle").unwrap();
        let w = rifle.as_weapon().unwrap();
        assert_eq!(w.stats.slot, Slot::Secondary);
        assert_eq!(w.stats.ammo, 12);
        assert_eq!(w.state(), WeaponState::Picked);
        assert_eq!(hero.as_player().unwrap().weapon(), Some(rifle.id()));

        let pack = scene.find("health").unwrap();
        assert!(pack.body.is_passive());
        assert_eq!(pack.as_pack().unwrap().frames, 4);

        let ground = scene.find("ground").unwrap();
        assert_eq!(ground.tag(), KindTag::Generic);
        assert!(ground.body.is_collidable() && ground.body.is_visible());
        assert_eq!(sprites.len(), 2);

        let hud = scene.find("hud").unwrap();
        match &hud.kind {
            EntityKind::Widget(w) => assert_eq!(w.anchor, Some(hero.id())),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn flag_overrides_apply() {
        let level = LevelDef::from_json_str(
            r#"{ "entities": [
                { "kind": "solid", "name": "ghost", "collision": false },
                { "kind": "clip", "name": "shown", "visible": true },
                { "kind": "player", "name": "statue", "passive": true, "collision": "maybe" }
            ] }"#,
        )
        .unwrap();
        let mut scene = Scene::default();
        spawn_level(&mut scene, &level, &mut ResourceCache::default());

        assert!(!scene.find("ghost").unwrap().body.is_collidable());
        assert!(scene.find("shown").unwrap().body.is_visible());
        let statue = scene.find("statue").unwrap();
        assert!(statue.body.is_passive());
        assert!(statue.body.is_collidable());
    }

    #[test]
    fn broken_json_is_an_error() {
        assert!(LevelDef::from_json_str("{ \"entities\": [").is_err());
        assert!(LevelDef::load("/nonexistent/level.json").is_err());
    }

    #[test]
    fn vector_fields_accept_two_or_three_numbers() {
        assert_eq!(vec3(&serde_json::json!([1, 2])), Some(Vec3::new(1.0, 2.0, 0.0)));
        assert_eq!(vec3(&serde_json::json!([1, 2, 3])), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(vec3(&serde_json::json!([1])), None);
        assert_eq!(vec3(&serde_json::json!([1, "a"])), None);
        assert!(bounds(&serde_json::json!([1, -1, 0, 1])).is_none());
    }
}
