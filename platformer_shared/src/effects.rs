//! Visual effects.
//!
//! The registry maps effect names to definitions and keeps the instances that
//! are currently alive. Instances age once per frame and are dropped when
//! their lifetime runs out. Effects have no collision and no physics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Name of the effect spawned for every shot trace.
pub const SHOT_TRACE: &str = "shot_trace";
/// Name of the effect spawned where a shot hits something.
pub const IMPACT: &str = "impact";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDef {
    /// Seconds an instance stays alive.
    pub lifetime: f32,
    /// Sprite drawn for the effect, if any.
    #[serde(default)]
    pub sprite: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    pub name: String,
    pub start: Vec3,
    pub end: Vec3,
    pub remaining: f32,
    pub lifetime: f32,
}

impl ActiveEffect {
    /// 1.0 when spawned, 0.0 when expired.
    pub fn fade(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.lifetime).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub struct EffectRegistry {
    defs: HashMap<String, EffectDef>,
    active: Vec<ActiveEffect>,
}

impl EffectRegistry {
    /// Registry with the built-in shot and impact effects.
    pub fn with_defaults() -> Self {
        let mut r = Self::default();
        r.register(SHOT_TRACE, EffectDef { lifetime: 0.08, sprite: None });
        r.register(IMPACT, EffectDef { lifetime: 0.2, sprite: None });
        r
    }

    pub fn register(&mut self, name: &str, def: EffectDef) {
        self.defs.insert(name.to_string(), def);
    }

    pub fn def(&self, name: &str) -> Option<&EffectDef> {
        self.defs.get(name)
    }

    /// Starts an instance of `name`. Unknown names spawn nothing.
    pub fn spawn(&mut self, name: &str, start: Vec3, end: Vec3) -> bool {
        let Some(def) = self.defs.get(name) else {
            tracing::debug!(effect = %name, "unknown effect");
            return false;
        };
        self.active.push(ActiveEffect {
            name: name.to_string(),
            start,
            end,
            remaining: def.lifetime,
            lifetime: def.lifetime,
        });
        true
    }

    /// Ages every instance by `dt` and drops the expired ones.
    pub fn tick(&mut self, dt: f32) {
        for e in &mut self.active {
            e.remaining -= dt;
        }
        self.active.retain(|e| e.remaining > 0.0);
    }

    pub fn active(&self) -> &[ActiveEffect] {
        &self.active
    }
}
