//! Configuration system.
//!
//! Loads game configuration from JSON strings/files. Every field has a
//! default, so an empty object `{}` is a valid configuration. Timing fields
//! that are not positive are replaced by their default with a warning.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{math::Vec3, physics::PhysicsConfig};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Physics substep length in seconds.
    #[serde(default = "default_frame_step")]
    pub frame_step: f32,
    /// Global gravity acceleration.
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    /// Longest frame time fed into one update, in seconds.
    #[serde(default = "default_max_frame_time")]
    pub max_frame_time: f32,
    /// Rendered frames per second of the client loop.
    #[serde(default = "default_frame_hz")]
    pub frame_hz: u32,
    /// Seed for shot spread.
    #[serde(default)]
    pub seed: u64,
    /// Maximum length of a shot trace.
    #[serde(default = "default_shot_range")]
    pub shot_range: f32,
    /// Path to levels directory.
    #[serde(default = "default_levels_dir")]
    pub levels_dir: String,
    /// Level loaded at startup.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub player: PlayerTuning,
    #[serde(default)]
    pub view: ViewConfig,
}

/// Movement constants shared by every player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Horizontal acceleration while stepping; friction is half of it.
    pub move_accel: f32,
    /// Vertical acceleration while the jump is held.
    pub jump_accel: f32,
    /// Cooldown between two weapon drops.
    pub min_drop_time: f32,
    /// Velocity given to a dropped weapon, mirrored by facing.
    pub throw_speed: Vec3,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_accel: 40.0,
            jump_accel: 220.0,
            min_drop_time: 0.5,
            throw_speed: Vec3::new(6.0, 4.0, 0.0),
        }
    }
}

/// Visible area around the camera, in world units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub half_width: f32,
    pub half_height: f32,
    /// Camera offset from the followed player.
    pub follow_offset: Vec3,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            half_width: 12.0,
            half_height: 7.0,
            follow_offset: Vec3::new(0.0, 2.0, 0.0),
        }
    }
}

fn default_frame_step() -> f32 {
    0.001
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -35.0, 0.0)
}

fn default_max_frame_time() -> f32 {
    0.25
}

fn default_frame_hz() -> u32 {
    60
}

fn default_shot_range() -> f32 {
    40.0
}

fn default_levels_dir() -> String {
    "levels".to_string()
}

fn default_level() -> String {
    "demo".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            frame_step: default_frame_step(),
            gravity: default_gravity(),
            max_frame_time: default_max_frame_time(),
            frame_hz: default_frame_hz(),
            seed: 0,
            shot_range: default_shot_range(),
            levels_dir: default_levels_dir(),
            level: default_level(),
            player: PlayerTuning::default(),
            view: ViewConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        let mut cfg: Self = serde_json::from_str(s)?;
        cfg.fix_timing();
        Ok(cfg)
    }

    fn fix_timing(&mut self) {
        if !(self.frame_step > 0.0 && self.frame_step.is_finite()) {
            warn!(field = "frame_step", value = self.frame_step, "not a positive duration, using default");
            self.frame_step = default_frame_step();
        }
        if !(self.max_frame_time > 0.0) {
            warn!(field = "max_frame_time", value = self.max_frame_time, "not a positive duration, using default");
            self.max_frame_time = default_max_frame_time();
        }
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn physics(&self) -> PhysicsConfig {
        PhysicsConfig {
            gravity: self.gravity,
            frame_step: self.frame_step,
        }
    }

    /// Seconds per rendered frame.
    pub fn frame_time(&self) -> f32 {
        1.0 / self.frame_hz.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = GameConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.frame_step, 0.001);
        assert_eq!(cfg.gravity, Vec3::new(0.0, -35.0, 0.0));
        assert_eq!(cfg.player.move_accel, 40.0);
        assert_eq!(cfg.level, "demo");
    }

    #[test]
    fn partial_tuning_keeps_other_defaults() {
        let cfg = GameConfig::from_json_str(
            r#"{ "frame_step": 0.002, "gravity": { "x": 0.0, "y": -10.0, "z": 0.0 }, "player": { "jump_accel": 99.0 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.physics().frame_step, 0.002);
        assert_eq!(cfg.physics().gravity.y, -10.0);
        assert_eq!(cfg.player.jump_accel, 99.0);
        assert_eq!(cfg.player.min_drop_time, 0.5);
    }

    #[test]
    fn non_positive_timing_falls_back_to_defaults() {
        let cfg = GameConfig::from_json_str(r#"{ "frame_step": 0.0, "max_frame_time": -1.0 }"#).unwrap();
        assert_eq!(cfg.frame_step, 0.001);
        assert_eq!(cfg.max_frame_time, 0.25);

        let cfg = GameConfig::from_json_str(r#"{ "frame_step": -0.5, "max_frame_time": 0.1 }"#).unwrap();
        assert_eq!(cfg.physics().frame_step, 0.001);
        assert_eq!(cfg.max_frame_time, 0.1);
    }
}
