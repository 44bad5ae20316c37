//! Input handling.
//!
//! A windowed client would sample keyboard and mouse here. The headless client
//! replays an `InputScript`: a list of input states, each held for a number of
//! frames. Scripts are JSON so runs can be reproduced from a file.

use std::{fs, path::Path};

use anyhow::Context;
use platformer_shared::{math::Vec3, player::PlayerState};
use serde::{Deserialize, Serialize};

/// Buttons held and aim for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub drop: bool,
    pub fire: bool,
    /// Aim direction; `None` keeps the previous aim.
    pub aim: Option<Vec3>,
}

impl InputState {
    /// Movement bits for `Player::set_state`.
    pub fn player_state(&self) -> PlayerState {
        let mut state = PlayerState::IDLE;
        state.set(PlayerState::LEFT_STEP, self.left);
        state.set(PlayerState::RIGHT_STEP, self.right);
        state.set(PlayerState::JUMP, self.jump);
        state.set(PlayerState::DROP_WEAPON, self.drop);
        state
    }
}

/// One input state held for `frames` frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    pub frames: u32,
    #[serde(flatten)]
    pub input: InputState,
}

/// Timed sequence of inputs.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    steps: Vec<ScriptStep>,
    cursor: usize,
    played: u32,
}

impl InputScript {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            cursor: 0,
            played: 0,
        }
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let steps: Vec<ScriptStep> = serde_json::from_str(s).context("parse input script")?;
        Ok(Self::new(steps))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("load script {}", path.display()))
    }

    /// Walks right, picks up whatever lies ahead, jumps, shoots, then throws
    /// the weapon back.
    pub fn demo() -> Self {
        let step = |frames, input| ScriptStep { frames, input };
        let right = InputState {
            right: true,
            ..Default::default()
        };
        Self::new(vec![
            step(30, InputState::default()),
            step(90, right),
            step(20, InputState { jump: true, ..right }),
            step(60, right),
            step(
                60,
                InputState {
                    fire: true,
                    aim: Some(Vec3::UNIT_X),
                    ..Default::default()
                },
            ),
            step(
                40,
                InputState {
                    left: true,
                    aim: Some(-Vec3::UNIT_X),
                    ..Default::default()
                },
            ),
            step(5, InputState { drop: true, ..Default::default() }),
            step(60, InputState::default()),
        ])
    }

    pub fn total_frames(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.frames)).sum()
    }
}

impl Iterator for InputScript {
    type Item = InputState;

    fn next(&mut self) -> Option<InputState> {
        loop {
            let step = self.steps.get(self.cursor)?;
            if self.played < step.frames {
                self.played += 1;
                return Some(step.input);
            }
            self.cursor += 1;
            self.played = 0;
        }
    }
}
