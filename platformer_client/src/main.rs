//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p platformer_client -- [--config game.json] [--level demo]
//!       [--frames 600] [--frame-step 0.001] [--script input.json]
//!
//! The client loads a level, replays an input script (the built-in demo when
//! none is given) at the configured frame rate and prints a status summary.
//! Ctrl-C stops the loop at the next frame boundary.

use std::env;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use platformer_client::{input::InputScript, GameClient};
use platformer_shared::{config::GameConfig, render::NullRenderer};
use tokio::time::MissedTickBehavior;
use tracing::info;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    level: Option<String>,
    frames: Option<u64>,
    frame_step: Option<f32>,
    script: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut out = Args::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match (args[i].as_str(), value) {
            ("--config", Some(v)) => out.config = Some(PathBuf::from(v)),
            ("--level", Some(v)) => out.level = Some(v),
            ("--frames", Some(v)) => out.frames = v.parse().ok(),
            ("--frame-step", Some(v)) => out.frame_step = v.parse().ok(),
            ("--script", Some(v)) => out.script = Some(PathBuf::from(v)),
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args();
    let mut cfg = match &args.config {
        Some(path) => GameConfig::load(path).context("load config")?,
        None => GameConfig::default(),
    };
    if let Some(level) = &args.level {
        cfg.level = level.clone();
    }
    if let Some(step) = args.frame_step {
        cfg.frame_step = step;
    }
    info!(level = %cfg.level, levels_dir = %cfg.levels_dir, frame_step = cfg.frame_step, "Starting client");

    let mut script = match &args.script {
        Some(path) => InputScript::load(path)?,
        None => InputScript::demo(),
    };
    let max_frames = args.frames.unwrap_or_else(|| script.total_frames());

    let frame_time = cfg.frame_time();
    let status_every = u64::from(cfg.frame_hz.max(1));
    let level = cfg.level.clone();
    let mut client = GameClient::new(cfg, NullRenderer);
    client.load_level(&level)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut interval = tokio::time::interval(Duration::from_secs_f32(frame_time));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while client.frames() < max_frames {
        interval.tick().await;
        if stop.load(Ordering::Relaxed) {
            info!(frame = client.frames(), "Stop requested");
            break;
        }
        let input = script.next().unwrap_or_default();
        client.frame(&input, frame_time);

        if client.frames() % status_every == 0 {
            info!(
                frame = client.frames(),
                elapsed = client.scene.elapsed(),
                pickups = client.tally.pickups,
                shots = client.tally.shots,
                "Running"
            );
        }
    }

    for line in client.status() {
        println!("{}", line);
    }
    Ok(())
}
