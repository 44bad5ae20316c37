//! `platformer_client`
//!
//! Client-side systems:
//! - Input sampling (scripted in headless runs)
//! - Session ownership: scene, caches, camera
//! - Fixed frame loop wiring into a render backend

pub mod client;
pub mod input;

pub use client::GameClient;
