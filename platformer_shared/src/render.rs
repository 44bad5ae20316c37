//! Rendering abstraction.
//!
//! This crate does not depend on a graphics backend. A renderer receives, per
//! frame, the camera matrix, one `DrawItem` per visible entity (model and UV
//! matrices plus sprite handle) and the live effects. `update` and rendering
//! never overlap: the scene is read only after the frame completed.

use crate::{camera::Camera, effects::ActiveEffect, math::Mat4, scene::{DrawItem, Scene}};

/// A minimal rendering API.
pub trait RenderBackend: Send + Sync {
    fn begin_frame(&mut self);
    fn set_view_proj(&mut self, view_proj: Mat4);
    fn draw_sprite(&mut self, item: &DrawItem);
    fn draw_effect(&mut self, effect: &ActiveEffect);
    fn end_frame(&mut self);
}

/// A no-op renderer useful for headless runs.
#[derive(Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self) {}
    fn set_view_proj(&mut self, _view_proj: Mat4) {}
    fn draw_sprite(&mut self, _item: &DrawItem) {}
    fn draw_effect(&mut self, _effect: &ActiveEffect) {}
    fn end_frame(&mut self) {}
}

/// Counts what was submitted; used by tests and the headless client log.
#[derive(Debug, Default, Clone)]
pub struct FrameRecorder {
    pub frames: u64,
    pub sprites: usize,
    pub effects: usize,
    pub view_proj: Option<Mat4>,
    pub last: Vec<DrawItem>,
}

impl RenderBackend for FrameRecorder {
    fn begin_frame(&mut self) {
        self.sprites = 0;
        self.effects = 0;
        self.last.clear();
    }

    fn set_view_proj(&mut self, view_proj: Mat4) {
        self.view_proj = Some(view_proj);
    }

    fn draw_sprite(&mut self, item: &DrawItem) {
        self.sprites += 1;
        self.last.push(item.clone());
    }

    fn draw_effect(&mut self, _effect: &ActiveEffect) {
        self.effects += 1;
    }

    fn end_frame(&mut self) {
        self.frames += 1;
        tracing::trace!(frame = self.frames, sprites = self.sprites, effects = self.effects, "frame submitted");
    }
}

/// Submits one frame of `scene` as seen from `camera`.
pub fn render_scene(backend: &mut dyn RenderBackend, scene: &Scene, camera: &Camera) {
    backend.begin_frame();
    backend.set_view_proj(camera.view_proj());
    for item in scene.draw_list() {
        backend.draw_sprite(&item);
    }
    for effect in scene.effects.active() {
        backend.draw_effect(effect);
    }
    backend.end_frame();
}
