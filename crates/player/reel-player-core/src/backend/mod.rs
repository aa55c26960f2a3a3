//! Render backend seam.
//!
//! The player never talks to a graphics API directly. Everything it needs (program compilation,
//! render targets, texture binding, one full-screen draw per pass) goes through [`RenderBackend`],
//! and uniform uploads go through the [`UniformSink`] supertrait shared with the animation
//! processors.

pub mod recording;

use reel_animation_core::UniformSink;
use serde::{Deserialize, Serialize};

use crate::config::TextureSource;
use crate::error::BackendResult;

pub use recording::{RecordingBackend, RenderCommand};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ProgramHandle(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FramebufferHandle(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Sampler dimensionality of a bound texture.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TextureKind {
    #[serde(rename = "texture_2d")]
    Texture2D,
    #[serde(rename = "texture_3d")]
    Texture3D,
}

/// Storage for one framebuffer output: RGBA32F, linear filtering, clamped unless tiled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBufferDesc {
    pub width: u32,
    pub height: u32,
    pub tile: bool,
}

/// Draw destination for a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderTarget {
    Screen,
    /// Offscreen target writing `outputs` color attachments.
    Framebuffer {
        handle: FramebufferHandle,
        outputs: usize,
    },
}

pub trait RenderBackend: UniformSink {
    /// Build a fragment program from its source stitches, concatenated in order.
    fn compile_program(&mut self, index: usize, stitches: &[&str]) -> BackendResult<ProgramHandle>;

    fn create_framebuffer(&mut self, index: usize) -> BackendResult<FramebufferHandle>;

    /// Allocate a 2D color buffer and attach it to `framebuffer` at `attachment`.
    fn create_color_buffer(
        &mut self,
        framebuffer: FramebufferHandle,
        attachment: usize,
        desc: &ColorBufferDesc,
    ) -> BackendResult<TextureHandle>;

    fn load_texture(&mut self, source: &TextureSource) -> BackendResult<TextureHandle>;

    /// Bind a draw target and set the viewport to `width` x `height`.
    fn bind_target(&mut self, target: RenderTarget, width: u32, height: u32);

    fn use_program(&mut self, program: ProgramHandle);

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle, kind: TextureKind);

    /// Read back the 2D color buffer `source` and re-upload it as a cube volume with edge
    /// `desc.height` (a horizontal strip of `height` slices). Returns the volume texture; `source`
    /// is no longer referenced by the player afterwards.
    fn bake_volume(
        &mut self,
        source: TextureHandle,
        desc: &ColorBufferDesc,
    ) -> BackendResult<TextureHandle>;

    /// Draw one full-screen rectangle with the current program and target.
    fn draw(&mut self);

    /// Swap buffers.
    fn present(&mut self);

    /// Loading progress, `done` of `total` steps.
    fn loader_progress(&mut self, _done: u32, _total: u32) {}
}
