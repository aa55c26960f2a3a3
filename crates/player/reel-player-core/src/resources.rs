//! Backend objects created from a blob before playback.

use reel_blob_core::{Blob, FramebufferInfo};
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{
    ColorBufferDesc, FramebufferHandle, ProgramHandle, RenderBackend, TextureHandle, TextureKind,
};
use crate::config::PlayerConfig;
use crate::error::{BackendResult, PlayerResult};

/// Loading progress reported to the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoaderProgress {
    pub done: u32,
    pub total: u32,
}

impl LoaderProgress {
    pub fn new(total: u32) -> Self {
        Self { done: 0, total }
    }

    pub fn tick<B: RenderBackend>(&mut self, backend: &mut B) {
        self.done = (self.done + 1).min(self.total);
        backend.loader_progress(self.done, self.total);
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramebufferSlot {
    pub handle: FramebufferHandle,
    pub info: FramebufferInfo,
    pub width: u32,
    pub height: u32,
    /// Index of this framebuffer's first output in the flat color buffer list.
    pub first_color_buffer: usize,
}

impl FramebufferSlot {
    #[inline]
    pub fn desc(&self) -> ColorBufferDesc {
        ColorBufferDesc {
            width: self.width,
            height: self.height,
            tile: self.info.tile(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorBuffer {
    pub texture: TextureHandle,
    /// 2D until the owning framebuffer is 3D-flagged and has been baked.
    pub kind: TextureKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalTexture {
    pub uniform: String,
    pub texture: TextureHandle,
}

/// Programs, framebuffers and textures for one blob.
#[derive(Clone, Debug, Default)]
pub struct GpuResources {
    programs: Vec<ProgramHandle>,
    framebuffers: Vec<FramebufferSlot>,
    color_buffers: Vec<ColorBuffer>,
    textures: Vec<ExternalTexture>,
}

impl GpuResources {
    /// Load external textures, compile every program and allocate every framebuffer, ticking
    /// `progress` once per object. Any failure aborts preparation.
    pub fn prepare<B: RenderBackend>(
        blob: &Blob<'_>,
        config: &PlayerConfig,
        backend: &mut B,
        progress: &mut LoaderProgress,
    ) -> PlayerResult<Self> {
        let mut resources = Self::default();

        for source in &config.textures {
            let texture = backend.load_texture(source)?;
            resources.textures.push(ExternalTexture {
                uniform: source.uniform.clone(),
                texture,
            });
            progress.tick(backend);
        }

        let mut stitches: Vec<&str> = Vec::new();
        for index in 0..blob.program_count() {
            let program = blob.program(index)?;
            stitches.clear();
            for stitch in program.stitches() {
                stitches.push(stitch?);
            }
            resources
                .programs
                .push(backend.compile_program(index, &stitches)?);
            progress.tick(backend);
        }

        for (index, info) in blob.framebuffers().enumerate() {
            let info = info?;
            let (width, height) = info.resolve_size(config.screen_width, config.screen_height);
            let handle = backend.create_framebuffer(index)?;
            let slot = FramebufferSlot {
                handle,
                info,
                width,
                height,
                first_color_buffer: resources.color_buffers.len(),
            };
            let desc = slot.desc();
            for attachment in 0..info.output_count() {
                let texture = backend.create_color_buffer(handle, attachment, &desc)?;
                resources.color_buffers.push(ColorBuffer {
                    texture,
                    kind: TextureKind::Texture2D,
                });
            }
            debug!(
                framebuffer = index,
                width,
                height,
                outputs = info.output_count(),
                realtime = info.realtime(),
                "framebuffer created"
            );
            resources.framebuffers.push(slot);
            progress.tick(backend);
        }

        info!(
            programs = resources.programs.len(),
            framebuffers = resources.framebuffers.len(),
            color_buffers = resources.color_buffers.len(),
            textures = resources.textures.len(),
            "resources prepared"
        );
        Ok(resources)
    }

    pub fn program(&self, index: usize) -> Option<ProgramHandle> {
        self.programs.get(index).copied()
    }

    pub fn framebuffer(&self, index: usize) -> Option<&FramebufferSlot> {
        self.framebuffers.get(index)
    }

    pub fn color_buffer(&self, id: usize) -> Option<ColorBuffer> {
        self.color_buffers.get(id).copied()
    }

    #[inline]
    pub fn color_buffers(&self) -> &[ColorBuffer] {
        &self.color_buffers
    }

    #[inline]
    pub fn textures(&self) -> &[ExternalTexture] {
        &self.textures
    }

    /// Promote the outputs of framebuffer `index` to volume textures. Outputs already promoted are
    /// left alone, so this is a no-op after the first successful call. Returns how many outputs
    /// were baked.
    pub fn bake_volumes<B: RenderBackend>(
        &mut self,
        index: usize,
        backend: &mut B,
    ) -> BackendResult<usize> {
        let Some(slot) = self.framebuffers.get(index) else {
            return Ok(0);
        };
        let desc = slot.desc();
        let first = slot.first_color_buffer;
        let outputs = slot.info.output_count();

        let mut baked = 0;
        for buffer in &mut self.color_buffers[first..first + outputs] {
            if buffer.kind == TextureKind::Texture3D {
                continue;
            }
            buffer.texture = backend.bake_volume(buffer.texture, &desc)?;
            buffer.kind = TextureKind::Texture3D;
            baked += 1;
        }
        if baked > 0 {
            debug!(framebuffer = index, baked, edge = desc.height, "color buffers baked to 3D");
        }
        Ok(baked)
    }
}
