//! Scene rendering: one draw per pass.

use std::fmt::Write as _;

use reel_animation_core::{AnimationProcessor, TrackEvaluator};
use reel_blob_core::{PassTarget, SceneView};
use serde::Serialize;
use tracing::{trace, warn};

use crate::backend::{RenderBackend, RenderTarget, TextureKind};
use crate::error::{PlayerError, PlayerResult};
use crate::resources::{GpuResources, LoaderProgress};

/// Per-frame values every pass sees.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext<'f, 'a> {
    /// True only for the precompute frame that draws static framebuffers.
    pub first: bool,
    pub seconds: f32,
    pub beats: f32,
    /// Track values evaluated for this frame.
    pub tracks: &'f TrackEvaluator<'a>,
    pub screen_width: u32,
    pub screen_height: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub drawn: usize,
    pub skipped: usize,
    pub baked: usize,
}

/// Renders scenes pass by pass.
#[derive(Debug, Default)]
pub struct PassPlayer {
    sampler_name: String,
}

impl PassPlayer {
    pub fn new() -> Self {
        Self {
            sampler_name: String::with_capacity(16),
        }
    }

    /// Draw every pass of `scene` that is due this frame.
    ///
    /// On the first frame only static framebuffer passes run; afterwards only realtime framebuffer
    /// passes and screen passes do. Per pass the upload order is: input samplers, animated
    /// uniforms, `uResolution`, `uSeconds`, `uBeats`, external textures, then whatever
    /// `processor` writes in its finalize hook.
    pub fn render<B: RenderBackend>(
        &mut self,
        scene: &SceneView<'_>,
        frame: &FrameContext<'_, '_>,
        resources: &mut GpuResources,
        processor: &mut dyn AnimationProcessor,
        backend: &mut B,
        progress: &mut LoaderProgress,
    ) -> PlayerResult<PassStats> {
        let mut stats = PassStats::default();
        for index in 0..scene.pass_count() {
            let pass = scene.pass(index)?;

            let (target, width, height, volume_source) = match pass.target() {
                PassTarget::Screen => {
                    if frame.first {
                        stats.skipped += 1;
                        continue;
                    }
                    (
                        RenderTarget::Screen,
                        frame.screen_width,
                        frame.screen_height,
                        None,
                    )
                }
                PassTarget::Framebuffer(id) => {
                    let slot = resources
                        .framebuffer(usize::from(id))
                        .ok_or_else(|| missing("framebuffer", usize::from(id)))?;
                    if frame.first == slot.info.realtime() {
                        stats.skipped += 1;
                        continue;
                    }
                    let target = RenderTarget::Framebuffer {
                        handle: slot.handle,
                        outputs: slot.info.output_count(),
                    };
                    let bake = slot.info.is_3d().then_some(usize::from(id));
                    (target, slot.width, slot.height, bake)
                }
            };

            backend.bind_target(target, width, height);
            let program = resources
                .program(pass.program_id())
                .ok_or_else(|| missing("program", pass.program_id()))?;
            backend.use_program(program);

            let inputs = pass.color_buffers();
            let (mut flat, mut volume) = (0u32, 0u32);
            for (unit, &cbo) in inputs.iter().enumerate() {
                let buffer = resources
                    .color_buffer(usize::from(cbo))
                    .ok_or_else(|| missing("color buffer", usize::from(cbo)))?;
                let unit = unit as u32;
                backend.bind_texture(unit, buffer.texture, buffer.kind);
                let name = match buffer.kind {
                    TextureKind::Texture2D => {
                        flat += 1;
                        self.sampler_name("uImages", flat - 1)
                    }
                    TextureKind::Texture3D => {
                        volume += 1;
                        self.sampler_name("uImages3D", volume - 1)
                    }
                };
                backend.set_int(name, unit as i32);
            }

            frame.tracks.forward(backend);
            backend.set_floats("uResolution", &[width as f32, height as f32]);
            backend.set_floats("uSeconds", &[frame.seconds]);
            backend.set_floats("uBeats", &[frame.beats]);

            for (k, texture) in resources.textures().iter().enumerate() {
                let unit = (inputs.len() + k) as u32;
                backend.bind_texture(unit, texture.texture, TextureKind::Texture2D);
                backend.set_int(&texture.uniform, unit as i32);
            }

            processor.finalize(backend);
            backend.draw();
            stats.drawn += 1;
            trace!(pass = index, program = pass.program_id(), width, height, "pass drawn");

            if let Some(framebuffer) = volume_source {
                match resources.bake_volumes(framebuffer, backend) {
                    Ok(baked) => stats.baked += baked,
                    Err(err) => {
                        let err = PlayerError::from(err);
                        if !err.is_recoverable() {
                            return Err(err);
                        }
                        warn!(
                            framebuffer,
                            error = %err,
                            "volume bake failed, outputs stay 2D"
                        );
                    }
                }
            }

            if frame.first {
                progress.tick(backend);
            }
        }
        Ok(stats)
    }

    fn sampler_name(&mut self, base: &str, index: u32) -> &str {
        self.sampler_name.clear();
        let _ = write!(self.sampler_name, "{base}[{index}]");
        &self.sampler_name
    }
}

fn missing(kind: &'static str, index: usize) -> PlayerError {
    PlayerError::MissingResource { kind, index }
}
