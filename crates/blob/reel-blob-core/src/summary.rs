//! Serialisable structural overview of a blob, used by tooling.

use serde::Serialize;

use crate::blob::Blob;
use crate::error::DecodeResult;
use crate::framebuffer::FramebufferInfo;
use crate::scene::PassTarget;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlobSummary {
    pub bytes: usize,
    pub beats_per_second: f32,
    pub max_uniforms: usize,
    pub programs: Vec<ProgramSummary>,
    pub framebuffers: Vec<FramebufferSummary>,
    pub shots: Vec<ShotSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgramSummary {
    pub stitches: usize,
    pub source_bytes: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FramebufferSummary {
    #[serde(flatten)]
    pub info: FramebufferInfo,
    pub realtime: bool,
    pub is_3d: bool,
    pub tile: bool,
    pub outputs: usize,
    pub first_color_buffer: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShotSummary {
    pub end_time: f32,
    pub passes: Vec<PassSummary>,
    pub uniforms: Vec<UniformSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PassSummary {
    pub program: usize,
    pub target: PassTarget,
    pub inputs: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UniformSummary {
    pub name: String,
    pub components: usize,
    /// Key count per component curve.
    pub keys: Vec<usize>,
}

impl BlobSummary {
    pub fn from_blob(blob: &Blob<'_>) -> DecodeResult<Self> {
        let mut programs = Vec::with_capacity(blob.program_count());
        for i in 0..blob.program_count() {
            let program = blob.program(i)?;
            let mut source_bytes = 0;
            for stitch in program.stitches() {
                source_bytes += stitch?.len();
            }
            programs.push(ProgramSummary {
                stitches: program.stitch_count(),
                source_bytes,
            });
        }

        let mut framebuffers = Vec::with_capacity(blob.framebuffer_count());
        let mut first_color_buffer = 0;
        for info in blob.framebuffers() {
            let info = info?;
            framebuffers.push(FramebufferSummary {
                info,
                realtime: info.realtime(),
                is_3d: info.is_3d(),
                tile: info.tile(),
                outputs: info.output_count(),
                first_color_buffer,
            });
            first_color_buffer += info.output_count();
        }

        let mut shots = Vec::with_capacity(blob.shot_count());
        for (i, shot) in blob.shots().enumerate() {
            let shot = shot?;
            let mut passes = Vec::new();
            for pass in blob.scene_for_shot(i)?.passes() {
                let pass = pass?;
                passes.push(PassSummary {
                    program: pass.program_id(),
                    target: pass.target(),
                    inputs: pass.color_buffers().to_vec(),
                });
            }
            let mut uniforms = Vec::with_capacity(shot.uniform_count());
            for track in shot.tracks() {
                let track = track?;
                let keys = (0..track.component_count())
                    .map(|c| track.curve(c).map(|curve| curve.len()))
                    .collect::<DecodeResult<Vec<_>>>()?;
                uniforms.push(UniformSummary {
                    name: track.name().to_owned(),
                    components: track.component_count(),
                    keys,
                });
            }
            shots.push(ShotSummary {
                end_time: blob.shot_end_time(i)?,
                passes,
                uniforms,
            });
        }

        Ok(Self {
            bytes: blob.len(),
            beats_per_second: blob.beats_per_second(),
            max_uniforms: blob.max_uniforms(),
            programs,
            framebuffers,
            shots,
        })
    }

    /// Playback length in seconds.
    pub fn duration_seconds(&self) -> f32 {
        self.shots
            .last()
            .map(|shot| shot.end_time / self.beats_per_second)
            .unwrap_or(0.0)
    }
}
