//! Headless backend that records every call.
//!
//! Used by tests, benches and the inspector to run the full frame loop without a GPU. Handles are
//! allocated densely per kind, like a real driver's name generator.

use hashbrown::HashMap;
use reel_animation_core::UniformSink;
use serde::{Deserialize, Serialize};

use super::{
    ColorBufferDesc, FramebufferHandle, ProgramHandle, RenderBackend, RenderTarget, TextureHandle,
    TextureKind,
};
use crate::config::TextureSource;
use crate::error::{BackendError, BackendResult};

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCommand {
    CompileProgram {
        index: usize,
        handle: ProgramHandle,
        stitches: usize,
    },
    CreateFramebuffer {
        index: usize,
        handle: FramebufferHandle,
    },
    CreateColorBuffer {
        framebuffer: FramebufferHandle,
        attachment: usize,
        texture: TextureHandle,
        desc: ColorBufferDesc,
    },
    LoadTexture {
        uniform: String,
        texture: TextureHandle,
    },
    BindTarget {
        target: RenderTarget,
        width: u32,
        height: u32,
    },
    UseProgram {
        program: ProgramHandle,
    },
    BindTexture {
        unit: u32,
        texture: TextureHandle,
        kind: TextureKind,
    },
    SetFloats {
        name: String,
        values: Vec<f32>,
    },
    SetMatrix4 {
        name: String,
        elements: [f32; 16],
    },
    SetInt {
        name: String,
        value: i32,
    },
    BakeVolume {
        source: TextureHandle,
        volume: TextureHandle,
        edge: u32,
    },
    Draw,
    Present,
    Progress {
        done: u32,
        total: u32,
    },
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<RenderCommand>,
    textures: HashMap<TextureHandle, TextureKind>,
    next_program: u32,
    next_framebuffer: u32,
    next_texture: u32,
    failing_program: Option<usize>,
    fail_readback: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make compilation of program `index` fail.
    pub fn with_failing_program(mut self, index: usize) -> Self {
        self.failing_program = Some(index);
        self
    }

    /// Make every volume bake fail at readback.
    pub fn with_failing_readback(mut self) -> Self {
        self.fail_readback = true;
        self
    }

    #[inline]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Commands grouped per presented frame. Commands recorded before the first `Present`
    /// (preparation) form the first group; a trailing group without `Present` is included.
    pub fn frames(&self) -> Vec<&[RenderCommand]> {
        let mut frames = Vec::new();
        let mut start = 0;
        for (i, command) in self.commands.iter().enumerate() {
            if matches!(command, RenderCommand::Present) {
                frames.push(&self.commands[start..=i]);
                start = i + 1;
            }
        }
        if start < self.commands.len() {
            frames.push(&self.commands[start..]);
        }
        frames
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Draw))
            .count()
    }

    /// Kind of a live texture, if the backend created it.
    pub fn texture_kind(&self, texture: TextureHandle) -> Option<TextureKind> {
        self.textures.get(&texture).copied()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    fn alloc_texture(&mut self, kind: TextureKind) -> TextureHandle {
        let handle = TextureHandle(self.next_texture);
        self.next_texture = self.next_texture.wrapping_add(1);
        self.textures.insert(handle, kind);
        handle
    }
}

impl UniformSink for RecordingBackend {
    fn set_floats(&mut self, name: &str, values: &[f32]) {
        self.commands.push(RenderCommand::SetFloats {
            name: name.to_owned(),
            values: values.to_vec(),
        });
    }

    fn set_matrix4(&mut self, name: &str, elements: &[f32; 16]) {
        self.commands.push(RenderCommand::SetMatrix4 {
            name: name.to_owned(),
            elements: *elements,
        });
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.commands.push(RenderCommand::SetInt {
            name: name.to_owned(),
            value,
        });
    }
}

impl RenderBackend for RecordingBackend {
    fn compile_program(&mut self, index: usize, stitches: &[&str]) -> BackendResult<ProgramHandle> {
        if self.failing_program == Some(index) {
            return Err(BackendError::Compile {
                program: index,
                reason: "rejected by recording backend".into(),
            });
        }
        let handle = ProgramHandle(self.next_program);
        self.next_program = self.next_program.wrapping_add(1);
        self.commands.push(RenderCommand::CompileProgram {
            index,
            handle,
            stitches: stitches.len(),
        });
        Ok(handle)
    }

    fn create_framebuffer(&mut self, index: usize) -> BackendResult<FramebufferHandle> {
        let handle = FramebufferHandle(self.next_framebuffer);
        self.next_framebuffer = self.next_framebuffer.wrapping_add(1);
        self.commands
            .push(RenderCommand::CreateFramebuffer { index, handle });
        Ok(handle)
    }

    fn create_color_buffer(
        &mut self,
        framebuffer: FramebufferHandle,
        attachment: usize,
        desc: &ColorBufferDesc,
    ) -> BackendResult<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::Allocation {
                resource: format!("color buffer {attachment} of framebuffer {}", framebuffer.0),
                reason: format!("empty size {}x{}", desc.width, desc.height),
            });
        }
        let texture = self.alloc_texture(TextureKind::Texture2D);
        self.commands.push(RenderCommand::CreateColorBuffer {
            framebuffer,
            attachment,
            texture,
            desc: *desc,
        });
        Ok(texture)
    }

    fn load_texture(&mut self, source: &TextureSource) -> BackendResult<TextureHandle> {
        let texture = self.alloc_texture(TextureKind::Texture2D);
        self.commands.push(RenderCommand::LoadTexture {
            uniform: source.uniform.clone(),
            texture,
        });
        Ok(texture)
    }

    fn bind_target(&mut self, target: RenderTarget, width: u32, height: u32) {
        self.commands.push(RenderCommand::BindTarget {
            target,
            width,
            height,
        });
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.commands.push(RenderCommand::UseProgram { program });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle, kind: TextureKind) {
        self.commands
            .push(RenderCommand::BindTexture { unit, texture, kind });
    }

    fn bake_volume(
        &mut self,
        source: TextureHandle,
        desc: &ColorBufferDesc,
    ) -> BackendResult<TextureHandle> {
        if self.fail_readback {
            return Err(BackendError::Readback {
                texture: source.0,
                reason: "readback disabled".into(),
            });
        }
        if self.textures.remove(&source).is_none() {
            return Err(BackendError::Readback {
                texture: source.0,
                reason: "unknown texture".into(),
            });
        }
        let volume = self.alloc_texture(TextureKind::Texture3D);
        self.commands.push(RenderCommand::BakeVolume {
            source,
            volume,
            edge: desc.height,
        });
        Ok(volume)
    }

    fn draw(&mut self) {
        self.commands.push(RenderCommand::Draw);
    }

    fn present(&mut self) {
        self.commands.push(RenderCommand::Present);
    }

    fn loader_progress(&mut self, done: u32, total: u32) {
        self.commands.push(RenderCommand::Progress { done, total });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_handles_per_kind() {
        let mut backend = RecordingBackend::new();
        let p0 = backend.compile_program(0, &["a", "b"]).unwrap();
        let p1 = backend.compile_program(1, &["c"]).unwrap();
        let fb = backend.create_framebuffer(0).unwrap();
        let desc = ColorBufferDesc {
            width: 16,
            height: 4,
            tile: false,
        };
        let t0 = backend.create_color_buffer(fb, 0, &desc).unwrap();
        assert_eq!((p0, p1), (ProgramHandle(0), ProgramHandle(1)));
        assert_eq!(fb, FramebufferHandle(0));
        assert_eq!(t0, TextureHandle(0));
        assert_eq!(backend.texture_kind(t0), Some(TextureKind::Texture2D));
    }

    #[test]
    fn bake_replaces_the_source_texture() {
        let mut backend = RecordingBackend::new();
        let fb = backend.create_framebuffer(0).unwrap();
        let desc = ColorBufferDesc {
            width: 64,
            height: 8,
            tile: true,
        };
        let flat = backend.create_color_buffer(fb, 0, &desc).unwrap();
        let volume = backend.bake_volume(flat, &desc).unwrap();
        assert_eq!(backend.texture_kind(flat), None);
        assert_eq!(backend.texture_kind(volume), Some(TextureKind::Texture3D));
        assert_eq!(backend.live_textures(), 1);
        assert!(matches!(
            backend.commands().last(),
            Some(RenderCommand::BakeVolume { edge: 8, .. })
        ));
        // the source is gone, so a second bake of it fails
        assert!(backend.bake_volume(flat, &desc).is_err());
    }

    #[test]
    fn frames_split_on_present() {
        let mut backend = RecordingBackend::new();
        backend.draw();
        backend.present();
        backend.draw();
        backend.draw();
        backend.present();
        backend.set_int("uTail", 1);
        let frames = backend.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].len(), 3);
        assert_eq!(backend.draw_count(), 3);
    }

    #[test]
    fn commands_serialize_with_an_op_tag() {
        let json = serde_json::to_value(RenderCommand::BindTexture {
            unit: 2,
            texture: TextureHandle(5),
            kind: TextureKind::Texture3D,
        })
        .unwrap();
        assert_eq!(json["op"], "bind_texture");
        assert_eq!(json["kind"], "texture_3d");
    }
}
