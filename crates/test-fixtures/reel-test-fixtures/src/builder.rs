//! Minimal blob encoder for tests.
//!
//! Kept independent from the reader so layout tests compare two implementations. Records are laid
//! out as: header, fixed tables, strings, program records, scenes, curves, and finally the shot
//! chain, so every offset a shot needs is already known when it is written.

use serde::Deserialize;

const HEADER_LEN: usize = 32;
const SCREEN: u8 = 0xFF;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeySpec {
    pub time: f32,
    pub value: f32,
    #[serde(rename = "in")]
    pub in_tangent: f32,
    #[serde(rename = "out")]
    pub out_tangent: f32,
    /// Encode `+inf` as the out tangent (JSON has no infinity literal).
    pub stepped: bool,
}

impl KeySpec {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            ..Self::default()
        }
    }

    pub fn tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }

    pub fn stepped(mut self) -> Self {
        self.stepped = true;
        self
    }

    fn encoded_out(&self) -> f32 {
        if self.stepped {
            f32::INFINITY
        } else {
            self.out_tangent
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FramebufferSpec {
    #[serde(default)]
    pub width: u16,
    #[serde(default)]
    pub height: u16,
    #[serde(default = "one")]
    pub factor: u8,
    #[serde(default)]
    pub realtime: bool,
    #[serde(default)]
    pub is_3d: bool,
    #[serde(default)]
    pub tile: bool,
    #[serde(default = "one")]
    pub outputs: u8,
}

fn one() -> u8 {
    1
}

impl FramebufferSpec {
    /// Screen-sized target divided by `factor`, redrawn every frame.
    pub fn realtime(factor: u8, outputs: u8) -> Self {
        Self {
            factor,
            realtime: true,
            outputs,
            ..Self::default()
        }
    }

    /// Fixed-size target drawn once during the first frame.
    pub fn fixed(width: u16, height: u16, outputs: u8) -> Self {
        Self {
            width,
            height,
            factor: 1,
            outputs,
            ..Self::default()
        }
    }

    pub fn volume(mut self) -> Self {
        self.is_3d = true;
        self
    }

    pub fn tiled(mut self) -> Self {
        self.tile = true;
        self
    }

    fn flags(&self) -> u8 {
        let mut flags = self.outputs & 0x1F;
        if self.realtime {
            flags |= 0x80;
        }
        if self.is_3d {
            flags |= 0x40;
        }
        if self.tile {
            flags |= 0x20;
        }
        flags
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PassSpec {
    pub program: u16,
    /// `None` draws to the screen.
    #[serde(default)]
    pub fbo: Option<u8>,
    #[serde(default)]
    pub inputs: Vec<u8>,
}

impl PassSpec {
    pub fn screen(program: u16) -> Self {
        Self {
            program,
            fbo: None,
            inputs: Vec::new(),
        }
    }

    pub fn framebuffer(program: u16, fbo: u8) -> Self {
        Self {
            program,
            fbo: Some(fbo),
            inputs: Vec::new(),
        }
    }

    pub fn input(mut self, color_buffer: u8) -> Self {
        self.inputs.push(color_buffer);
        self
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UniformSpec {
    pub name: String,
    /// One curve per component.
    pub curves: Vec<Vec<KeySpec>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShotSpec {
    pub end: f32,
    #[serde(default)]
    pub passes: Vec<PassSpec>,
    #[serde(default)]
    pub uniforms: Vec<UniformSpec>,
    /// Extra bytes appended after the shot's tables (sizeOf grows accordingly).
    #[serde(default)]
    pub padding: usize,
}

impl ShotSpec {
    pub fn new(end: f32) -> Self {
        Self {
            end,
            ..Self::default()
        }
    }

    pub fn pass(mut self, pass: PassSpec) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn uniform(mut self, name: &str, curves: Vec<Vec<KeySpec>>) -> Self {
        self.uniforms.push(UniformSpec {
            name: name.to_owned(),
            curves,
        });
        self
    }

    /// Uniform whose components are all constant.
    pub fn constant(self, name: &str, values: &[f32]) -> Self {
        let curves = values.iter().map(|v| vec![KeySpec::new(0.0, *v)]).collect();
        self.uniform(name, curves)
    }

    pub fn padded(mut self, bytes: usize) -> Self {
        self.padding = bytes;
        self
    }
}

/// Where the encoder put things, for tests that corrupt specific fields.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    pub shot_offsets: Vec<usize>,
    pub scene_offsets: Vec<usize>,
    /// Per shot, per uniform, per component.
    pub curve_offsets: Vec<Vec<Vec<usize>>>,
    pub framebuffers_offset: usize,
    pub end_times_offset: usize,
}

/// Declarative description of a demo that encodes into a blob.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BlobBuilder {
    pub beats_per_second: f32,
    #[serde(default)]
    pub programs: Vec<Vec<String>>,
    #[serde(default)]
    pub framebuffers: Vec<FramebufferSpec>,
    #[serde(default)]
    pub shots: Vec<ShotSpec>,
    /// Overrides the computed maximum uniform count.
    #[serde(default)]
    pub max_uniforms: Option<u16>,
}

impl BlobBuilder {
    pub fn new(beats_per_second: f32) -> Self {
        Self {
            beats_per_second,
            ..Self::default()
        }
    }

    pub fn program(mut self, stitches: &[&str]) -> Self {
        self.programs
            .push(stitches.iter().map(|s| (*s).to_owned()).collect());
        self
    }

    pub fn framebuffer(mut self, fb: FramebufferSpec) -> Self {
        self.framebuffers.push(fb);
        self
    }

    pub fn shot(mut self, shot: ShotSpec) -> Self {
        self.shots.push(shot);
        self
    }

    pub fn max_uniforms(mut self, max: u16) -> Self {
        self.max_uniforms = Some(max);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with_layout().0
    }

    pub fn build_with_layout(&self) -> (Vec<u8>, Layout) {
        let mut w = Writer::default();
        let mut layout = Layout::default();
        w.bytes.resize(HEADER_LEN, 0);

        let programs_offset = w.reserve(self.programs.len() * 4);
        layout.framebuffers_offset = w.pos();
        for fb in &self.framebuffers {
            w.u16(fb.width);
            w.u16(fb.height);
            w.u8(fb.factor);
            w.u8(fb.flags());
        }
        layout.end_times_offset = w.pos();
        for shot in &self.shots {
            w.f32(shot.end);
        }
        let scenes_table = w.reserve(self.shots.len() * 4);

        for (i, program) in self.programs.iter().enumerate() {
            let stitch_offsets: Vec<usize> = program.iter().map(|s| w.cstr(s)).collect();
            let record = w.pos();
            w.u8(stitch_offsets.len() as u8);
            for off in stitch_offsets {
                w.u32(off as u32);
            }
            w.patch_u32(programs_offset + i * 4, record as u32);
        }

        for (i, shot) in self.shots.iter().enumerate() {
            let pass_offsets: Vec<usize> = shot
                .passes
                .iter()
                .map(|pass| {
                    let at = w.pos();
                    w.u16(pass.program);
                    w.u8(pass.fbo.unwrap_or(SCREEN));
                    w.u8(pass.inputs.len() as u8);
                    for id in &pass.inputs {
                        w.u8(*id);
                    }
                    at
                })
                .collect();
            let scene = w.pos();
            w.u8(pass_offsets.len() as u8);
            for off in pass_offsets {
                w.u32(off as u32);
            }
            w.patch_u32(scenes_table + i * 4, scene as u32);
            layout.scene_offsets.push(scene);
        }

        let mut names = Vec::new();
        for shot in &self.shots {
            let mut shot_names = Vec::new();
            let mut shot_curves = Vec::new();
            for uniform in &shot.uniforms {
                shot_names.push(w.cstr(&uniform.name));
                shot_curves.push(uniform.curves.iter().map(|keys| w.curve(keys)).collect());
            }
            names.push(shot_names);
            layout.curve_offsets.push(shot_curves);
        }

        let first_shot = w.pos();
        for (i, shot) in self.shots.iter().enumerate() {
            let start = w.pos();
            layout.shot_offsets.push(start);
            let curve_total: usize = shot.uniforms.iter().map(|u| u.curves.len()).sum();
            let size = 3 + shot.uniforms.len() * 5 + curve_total * 4 + shot.padding;
            w.u16(size as u16);
            w.u8(shot.uniforms.len() as u8);
            for name in &names[i] {
                w.u32(*name as u32);
            }
            for uniform in &shot.uniforms {
                w.u8(uniform.curves.len() as u8);
            }
            for curves in &layout.curve_offsets[i] {
                for off in curves {
                    w.u32(*off as u32);
                }
            }
            w.bytes.resize(w.pos() + shot.padding, 0xCD);
        }

        let max_uniforms = self.max_uniforms.unwrap_or_else(|| {
            self.shots
                .iter()
                .map(|s| s.uniforms.len() as u16)
                .max()
                .unwrap_or(0)
        });
        w.patch_u32(0, programs_offset as u32);
        w.patch_u32(4, layout.framebuffers_offset as u32);
        w.patch_u32(8, layout.end_times_offset as u32);
        w.patch_u32(12, scenes_table as u32);
        w.patch_u32(16, first_shot as u32);
        w.bytes[20..22].copy_from_slice(&(self.programs.len() as u16).to_le_bytes());
        w.bytes[22] = self.framebuffers.len() as u8;
        w.bytes[24..26].copy_from_slice(&(self.shots.len() as u16).to_le_bytes());
        w.bytes[26..28].copy_from_slice(&max_uniforms.to_le_bytes());
        w.bytes[28..32].copy_from_slice(&self.beats_per_second.to_le_bytes());
        (w.bytes, layout)
    }
}

#[derive(Default)]
struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn pos(&self) -> usize {
        self.bytes.len()
    }

    fn reserve(&mut self, len: usize) -> usize {
        let at = self.pos();
        self.bytes.resize(at + len, 0);
        at
    }

    fn u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn patch_u32(&mut self, at: usize, v: u32) {
        self.bytes[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn cstr(&mut self, s: &str) -> usize {
        let at = self.pos();
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        at
    }

    fn curve(&mut self, keys: &[KeySpec]) -> usize {
        let at = self.pos();
        self.u16(keys.len() as u16);
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                self.f32(key.in_tangent);
            }
            self.f32(key.time);
            self.f32(key.value);
            self.f32(key.encoded_out());
        }
        at
    }
}
