//! Extension point for content-specific post-processing of animated uniforms.
//!
//! A processor sees every evaluated curve component as it is produced and gets one call per
//! render pass, right before the draw, to upload whatever it derived.

use reel_blob_core::CurveView;

use crate::camera::CameraProcessor;
use crate::config::AnimationConfig;
use crate::physics::SpringProcessor;

/// Destination for uniform values. Implemented by render backends; names that the bound program
/// does not use are ignored.
pub trait UniformSink {
    /// Upload 1 to 4 floats (`float` through `vec4`).
    fn set_floats(&mut self, name: &str, values: &[f32]);
    /// Upload a 4x4 matrix. Elements are passed through in storage order, untransposed.
    fn set_matrix4(&mut self, name: &str, elements: &[f32; 16]);
    fn set_int(&mut self, name: &str, value: i32);
}

/// One evaluated curve component.
#[derive(Clone, Copy, Debug)]
pub struct CurveSample<'a> {
    /// Time the curve was sampled at, in beats since the shot started.
    pub local_beats: f32,
    pub value: f32,
    /// The curve itself, for processors that need to sample it at other times.
    pub curve: CurveView<'a>,
    pub uniform: &'a str,
    /// Component index, 0 = x.
    pub component: usize,
    pub component_count: usize,
    /// Wall time since the previous frame (0 on the first frame).
    pub delta_seconds: f32,
}

impl CurveSample<'_> {
    /// True for the final component of its uniform.
    #[inline]
    pub fn is_last_component(&self) -> bool {
        self.component + 1 == self.component_count
    }
}

pub trait AnimationProcessor {
    /// Called once before playback starts.
    fn init(&mut self) {}

    /// Called at the start of every track evaluation, before the first component.
    fn begin_frame(&mut self) {}

    /// Called after every evaluated component, in declaration order.
    fn curve_evaluated(&mut self, sample: &CurveSample<'_>);

    /// Called once per pass right before the draw.
    fn finalize(&mut self, sink: &mut dyn UniformSink);
}

/// Processor that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProcessor;

impl AnimationProcessor for NoopProcessor {
    fn curve_evaluated(&mut self, _sample: &CurveSample<'_>) {}

    fn finalize(&mut self, _sink: &mut dyn UniformSink) {}
}

/// Runs several processors in registration order.
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn AnimationProcessor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in processors enabled by `config`: the camera first, then the springs.
    pub fn from_config(config: &AnimationConfig, width: u32, height: u32) -> Self {
        let mut chain = Self::new();
        if let Some(camera) = &config.camera {
            chain.push(Box::new(CameraProcessor::new(camera.clone(), width, height)));
        }
        if !config.springs.is_empty() {
            chain.push(Box::new(SpringProcessor::new(config)));
        }
        chain
    }

    pub fn push(&mut self, processor: Box<dyn AnimationProcessor>) {
        self.processors.push(processor);
    }

    pub fn with(mut self, processor: impl AnimationProcessor + 'static) -> Self {
        self.push(Box::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorChain")
            .field("len", &self.processors.len())
            .finish()
    }
}

impl AnimationProcessor for ProcessorChain {
    fn init(&mut self) {
        for p in &mut self.processors {
            p.init();
        }
    }

    fn begin_frame(&mut self) {
        for p in &mut self.processors {
            p.begin_frame();
        }
    }

    fn curve_evaluated(&mut self, sample: &CurveSample<'_>) {
        for p in &mut self.processors {
            p.curve_evaluated(sample);
        }
    }

    fn finalize(&mut self, sink: &mut dyn UniformSink) {
        for p in &mut self.processors {
            p.finalize(sink);
        }
    }
}

/// Sink that records every write; lookups return the latest write for a name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformCapture {
    pub floats: Vec<(String, Vec<f32>)>,
    pub matrices: Vec<(String, [f32; 16])>,
    pub ints: Vec<(String, i32)>,
}

impl UniformCapture {
    pub fn floats(&self, name: &str) -> Option<&[f32]> {
        self.floats
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn matrix(&self, name: &str) -> Option<&[f32; 16]> {
        self.matrices
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.ints
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn clear(&mut self) {
        self.floats.clear();
        self.matrices.clear();
        self.ints.clear();
    }
}

impl UniformSink for UniformCapture {
    fn set_floats(&mut self, name: &str, values: &[f32]) {
        self.floats.push((name.to_owned(), values.to_vec()));
    }

    fn set_matrix4(&mut self, name: &str, elements: &[f32; 16]) {
        self.matrices.push((name.to_owned(), *elements));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.ints.push((name.to_owned(), value));
    }
}
