//! Per-shot uniform track evaluation.

use reel_blob_core::{Blob, ShotView};
use tracing::trace;

use crate::config::AnimationConfig;
use crate::error::AnimationResult;
use crate::processor::{AnimationProcessor, CurveSample, UniformSink};
use crate::sampling::evaluate_curve;
use crate::scratch::{Scratch, UniformValue};

/// Samples every uniform track of a shot into the scratch cache.
#[derive(Debug)]
pub struct TrackEvaluator<'a> {
    scratch: Scratch<'a>,
}

impl<'a> TrackEvaluator<'a> {
    /// Size the cache for the larger of the configured minimum and the blob's largest shot.
    pub fn new(config: &AnimationConfig, blob: &Blob<'a>) -> Self {
        Self::with_capacity(config.scratch_uniforms.max(blob.max_uniforms()))
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scratch: Scratch::with_capacity(capacity),
        }
    }

    /// Evaluate all tracks of `shot` at `local_beats`, in declaration order, feeding every
    /// component to `processor` as it is produced.
    pub fn evaluate(
        &mut self,
        shot: &ShotView<'a>,
        local_beats: f32,
        delta_seconds: f32,
        processor: &mut dyn AnimationProcessor,
    ) -> AnimationResult<&[UniformValue<'a>]> {
        self.scratch.begin_frame();
        processor.begin_frame();
        for track in shot.tracks() {
            let track = track?;
            let count = track.component_count();
            let slot = self.scratch.push(track.name(), count)?;
            for component in 0..count {
                let curve = track.curve(component)?;
                let value = evaluate_curve(&curve, local_beats);
                slot.values[component] = value;
                processor.curve_evaluated(&CurveSample {
                    local_beats,
                    value,
                    curve,
                    uniform: track.name(),
                    component,
                    component_count: count,
                    delta_seconds,
                });
            }
        }
        trace!(
            uniforms = self.scratch.uniforms().len(),
            local_beats,
            "tracks evaluated"
        );
        Ok(self.scratch.uniforms())
    }

    /// Values from the last [`evaluate`](Self::evaluate).
    #[inline]
    pub fn uniforms(&self) -> &[UniformValue<'a>] {
        self.scratch.uniforms()
    }

    pub fn value(&self, name: &str) -> Option<&[f32]> {
        self.scratch.get(name).map(UniformValue::components)
    }

    /// Upload the last evaluated values.
    pub fn forward(&self, sink: &mut dyn UniformSink) {
        for uniform in self.scratch.uniforms() {
            sink.set_floats(uniform.name, uniform.components());
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.scratch.capacity()
    }
}
