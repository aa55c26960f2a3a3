//! reel animation core (engine-agnostic)
//!
//! Turns time into uniform values: keyframe curves are sampled per shot, and optional
//! processors (camera, springs) post-process the samples before each draw.

pub mod camera;
pub mod config;
pub mod error;
pub mod physics;
pub mod processor;
pub mod sampling;
pub mod scratch;
pub mod spring;
pub mod tracks;

pub use camera::CameraProcessor;
pub use config::{AnimationConfig, CameraConfig, SpringBinding};
pub use error::{AnimationError, AnimationResult};
pub use physics::{SpringEntity, SpringProcessor};
pub use processor::{
    AnimationProcessor, CurveSample, NoopProcessor, ProcessorChain, UniformCapture, UniformSink,
};
pub use sampling::{evaluate_curve, evaluate_keys, find_segment, hermite, Segment};
pub use scratch::{Scratch, UniformValue};
pub use spring::{SpringParams, SpringState, SpringStep, SpringTuning};
pub use tracks::TrackEvaluator;
