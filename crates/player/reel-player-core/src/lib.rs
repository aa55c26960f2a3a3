//! reel player core (backend-agnostic)
//!
//! Plays a parsed blob: the shot scheduler picks the current shot from the beat position, the
//! animation core evaluates its uniforms, and the pass player draws the shot's scene through a
//! [`RenderBackend`]. Time comes from a [`PlaybackClock`], normally the audio cursor.

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod passes;
pub mod player;
pub mod resources;
pub mod scheduler;

pub use backend::{
    ColorBufferDesc, FramebufferHandle, ProgramHandle, RecordingBackend, RenderBackend,
    RenderCommand, RenderTarget, TextureHandle, TextureKind,
};
pub use clock::{FixedStepClock, ManualClock, PlaybackClock, SharedCursor};
pub use config::{PlayerConfig, TextureSource};
pub use error::{BackendError, BackendResult, PlayerError, PlayerResult};
pub use passes::{FrameContext, PassPlayer, PassStats};
pub use player::{DemoPlayer, FrameOutcome, FrameReport, RunSummary, StopReason};
pub use resources::{ColorBuffer, ExternalTexture, FramebufferSlot, GpuResources, LoaderProgress};
pub use scheduler::ShotScheduler;
