#![doc = r"
reel-blob-core: zero-copy reader for packed demo blobs.

A blob is one immutable little-endian buffer holding shader programs, framebuffer descriptions,
scenes made of render passes, and a chain of shots whose uniforms are animated by keyframe curves.
[`Blob::parse`] validates the whole graph up front; the typed views it hands out borrow the buffer
and never copy.
"]

pub mod blob;
pub mod bytes;
pub mod curve;
pub mod error;
pub mod framebuffer;
pub mod index;
pub mod program;
pub mod scene;
pub mod shot;
pub mod summary;

pub use blob::Blob;
pub use bytes::ByteView;
pub use curve::{curve_record_len, CurveView, KeyIter, Keyframe};
pub use error::{DecodeError, DecodeResult};
pub use framebuffer::{FramebufferInfo, SCREEN_FBO_ID};
pub use index::{BlobIndex, HEADER_LEN};
pub use program::ProgramView;
pub use scene::{PassTarget, PassView, SceneView};
pub use shot::{ShotIter, ShotView, TrackIter, UniformTrack, MAX_COMPONENTS};
pub use summary::{BlobSummary, FramebufferSummary, PassSummary, ProgramSummary, ShotSummary, UniformSummary};
