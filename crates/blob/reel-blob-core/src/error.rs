//! Decode errors raised while reading a blob.
//!
//! The blob is a build artifact, so every variant here means the content compiler produced
//! something the runtime cannot play. Nothing is recoverable at runtime; callers abort loading.

use serde::Serialize;

/// Errors produced by the binary layout reader.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum DecodeError {
    /// A read of `len` bytes at `offset` would run past the end of the blob.
    #[error("read of {len} bytes at offset {offset} exceeds blob length {blob_len}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        blob_len: usize,
    },

    /// An element index was not below the declared element count of its table.
    #[error("{table} index {index} out of range (count {count})")]
    IndexOutOfRange {
        table: &'static str,
        index: usize,
        count: usize,
    },

    /// The blob is too small to hold the fixed header.
    #[error("blob of {len} bytes is smaller than the {required} byte header")]
    TruncatedHeader { len: usize, required: usize },

    /// A blob must describe at least one shot.
    #[error("blob declares no shots")]
    EmptyTimeline,

    /// Shot end times must be strictly increasing.
    #[error("shot end time {index} ({time}) does not exceed the previous end time ({previous})")]
    NonMonotonicShotTimes {
        index: usize,
        time: f32,
        previous: f32,
    },

    /// The beats-per-second constant must be positive and finite.
    #[error("invalid beats per second: {value}")]
    InvalidTempo { value: f32 },

    /// A curve record declared zero keys.
    #[error("curve at offset {offset} has no keys")]
    EmptyCurve { offset: usize },

    /// Keys of a curve must be ordered by time.
    #[error("curve at offset {offset}: key {index} goes back in time")]
    UnorderedKeys { offset: usize, index: usize },

    /// A uniform declared a component count outside 1..=4.
    #[error("shot {shot}, uniform {uniform}: component count {count} is outside 1..=4")]
    InvalidComponentCount { shot: usize, uniform: usize, count: u8 },

    /// A shot's `sizeOf` is smaller than its own header and tables.
    #[error("shot {shot}: declared size {declared} is smaller than required size {required}")]
    ShotSizeMismatch {
        shot: usize,
        declared: usize,
        required: usize,
    },

    /// A shot declares more uniforms than the header's scratch maximum.
    #[error("shot {shot}: {count} uniforms exceed the declared maximum {max}")]
    TooManyUniforms { shot: usize, count: usize, max: usize },

    /// A pass targets a framebuffer id that is neither in the table nor the screen sentinel.
    #[error("pass at offset {offset}: framebuffer id {fbo_id} out of range (count {count})")]
    InvalidFramebuffer {
        offset: usize,
        fbo_id: u8,
        count: usize,
    },

    /// A framebuffer must divide the screen by a non-zero factor when its size is implicit.
    #[error("framebuffer {index}: implicit size with zero factor")]
    ZeroFactor { index: usize },

    /// A pass reads a color buffer that does not exist.
    #[error("pass at offset {offset}: color buffer id {cbo_id} out of range (count {count})")]
    InvalidColorBuffer {
        offset: usize,
        cbo_id: u8,
        count: usize,
    },

    /// A string was not NUL terminated before the end of the blob.
    #[error("string at offset {offset} is not NUL terminated")]
    UnterminatedString { offset: usize },

    /// A string was not valid UTF-8.
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
}

/// Result alias used throughout the reader.
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_location() {
        let err = DecodeError::OutOfBounds {
            offset: 40,
            len: 4,
            blob_len: 42,
        };
        assert_eq!(
            err.to_string(),
            "read of 4 bytes at offset 40 exceeds blob length 42"
        );

        let err = DecodeError::InvalidComponentCount {
            shot: 1,
            uniform: 2,
            count: 5,
        };
        assert!(err.to_string().contains("component count 5"));
    }

    #[test]
    fn errors_serialize_with_their_fields() {
        let err = DecodeError::UnorderedKeys {
            offset: 12,
            index: 3,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["UnorderedKeys"]["offset"], 12);
        assert_eq!(json["UnorderedKeys"]["index"], 3);
    }
}
