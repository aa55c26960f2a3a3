//! Error types for the animation core.

use reel_blob_core::DecodeError;
use serde::Serialize;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// The blob could not be read while sampling tracks.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A configuration value is out of range.
    #[error("Invalid animation config: {reason}")]
    InvalidConfig { reason: String },

    /// Configuration text could not be parsed.
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// A shot evaluated more uniforms than the scratch buffers were sized for.
    #[error("Shot has {uniforms} uniforms but scratch capacity is {capacity}")]
    ScratchOverflow { uniforms: usize, capacity: usize },

    /// A uniform track declared a component count outside `1..=4`.
    #[error("Uniform '{uniform}' has {count} components; expected 1 to 4")]
    InvalidComponentCount { uniform: String, count: usize },
}

impl AnimationError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::InvalidConfig { .. } => "config",
            Self::Serialization { .. } => "serialization",
            Self::ScratchOverflow { .. } => "capacity",
            Self::InvalidComponentCount { .. } => "decode",
        }
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

pub type AnimationResult<T> = Result<T, AnimationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_keep_their_message() {
        let err: AnimationError = DecodeError::EmptyCurve { offset: 12 }.into();
        assert_eq!(err.category(), "decode");
        assert_eq!(err.to_string(), "curve at offset 12 has no keys");
    }

    #[test]
    fn json_errors_become_serialization_errors() {
        let err: AnimationError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.category(), "serialization");
    }
}
