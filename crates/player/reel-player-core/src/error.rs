//! Error types for playback.

use reel_animation_core::AnimationError;
use reel_blob_core::DecodeError;
use serde::Serialize;

/// Failures reported by a [`RenderBackend`](crate::backend::RenderBackend).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum BackendError {
    #[error("program {program} failed to compile: {reason}")]
    Compile { program: usize, reason: String },

    /// A framebuffer or texture could not be created.
    #[error("could not allocate {resource}: {reason}")]
    Allocation { resource: String, reason: String },

    #[error("texture for '{uniform}' could not be loaded from {path}: {reason}")]
    TextureLoad {
        uniform: String,
        path: String,
        reason: String,
    },

    /// Reading back a color buffer for volume promotion failed.
    #[error("readback of texture {texture} failed: {reason}")]
    Readback { texture: u32, reason: String },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Main error type for the player.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum PlayerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Animation(#[from] AnimationError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Invalid player config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// A frame was requested before resources were created.
    #[error("player must be prepared before rendering frames")]
    NotPrepared,

    /// A pass referenced a backend object that was never created.
    #[error("{kind} {index} has no backend resource")]
    MissingResource { kind: &'static str, index: usize },
}

impl PlayerError {
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
            Self::Animation(err) => err.category(),
            Self::Backend(_) => "backend",
            Self::InvalidConfig { .. } => "config",
            Self::Serialization { .. } => "serialization",
            Self::NotPrepared | Self::MissingResource { .. } => "state",
        }
    }

    /// Whether playback can continue after this error. A readback or allocation failure while
    /// promoting color buffers leaves the prepared resources intact. Preparation stops on any
    /// backend error regardless.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Backend(BackendError::Readback { .. } | BackendError::Allocation { .. })
        )
    }
}

impl From<serde_json::Error> for PlayerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

pub type PlayerResult<T> = Result<T, PlayerError>;
