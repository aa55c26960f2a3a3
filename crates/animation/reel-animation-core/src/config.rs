//! Configuration for track evaluation and the built-in animation processors.

use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, AnimationResult};
use crate::spring::SpringParams;

/// Top-level animation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Minimum number of uniform slots in the per-frame scratch buffer. The evaluator grows this
    /// to the blob's declared maximum at construction, never during playback.
    pub scratch_uniforms: usize,
    /// How far ahead (in beats) spring targets are sampled to estimate velocity.
    pub lookahead_beats: f32,
    /// Squared distance between target and spring position that triggers a teleport.
    pub teleport_distance_sq: f32,
    /// Time step used to turn the look-ahead delta into a velocity on teleport.
    pub teleport_step: f32,
    /// Scale applied to the lean angle.
    pub lean_scale: f32,
    /// Uniforms driven through a spring instead of being used raw.
    pub springs: Vec<SpringBinding>,
    /// Camera processor settings; `None` disables it.
    pub camera: Option<CameraConfig>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            scratch_uniforms: 64,
            lookahead_beats: 0.01,
            teleport_distance_sq: 25.0,
            teleport_step: 0.01,
            lean_scale: 0.001,
            springs: Vec::new(),
            camera: Some(CameraConfig::default()),
        }
    }
}

impl AnimationConfig {
    /// Parse a JSON config and validate it.
    pub fn from_json_str(json: &str) -> AnimationResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Default camera plus the four character springs used by the Eidolon content.
    pub fn characters() -> Self {
        Self::default().with_springs(SpringBinding::character_preset())
    }

    pub fn validate(&self) -> AnimationResult<()> {
        if self.scratch_uniforms == 0 {
            return Err(AnimationError::config("scratch_uniforms must be greater than 0"));
        }
        positive("lookahead_beats", self.lookahead_beats)?;
        positive("teleport_distance_sq", self.teleport_distance_sq)?;
        positive("teleport_step", self.teleport_step)?;
        if !self.lean_scale.is_finite() {
            return Err(AnimationError::config("lean_scale must be finite"));
        }
        for (i, spring) in self.springs.iter().enumerate() {
            spring.validate()?;
            if self.springs[..i].iter().any(|s| s.uniform == spring.uniform) {
                return Err(AnimationError::config(format!(
                    "uniform '{}' has more than one spring",
                    spring.uniform
                )));
            }
        }
        if let Some(camera) = &self.camera {
            camera.validate()?;
        }
        Ok(())
    }

    #[inline]
    pub fn with_scratch_uniforms(mut self, slots: usize) -> Self {
        self.scratch_uniforms = slots;
        self
    }

    #[inline]
    pub fn with_lookahead_beats(mut self, beats: f32) -> Self {
        self.lookahead_beats = beats;
        self
    }

    #[inline]
    pub fn with_teleport(mut self, distance_sq: f32, step: f32) -> Self {
        self.teleport_distance_sq = distance_sq;
        self.teleport_step = step;
        self
    }

    #[inline]
    pub fn with_lean_scale(mut self, scale: f32) -> Self {
        self.lean_scale = scale;
        self
    }

    #[inline]
    pub fn with_spring(mut self, spring: SpringBinding) -> Self {
        self.springs.push(spring);
        self
    }

    #[inline]
    pub fn with_springs(mut self, springs: impl IntoIterator<Item = SpringBinding>) -> Self {
        self.springs.extend(springs);
        self
    }

    #[inline]
    pub fn with_camera(mut self, camera: Option<CameraConfig>) -> Self {
        self.camera = camera;
        self
    }
}

fn positive(field: &str, value: f32) -> AnimationResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AnimationError::config(format!(
            "{field} must be positive and finite (got {value})"
        )))
    }
}

/// One row of the spring table: which uniform to simulate and where to publish its rotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringBinding {
    /// Animated vec3 uniform used as the spring target; the simulated position is uploaded back
    /// under the same name.
    pub uniform: String,
    /// vec3 uniform receiving `(spin, heading, lean)`.
    pub rotation_uniform: String,
    #[serde(flatten)]
    pub params: SpringParams,
}

impl SpringBinding {
    pub fn new(uniform: impl Into<String>, rotation_uniform: impl Into<String>, params: SpringParams) -> Self {
        Self {
            uniform: uniform.into(),
            rotation_uniform: rotation_uniform.into(),
            params,
        }
    }

    /// The hero and three pursuers.
    pub fn character_preset() -> Vec<Self> {
        vec![
            Self::new(
                "uMainCharacterPos",
                "uMainCharacterRotation",
                SpringParams::new(0.25, 3.5, 2.0, 320.0),
            ),
            Self::new(
                "uEvilCharacterPos1",
                "uEvilCharacterRotation1",
                SpringParams::new(1.0, 1.5, 2.0, 400.0),
            ),
            Self::new(
                "uEvilCharacterPos2",
                "uEvilCharacterRotation2",
                SpringParams::new(1.0, 2.5, 1.0, 400.0),
            ),
            Self::new(
                "uEvilCharacterPos3",
                "uEvilCharacterRotation3",
                SpringParams::new(1.0, 1.5, 1.0, 400.0),
            ),
        ]
    }

    pub fn validate(&self) -> AnimationResult<()> {
        if self.uniform.is_empty() || self.rotation_uniform.is_empty() {
            return Err(AnimationError::config("spring uniform names must not be empty"));
        }
        let p = &self.params;
        positive("spring radius", p.radius)?;
        positive("spring stiffness", p.stiffness)?;
        if !(p.damping >= 0.0 && p.damping.is_finite()) {
            return Err(AnimationError::config(format!(
                "spring damping must be non-negative (got {})",
                p.damping
            )));
        }
        if !p.leaning.is_finite() {
            return Err(AnimationError::config("spring leaning must be finite"));
        }
        Ok(())
    }
}

/// Uniform names read and written by the camera processor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// vec3 camera position.
    pub origin: String,
    /// vec3 Euler angles (pitch, yaw, roll) in radians.
    pub angles: String,
    /// float half field of view in radians.
    pub fov: String,
    /// mat4 camera transform written at finalize.
    pub view: String,
    /// mat4 holding the four frustum corner rays.
    pub frustum: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            origin: "uOrigin".into(),
            angles: "uAngles".into(),
            fov: "uFovBias".into(),
            view: "uV".into(),
            frustum: "uFrustum".into(),
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> AnimationResult<()> {
        let names = [&self.origin, &self.angles, &self.fov, &self.view, &self.frustum];
        if names.iter().any(|n| n.is_empty()) {
            return Err(AnimationError::config("camera uniform names must not be empty"));
        }
        Ok(())
    }
}
