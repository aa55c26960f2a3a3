//! Player configuration.

use reel_animation_core::AnimationConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PlayerError, PlayerResult};

/// Playback settings for a [`DemoPlayer`](crate::player::DemoPlayer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Offset added after the speed factor, for jumping into the middle of a demo.
    pub start_seconds: f32,
    /// Playback rate multiplier.
    pub speed: f32,
    /// Render at a fixed rate instead of following the audio cursor.
    pub export_fps: Option<u32>,
    /// Images bound after each pass's color buffer inputs.
    pub textures: Vec<TextureSource>,
    pub animation: AnimationConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 720,
            start_seconds: 0.0,
            speed: 1.0,
            export_fps: None,
            textures: Vec::new(),
            animation: AnimationConfig::default(),
        }
    }
}

impl PlayerConfig {
    pub fn from_json_str(json: &str) -> PlayerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlayerResult<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(PlayerError::config(format!(
                "screen size must be non-zero (got {}x{})",
                self.screen_width, self.screen_height
            )));
        }
        if !(self.start_seconds.is_finite() && self.start_seconds >= 0.0) {
            return Err(PlayerError::config(format!(
                "start_seconds must be finite and non-negative (got {})",
                self.start_seconds
            )));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(PlayerError::config(format!(
                "speed must be positive and finite (got {})",
                self.speed
            )));
        }
        if self.export_fps == Some(0) {
            return Err(PlayerError::config("export_fps must be greater than 0"));
        }
        for (i, texture) in self.textures.iter().enumerate() {
            if texture.uniform.is_empty() {
                return Err(PlayerError::config(format!("texture {i} has no uniform name")));
            }
            if self.textures[..i].iter().any(|t| t.uniform == texture.uniform) {
                return Err(PlayerError::config(format!(
                    "texture uniform '{}' is bound more than once",
                    texture.uniform
                )));
            }
        }
        self.animation.validate()?;
        Ok(())
    }

    #[inline]
    pub fn with_screen(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    #[inline]
    pub fn with_start_seconds(mut self, seconds: f32) -> Self {
        self.start_seconds = seconds;
        self
    }

    #[inline]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    #[inline]
    pub fn with_export_fps(mut self, fps: Option<u32>) -> Self {
        self.export_fps = fps;
        self
    }

    #[inline]
    pub fn with_texture(mut self, uniform: impl Into<String>, path: impl Into<String>) -> Self {
        self.textures.push(TextureSource {
            uniform: uniform.into(),
            path: path.into(),
        });
        self
    }

    #[inline]
    pub fn with_animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }
}

/// An image the host loads at startup and exposes to every pass under `uniform`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSource {
    pub uniform: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PlayerConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            PlayerConfig::default().with_screen(0, 720),
            PlayerConfig::default().with_speed(0.0),
            PlayerConfig::default().with_speed(f32::NAN),
            PlayerConfig::default().with_start_seconds(-1.0),
            PlayerConfig::default().with_export_fps(Some(0)),
            PlayerConfig::default()
                .with_texture("uNoise", "a.png")
                .with_texture("uNoise", "b.png"),
        ];
        for config in cases {
            let err = config.validate().unwrap_err();
            assert_eq!(err.category(), "config", "{config:?}");
        }
    }

    #[test]
    fn animation_errors_surface_through_validate() {
        let config = PlayerConfig::default()
            .with_animation(AnimationConfig::default().with_scratch_uniforms(0));
        assert!(matches!(
            config.validate(),
            Err(PlayerError::Animation(_))
        ));
    }

    #[test]
    fn parses_partial_json() {
        let config = PlayerConfig::from_json_str(
            r#"{ "screen_width": 1920, "screen_height": 1080, "export_fps": 60 }"#,
        )
        .unwrap();
        assert_eq!(config.export_fps, Some(60));
        assert_eq!(config.speed, 1.0);
        assert!(config.animation.camera.is_some());

        let err = PlayerConfig::from_json_str("{ \"speed\": \"fast\" }").unwrap_err();
        assert_eq!(err.category(), "serialization");
    }
}
