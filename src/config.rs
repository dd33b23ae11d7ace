//! Engine configuration
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::OutputFormat;
use crate::effects::RenderOptions;
use crate::error::{RedactError, Result};
use crate::stroke::ToolSettings;

/// Soft ceilings that keep a session from running away on huge inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Limits {
    /// Largest accepted width or height
    pub max_dimension: u32,
    /// Largest accepted width * height
    pub max_pixels: u64,
    /// Committed strokes per session; further strokes are dropped
    pub max_actions: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dimension: 16384,
            max_pixels: 64_000_000,
            max_actions: 512,
        }
    }
}

impl Limits {
    /// Check an image size against the ceilings
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(RedactError::InvalidInput(
                "Image dimensions must be greater than 0".into(),
            ));
        }
        if width > self.max_dimension || height > self.max_dimension {
            return Err(RedactError::LimitExceeded(format!(
                "{}x{} exceeds {} pixels per side",
                width, height, self.max_dimension
            )));
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.max_pixels {
            return Err(RedactError::LimitExceeded(format!(
                "{}x{} exceeds {} pixels",
                width, height, self.max_pixels
            )));
        }
        Ok(())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedactConfig {
    /// Tool selected when a session opens
    pub tool: ToolSettings,
    pub limits: Limits,
    pub render: RenderOptions,
    /// Captured points closer than this to the previous one are dropped
    pub min_point_distance: f32,
    /// Darkening applied under the mask preview (0.0 - 1.0)
    pub preview_opacity: f32,
    pub output: OutputFormat,
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self {
            tool: ToolSettings::default(),
            limits: Limits::default(),
            render: RenderOptions::default(),
            min_point_distance: 0.5,
            preview_opacity: 0.3,
            output: OutputFormat::Png,
        }
    }
}

impl RedactConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load from the user config directory, falling back to defaults
    pub fn load_or_default() -> Self {
        let path = default_config_path();
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn sanitized(mut self) -> Self {
        self.tool = self.tool.normalized();
        self.min_point_distance = if self.min_point_distance.is_finite() {
            self.min_point_distance.max(0.0)
        } else {
            0.0
        };
        self.preview_opacity = if self.preview_opacity.is_finite() {
            self.preview_opacity.clamp(0.0, 1.0)
        } else {
            0.3
        };
        self
    }
}

/// `<config dir>/redactor/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redactor")
        .join("config.json")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stroke::EffectKind;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RedactConfig::from_json_str(
            r#"{
                "tool": { "effectKind": "pixelate", "brushWidth": 80 },
                "limits": { "maxActions": 10 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.tool.effect_kind, EffectKind::Pixelate);
        assert_eq!(config.tool.brush_width, 80.0);
        assert_eq!(config.tool.strength, 15.0);
        assert_eq!(config.limits.max_actions, 10);
        assert_eq!(config.limits.max_dimension, 16384);
        assert_eq!(config.output, OutputFormat::Png);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = RedactConfig::from_json_str(
            r#"{
                "tool": { "strength": 0.5, "brushWidth": 9000 },
                "previewOpacity": 4.0,
                "minPointDistance": -1
            }"#,
        )
        .unwrap();

        assert_eq!(config.tool.strength, 2.0);
        assert_eq!(config.tool.brush_width, 250.0);
        assert_eq!(config.preview_opacity, 1.0);
        assert_eq!(config.min_point_distance, 0.0);
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("redactor-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = RedactConfig::default();
        config.output = OutputFormat::Jpeg { quality: 85 };
        config.render.motion_blur_copies = 18;
        std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

        let loaded = RedactConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            RedactConfig::from_json_str("{ not json"),
            Err(RedactError::Json(_))
        ));
    }

    #[test]
    fn test_limits() {
        let limits = Limits {
            max_dimension: 100,
            max_pixels: 5000,
            max_actions: 1,
        };
        assert!(limits.check_dimensions(50, 100).is_ok());
        assert!(matches!(
            limits.check_dimensions(101, 1),
            Err(RedactError::LimitExceeded(_))
        ));
        assert!(matches!(
            limits.check_dimensions(100, 100),
            Err(RedactError::LimitExceeded(_))
        ));
        assert!(matches!(
            limits.check_dimensions(0, 10),
            Err(RedactError::InvalidInput(_))
        ));
    }
}
