//! Viewer configuration.
//!
//! Settings are plain data, loaded from TOML and handed by value to the
//! parser and the renderer. Keys missing from a file keep their defaults.

use std::path::Path;
use std::time::Duration;

use glv_scene::{RenderMode, RenderParams};
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};

/// Smallest accepted optimizer threshold.
pub const MIN_OPTIMIZER_THRESHOLD: usize = 2;

/// Viewer and parser settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Compute smooth per-vertex normals for indexed meshes.
    pub smooth_normals: bool,
    /// Maximum primitives per renderer batch.
    pub optimizer_threshold: usize,
    /// Initial render mode.
    pub render_mode: RenderMode,
    /// Log errors and keep parsing instead of stopping.
    pub ignore_errors: bool,
    /// Lines this long or longer are rejected.
    pub max_line_length: usize,
    /// Sleep between retries on a partial line, in microseconds.
    pub poll_interval_us: u64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            smooth_normals: false,
            optimizer_threshold: 100,
            render_mode: RenderMode::Full,
            ignore_errors: false,
            max_line_length: 1023,
            poll_interval_us: 10,
        }
    }
}

impl ViewerSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.optimizer_threshold < MIN_OPTIMIZER_THRESHOLD {
            return Err(ParseError::InvalidSettings(format!(
                "optimizer_threshold must be at least {MIN_OPTIMIZER_THRESHOLD}"
            )));
        }
        if self.max_line_length == 0 {
            return Err(ParseError::InvalidSettings(
                "max_line_length must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Read and validate settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Raise a too-low optimizer threshold to the minimum.
    pub fn clamp_optimizer_threshold(&mut self) {
        if self.optimizer_threshold < MIN_OPTIMIZER_THRESHOLD {
            log::warn!(
                "Optimizer threshold {} too low, using {MIN_OPTIMIZER_THRESHOLD}",
                self.optimizer_threshold
            );
            self.optimizer_threshold = MIN_OPTIMIZER_THRESHOLD;
        }
    }

    /// Partial-line retry interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    /// Render parameters for a fresh frame.
    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            mode: self.render_mode,
            optimizer_threshold: self.optimizer_threshold,
            smooth_normals: self.smooth_normals,
            facet_frame: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = ViewerSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.optimizer_threshold, 100);
        assert_eq!(settings.max_line_length, 1023);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = ViewerSettings::from_toml("smooth_normals = true\nrender_mode = \"simplified\"\n").unwrap();
        assert!(settings.smooth_normals);
        assert_eq!(settings.render_mode, RenderMode::Simplified);
        assert_eq!(settings.optimizer_threshold, 100);
    }

    #[test]
    fn test_threshold_rejected_and_clamped() {
        let err = ViewerSettings::from_toml("optimizer_threshold = 1").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSettings(_)));

        let mut settings = ViewerSettings {
            optimizer_threshold: 0,
            ..Default::default()
        };
        settings.clamp_optimizer_threshold();
        assert_eq!(settings.optimizer_threshold, 2);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = ViewerSettings {
            ignore_errors: true,
            ..Default::default()
        };
        let text = settings.to_toml().unwrap();
        assert_eq!(ViewerSettings::from_toml(&text).unwrap(), settings);
    }

    #[test]
    fn test_render_params() {
        let settings = ViewerSettings {
            smooth_normals: true,
            render_mode: RenderMode::BoundingBox,
            ..Default::default()
        };
        let params = settings.render_params();
        assert!(params.smooth_normals);
        assert_eq!(params.mode, RenderMode::BoundingBox);
        assert!(params.facet_frame.is_none());
    }
}
