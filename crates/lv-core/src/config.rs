//! Coordinator configuration
//!
//! Tuning constants for the scheduler, the feedback phases and the derived
//! model. Every section falls back to its defaults, so a configuration file
//! only needs to name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::ValueDomain;

/// Errors raised while loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Complete coordinator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub scheduler: SchedulerConfig,
    pub feedback: FeedbackConfig,
    pub model: ModelConfig,
}

/// Rate limiting intervals, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Animation frame period used to coalesce hover input
    pub frame_interval_ms: u64,

    /// Minimum spacing of in-gesture updates while dragging
    pub drag_throttle_ms: u64,

    /// Quiet period before a slider, text or drag commit settles
    pub settle_quiet_ms: u64,

    /// Quiet period before a selection click settles
    pub selection_settle_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            drag_throttle_ms: 40,
            settle_quiet_ms: 300,
            selection_settle_ms: 150,
        }
    }
}

/// Which feedback phases are emitted and how long their payloads live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub preview_enabled: bool,
    pub in_gesture_enabled: bool,
    pub post_commit_enabled: bool,

    /// Lifetime of an in-gesture highlight pulse
    pub pulse_ms: u64,

    /// Display time of a post-commit confirmation badge
    pub confirmation_ms: u64,

    /// Minimum spacing between two confirmation badges
    pub confirmation_throttle_ms: u64,

    /// Confirmations waiting beyond this are dropped, oldest first
    pub max_pending_confirmations: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            preview_enabled: true,
            in_gesture_enabled: true,
            post_commit_enabled: true,
            pulse_ms: 180,
            confirmation_ms: 1600,
            confirmation_throttle_ms: 400,
            max_pending_confirmations: 4,
        }
    }
}

/// Sizes and limits of the derived structures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Maximum length of the related set
    pub related_count: usize,

    /// Rows kept in the ranking panel
    pub ranking_limit: usize,

    /// Fixed number of distribution bins
    pub bin_count: usize,

    pub value_min: f64,
    pub value_max: f64,

    pub layout: LayoutConfig,
}

impl ModelConfig {
    pub fn domain(&self) -> ValueDomain {
        ValueDomain::new(self.value_min, self.value_max)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            related_count: 5,
            ranking_limit: 24,
            bin_count: 20,
            value_min: 0.0,
            value_max: 100.0,
            layout: LayoutConfig::default(),
        }
    }
}

/// Force relaxation parameters for the distribution layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub iterations: usize,

    /// Collision radius per detail level
    pub radii: [f64; 3],

    /// Pull toward the value-axis position, per iteration
    pub value_strength: f64,

    /// Pull toward the cross-axis center, per iteration
    pub center_strength: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 240.0,
            iterations: 120,
            radii: [3.0, 4.5, 6.0],
            value_strength: 0.12,
            center_strength: 0.03,
        }
    }
}

impl CoordinatorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: CoordinatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Reject values the scheduler or the model cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.frame_interval_ms == 0 {
            return Err(invalid("scheduler.frame_interval_ms", "must be positive"));
        }
        if self.feedback.max_pending_confirmations == 0 {
            return Err(invalid("feedback.max_pending_confirmations", "must be positive"));
        }
        let model = &self.model;
        if model.bin_count == 0 {
            return Err(invalid("model.bin_count", "must be positive"));
        }
        if !(model.value_min.is_finite() && model.value_max.is_finite()) || model.value_min >= model.value_max {
            return Err(invalid(
                "model.value_min",
                format!("domain {}..{} is empty", model.value_min, model.value_max),
            ));
        }
        let layout = &model.layout;
        if !(layout.width > 0.0 && layout.height > 0.0) {
            return Err(invalid("model.layout", "width and height must be positive"));
        }
        if layout.radii.iter().any(|r| !(*r > 0.0)) {
            return Err(invalid("model.layout.radii", "every radius must be positive"));
        }
        for (field, strength) in [
            ("model.layout.value_strength", layout.value_strength),
            ("model.layout.center_strength", layout.center_strength),
        ] {
            if !(strength > 0.0 && strength <= 1.0) {
                return Err(invalid(field, format!("{} is outside (0, 1]", strength)));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(CoordinatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CoordinatorConfig::from_json_str(
            r#"{ "scheduler": { "settle_quiet_ms": 500 }, "feedback": { "preview_enabled": false } }"#,
        )
        .unwrap();
        assert_eq!(config.scheduler.settle_quiet_ms, 500);
        assert_eq!(config.scheduler.frame_interval_ms, 16);
        assert!(!config.feedback.preview_enabled);
        assert!(config.feedback.post_commit_enabled);
        assert_eq!(config.model.bin_count, 20);
    }

    #[test]
    fn test_rejects_empty_domain() {
        let err = CoordinatorConfig::from_json_str(r#"{ "model": { "value_min": 50, "value_max": 50 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "model.value_min", .. }));
    }

    #[test]
    fn test_rejects_bad_strength() {
        let err = CoordinatorConfig::from_json_str(r#"{ "model": { "layout": { "value_strength": 1.5 } } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "model.layout.value_strength", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            CoordinatorConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
