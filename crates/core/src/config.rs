//! Configuration structures for the cluster-shaper system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bar aggregation configuration.
    pub shaper: ShaperConfig,
    /// Shape classification configuration.
    pub shape: ShapeConfig,
    /// Per-bar Value Area configuration.
    pub value_area: ValueAreaConfig,
}

impl Config {
    /// Parse a configuration from a JSON string and validate it.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.shaper.validate()?;
        self.shape.validate()?;
        self.value_area.validate()
    }
}

/// Bar aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaperConfig {
    /// Expected profile width in levels. Sizing hint only, never a cap.
    pub period: usize,
    /// Quantization width (price distance between adjacent levels).
    pub resolution: f64,
    /// Emit progress notifications for the bar still being built.
    pub notify_unformed: bool,
    /// Bar length used when deriving bar keys from tick timestamps.
    pub bar_duration_ms: i64,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            period: 60,
            resolution: 0.0001,
            notify_unformed: true,
            bar_duration_ms: 60_000,
        }
    }
}

impl ShaperConfig {
    /// Validate period, resolution and bar duration.
    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(Error::config("period must be positive"));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::config(format!(
                "resolution must be a positive finite number, got {}",
                self.resolution
            )));
        }
        if self.bar_duration_ms <= 0 {
            return Err(Error::config(format!(
                "bar_duration_ms must be positive, got {}",
                self.bar_duration_ms
            )));
        }
        Ok(())
    }
}

/// Shape classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Normalized center of mass below this is low-skewed, above `1 - t` high-skewed.
    pub skew_center_threshold: f64,
    /// Minimum cosine similarity for a reference match to decide the shape.
    pub min_similarity: f64,
    /// Maximum Euclidean distance for `matches_reference`.
    pub max_distance: f64,
    /// Bars narrower than this many levels are left unclassified.
    pub min_levels: usize,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            skew_center_threshold: 0.38,
            min_similarity: 0.55,
            max_distance: 0.02,
            min_levels: 3,
        }
    }
}

impl ShapeConfig {
    /// Validate thresholds.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=0.5).contains(&self.skew_center_threshold) {
            return Err(Error::config(format!(
                "skew_center_threshold must be within [0, 0.5], got {}",
                self.skew_center_threshold
            )));
        }
        if !(-1.0..=1.0).contains(&self.min_similarity) {
            return Err(Error::config(format!(
                "min_similarity must be within [-1, 1], got {}",
                self.min_similarity
            )));
        }
        if self.max_distance.is_nan() || self.max_distance < 0.0 {
            return Err(Error::config("max_distance must be non-negative"));
        }
        Ok(())
    }
}

/// Per-bar Value Area configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueAreaConfig {
    /// Target VA coverage (e.g., 0.70 for 70%).
    pub va_fraction: f64,
    /// Minimum number of levels for a valid VA.
    pub min_levels: usize,
}

impl Default for ValueAreaConfig {
    fn default() -> Self {
        Self {
            va_fraction: 0.70,
            min_levels: 3,
        }
    }
}

impl ValueAreaConfig {
    /// Validate the coverage fraction.
    pub fn validate(&self) -> Result<()> {
        if !(self.va_fraction > 0.0 && self.va_fraction <= 1.0) {
            return Err(Error::config(format!(
                "va_fraction must be within (0, 1], got {}",
                self.va_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.shaper.period, 60);
        assert_eq!(config.shaper.resolution, 0.0001);
        assert_eq!(config.shape.skew_center_threshold, 0.38);
        assert_eq!(config.value_area.va_fraction, 0.70);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json_str(r#"{"shaper": {"resolution": 0.5}}"#).unwrap();
        assert_eq!(config.shaper.resolution, 0.5);
        assert_eq!(config.shaper.period, 60);
        assert!(config.shaper.notify_unformed);
        assert_eq!(config.shape.min_levels, 3);
    }

    #[test]
    fn test_invalid_resolution_rejected() {
        let err = Config::from_json_str(r#"{"shaper": {"resolution": 0.0}}"#).unwrap_err();
        assert!(err.is_config());

        let err = Config::from_json_str(r#"{"shaper": {"resolution": -1.0}}"#).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_invalid_period_rejected() {
        let config = ShaperConfig {
            period: 0,
            ..ShaperConfig::default()
        };
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let shape = ShapeConfig {
            skew_center_threshold: 0.7,
            ..ShapeConfig::default()
        };
        assert!(shape.validate().is_err());

        let va = ValueAreaConfig {
            va_fraction: 1.5,
            ..ValueAreaConfig::default()
        };
        assert!(va.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = Config::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
