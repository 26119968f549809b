//! Analysis configuration
//!
//! One explicit value carries every threshold and policy of a run. It is
//! passed to each entry point; nothing reads process-wide state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the per-cell baseline is formed for pixel-level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineMode {
    /// Mean of the periods immediately preceding each target
    #[default]
    Rolling,
    /// Mean over the run's fixed baseline window for every target
    Fixed,
}

/// Reduction applied to defined cells inside a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    #[default]
    Sum,
    Mean,
}

/// Thresholds and policies for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Mask cells equal to `zero_value` to no-data
    pub mask_zeros: bool,
    /// Cell value treated as "no light"
    pub zero_value: f64,
    /// Pixel-level baselines must exceed this for percent-change to be defined
    pub pixel_min_baseline: f64,
    /// Aggregate-level baselines must exceed this
    pub aggregate_min_baseline: f64,
    /// Lower bound of reported percent-change
    pub clamp_min: f64,
    /// Upper bound of reported percent-change
    pub clamp_max: f64,
    /// Number of periods in a baseline window
    pub baseline_months: usize,
    pub pixel_baseline: BaselineMode,
    pub reduction: Reduction,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mask_zeros: true,
            zero_value: 0.0,
            pixel_min_baseline: 0.5,
            aggregate_min_baseline: 0.0,
            clamp_min: -100.0,
            clamp_max: 100.0,
            baseline_months: 6,
            pixel_baseline: BaselineMode::Rolling,
            reduction: Reduction::Sum,
        }
    }
}

impl AnalysisConfig {
    /// Parse from TOML text; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Sentinel the masker nulls, if zero masking is enabled
    pub fn zero_sentinel(&self) -> Option<f64> {
        self.mask_zeros.then_some(self.zero_value)
    }

    /// Reject configurations that cannot produce meaningful output
    pub fn validate(&self) -> Result<()> {
        if !(self.clamp_min < self.clamp_max) {
            return Err(Error::InvalidParameter {
                name: "clamp_min",
                value: format!("{}..{}", self.clamp_min, self.clamp_max),
                reason: "clamp_min must be below clamp_max".into(),
            });
        }
        if !(self.pixel_min_baseline >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "pixel_min_baseline",
                value: self.pixel_min_baseline.to_string(),
                reason: "threshold must be non-negative".into(),
            });
        }
        if !(self.aggregate_min_baseline >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "aggregate_min_baseline",
                value: self.aggregate_min_baseline.to_string(),
                reason: "threshold must be non-negative".into(),
            });
        }
        if self.baseline_months == 0 {
            return Err(Error::InvalidParameter {
                name: "baseline_months",
                value: "0".into(),
                reason: "window must cover at least one period".into(),
            });
        }
        Ok(())
    }
}
