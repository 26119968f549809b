//! Absolute and percent change against a baseline
//!
//! For an observed value `v` and baseline `b`:
//! - absolute change: `v - b`
//! - raw percent change: `(v - b) / b * 100`, defined only when `b` exceeds
//!   the minimum-signal threshold
//! - percent change: the raw value clamped to `[clamp_min, clamp_max]`
//!
//! The threshold keeps near-dark baselines from producing huge ratios. It is
//! `0.5` for single cells and `0.0` (any positive baseline) for unit totals.

use crate::maybe_rayon::*;
use nightglow_core::raster::Raster;
use nightglow_core::{AnalysisConfig, Algorithm, BaselineProblem, Error, Result};
use serde::Serialize;

/// Minimum-signal threshold used for single cells
pub const PIXEL_MIN_BASELINE: f64 = 0.5;

/// Minimum-signal threshold used for unit aggregates
pub const AGGREGATE_MIN_BASELINE: f64 = 0.0;

/// Thresholds for percent-change computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeParams {
    /// Baselines must be strictly greater than this
    pub min_baseline: f64,
    pub clamp_min: f64,
    pub clamp_max: f64,
}

impl Default for ChangeParams {
    fn default() -> Self {
        Self::aggregate()
    }
}

impl ChangeParams {
    /// Pixel-level thresholds with the default clamp range
    pub fn pixel() -> Self {
        Self {
            min_baseline: PIXEL_MIN_BASELINE,
            clamp_min: -100.0,
            clamp_max: 100.0,
        }
    }

    /// Aggregate-level thresholds with the default clamp range
    pub fn aggregate() -> Self {
        Self {
            min_baseline: AGGREGATE_MIN_BASELINE,
            clamp_min: -100.0,
            clamp_max: 100.0,
        }
    }

    pub fn pixel_from(config: &AnalysisConfig) -> Self {
        Self {
            min_baseline: config.pixel_min_baseline,
            clamp_min: config.clamp_min,
            clamp_max: config.clamp_max,
        }
    }

    pub fn aggregate_from(config: &AnalysisConfig) -> Self {
        Self {
            min_baseline: config.aggregate_min_baseline,
            clamp_min: config.clamp_min,
            clamp_max: config.clamp_max,
        }
    }

    /// Whether `baseline` may be used as a percent-change denominator
    pub fn accepts(&self, baseline: f64) -> bool {
        baseline.is_finite() && baseline > self.min_baseline
    }

    /// Why `baseline` cannot be used as a denominator, if it cannot
    pub fn baseline_problem(&self, baseline: Option<f64>) -> Option<BaselineProblem> {
        match baseline {
            None => Some(BaselineProblem::NoObservations),
            Some(b) if !self.accepts(b) => Some(BaselineProblem::BelowThreshold {
                baseline: b,
                threshold: self.min_baseline,
            }),
            Some(_) => None,
        }
    }
}

/// Change of one observation against one baseline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Change {
    pub absolute: Option<f64>,
    /// Clamped percent change
    pub percent: Option<f64>,
    /// Unclamped percent change
    pub percent_raw: Option<f64>,
}

/// Raw percent change, `None` when the baseline is not above the threshold
pub fn percent_change(observed: f64, baseline: f64, params: &ChangeParams) -> Option<f64> {
    if !observed.is_finite() || !params.accepts(baseline) {
        return None;
    }
    Some((observed - baseline) / baseline * 100.0)
}

/// Clamp a raw percent change to the configured range
pub fn clamp_percent(raw: f64, params: &ChangeParams) -> f64 {
    raw.clamp(params.clamp_min, params.clamp_max)
}

/// Absolute, clamped and raw percent change of `observed` against `baseline`.
///
/// An undefined input makes every field undefined; a baseline at or below
/// the threshold leaves only the absolute change defined.
pub fn compute_change(observed: Option<f64>, baseline: Option<f64>, params: &ChangeParams) -> Change {
    let (v, b) = match (observed, baseline) {
        (Some(v), Some(b)) if v.is_finite() && b.is_finite() => (v, b),
        _ => return Change::default(),
    };
    let percent_raw = percent_change(v, b, params);
    Change {
        absolute: Some(v - b),
        percent: percent_raw.map(|p| clamp_percent(p, params)),
        percent_raw,
    }
}

/// Per-cell change rasters
#[derive(Debug, Clone)]
pub struct ChangeRasters {
    pub absolute: Raster<f64>,
    pub percent: Raster<f64>,
    pub percent_raw: Raster<f64>,
}

/// Pixel-level change stage
#[derive(Debug, Clone, Default)]
pub struct ChangeCalculator;

impl Algorithm for ChangeCalculator {
    /// (observed, baseline)
    type Input = (Raster<f64>, Raster<f64>);
    type Output = ChangeRasters;
    type Params = ChangeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ChangeCalculator"
    }

    fn description(&self) -> &'static str {
        "Absolute and clamped percent change of a raster against a baseline raster"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (observed, baseline) = input;
        change_rasters(&observed, &baseline, &params)
    }
}

/// Cell-by-cell change of `observed` against `baseline`.
///
/// Both rasters must share a grid. Output rasters keep the observed raster's
/// grid and period and use `NaN` for undefined cells.
pub fn change_rasters(observed: &Raster<f64>, baseline: &Raster<f64>, params: &ChangeParams) -> Result<ChangeRasters> {
    observed.ensure_same_grid(baseline)?;
    let (rows, cols) = observed.shape();

    let cells: Vec<(f64, f64, f64)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![(f64::NAN, f64::NAN, f64::NAN); cols];
            for col in 0..cols {
                let v = unsafe { observed.get_unchecked(row, col) };
                let b = unsafe { baseline.get_unchecked(row, col) };
                if observed.is_nodata(v) || baseline.is_nodata(b) {
                    continue;
                }
                let change = compute_change(Some(v), Some(b), params);
                row_data[col] = (
                    change.absolute.unwrap_or(f64::NAN),
                    change.percent.unwrap_or(f64::NAN),
                    change.percent_raw.unwrap_or(f64::NAN),
                );
            }
            row_data
        })
        .collect();

    let mut absolute = Vec::with_capacity(cells.len());
    let mut percent = Vec::with_capacity(cells.len());
    let mut percent_raw = Vec::with_capacity(cells.len());
    for (a, p, r) in cells {
        absolute.push(a);
        percent.push(p);
        percent_raw.push(r);
    }

    let build = |data: Vec<f64>| -> Result<Raster<f64>> {
        let mut output = observed.with_same_meta::<f64>(rows, cols);
        output.set_nodata(Some(f64::NAN));
        output.replace_data(data)?;
        Ok(output)
    };

    Ok(ChangeRasters {
        absolute: build(absolute)?,
        percent: build(percent)?,
        percent_raw: build(percent_raw)?,
    })
}
