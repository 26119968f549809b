//! Baseline estimation
//!
//! A baseline is the arithmetic mean of observations inside a reference
//! window. Scalar baselines serve unit-level time series; raster baselines
//! average co-registered composites cell by cell for pixel-level change.

use crate::maybe_rayon::*;
use nightglow_core::raster::{Raster, RasterStack};
use nightglow_core::temporal::{BaselineWindow, Period, UnitSeries};
use nightglow_core::{Algorithm, Error, Result};

/// Cell-wise raster baseline stage
#[derive(Debug, Clone, Default)]
pub struct BaselineEstimator;

impl Algorithm for BaselineEstimator {
    type Input = Vec<Raster<f64>>;
    type Output = Raster<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "BaselineEstimator"
    }

    fn description(&self) -> &'static str {
        "Average co-registered rasters cell by cell, propagating no-data"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        let refs: Vec<&Raster<f64>> = input.iter().collect();
        baseline_raster(&refs)
    }
}

/// Mean of the observations whose period is in `window`.
///
/// Periods outside the window are ignored, as are non-finite values.
/// Returns `None` when no window period has an observation.
pub fn baseline_mean(series: &UnitSeries, window: &BaselineWindow) -> Option<f64> {
    let (sum, count) = window
        .iter()
        .filter_map(|p| series.get(p))
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Cell-by-cell mean of same-grid rasters.
///
/// A cell that is no-data in any input is no-data in the output. The output
/// carries the first raster's grid and no period label.
pub fn baseline_raster(rasters: &[&Raster<f64>]) -> Result<Raster<f64>> {
    let first = *rasters.first().ok_or_else(|| Error::InvalidParameter {
        name: "rasters",
        value: "0".into(),
        reason: "a baseline needs at least one raster".into(),
    })?;
    for r in &rasters[1..] {
        first.ensure_same_grid(*r)?;
    }

    let (rows, cols) = first.shape();
    let n = rasters.len() as f64;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            'cell: for col in 0..cols {
                let mut sum = 0.0;
                for r in rasters {
                    let v = unsafe { r.get_unchecked(row, col) };
                    if r.is_nodata(v) {
                        continue 'cell;
                    }
                    sum += v;
                }
                row_data[col] = sum / n;
            }
            row_data
        })
        .collect();

    let mut output = first.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    output.set_period(None);
    output.replace_data(data)?;
    Ok(output)
}

/// Baseline raster over the window's periods taken from `stack`.
///
/// Returns the periods missing from the stack as the error side so the
/// caller can report them; an incomplete window produces no baseline.
pub fn baseline_raster_for_window(
    stack: &RasterStack,
    window: &BaselineWindow,
) -> Result<std::result::Result<Raster<f64>, Vec<Period>>> {
    let missing: Vec<Period> = window.iter().filter(|p| !stack.contains_key(p)).copied().collect();
    if !missing.is_empty() {
        return Ok(Err(missing));
    }
    let members: Vec<&Raster<f64>> = window.iter().filter_map(|p| stack.get(p)).collect();
    baseline_raster(&members).map(Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightglow_core::GeoTransform;

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn make_raster(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(3, 3, value);
        r.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        r
    }

    fn window() -> BaselineWindow {
        BaselineWindow::consecutive(p("2023-01"), 6).unwrap()
    }

    #[test]
    fn constant_input_returns_the_constant() {
        for b in [0.0, 0.3, 10.0, 1234.5] {
            let series: UnitSeries = window().iter().map(|&period| (period, b)).collect();
            let mean = baseline_mean(&series, &window()).unwrap();
            assert!((mean - b).abs() < 1e-12, "expected {b}, got {mean}");
        }
    }

    #[test]
    fn periods_outside_window_are_ignored() {
        let mut series: UnitSeries = window().iter().map(|&period| (period, 10.0)).collect();
        series.insert(p("2022-12"), 1000.0);
        series.insert(p("2023-07"), 1000.0);
        assert_eq!(baseline_mean(&series, &window()), Some(10.0));
    }

    #[test]
    fn partial_window_uses_available_observations() {
        let series: UnitSeries = [(p("2023-02"), 4.0), (p("2023-05"), 8.0)].into_iter().collect();
        assert_eq!(baseline_mean(&series, &window()), Some(6.0));
    }

    #[test]
    fn empty_window_is_undefined_not_zero() {
        let series: UnitSeries = [(p("2024-01"), 4.0)].into_iter().collect();
        assert_eq!(baseline_mean(&series, &window()), None);
    }

    #[test]
    fn raster_mean_and_nodata_propagation() {
        let a = make_raster(2.0);
        let mut b = make_raster(4.0);
        b.set(1, 1, f64::NAN).unwrap();
        let mut c = make_raster(9.0);
        c.set(0, 0, -1.0).unwrap();
        c.set_nodata(Some(-1.0));

        let mean = baseline_raster(&[&a, &b, &c]).unwrap();
        assert!((mean.get(2, 2).unwrap() - 5.0).abs() < 1e-12);
        assert!(mean.get(1, 1).unwrap().is_nan());
        assert!(mean.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn raster_grid_mismatch_fails_fast() {
        let a = make_raster(1.0);
        let b: Raster<f64> = Raster::filled(4, 4, 1.0);
        assert!(matches!(baseline_raster(&[&a, &b]), Err(Error::GridMismatch { .. })));
        assert!(baseline_raster(&[]).is_err());
    }

    #[test]
    fn six_equal_rasters_reproduce_the_value() {
        let rasters: Vec<Raster<f64>> = (0..6).map(|_| make_raster(7.25)).collect();
        let mean = BaselineEstimator.execute_default(rasters).unwrap();
        assert_eq!(mean.statistics().mean, Some(7.25));
    }

    #[test]
    fn window_lookup_reports_missing_periods() {
        let mut stack = RasterStack::new();
        for period in window().iter().take(5) {
            stack.insert(*period, make_raster(1.0));
        }
        let missing = baseline_raster_for_window(&stack, &window()).unwrap().unwrap_err();
        assert_eq!(missing, vec![p("2023-06")]);

        stack.insert(p("2023-06"), make_raster(1.0));
        assert!(baseline_raster_for_window(&stack, &window()).unwrap().is_ok());
    }
}
