//! Pixel-level change over a monthly raster stack
//!
//! Each target month is compared, cell by cell, against a baseline raster.
//! In rolling mode the baseline is the mean of the months immediately before
//! the target, so every target has its own reference; in fixed mode all
//! targets share the mean over one window.

use super::baseline::baseline_raster_for_window;
use super::percent::{change_rasters, ChangeParams, ChangeRasters};
use crate::maybe_rayon::*;
use nightglow_core::raster::{Raster, RasterStack};
use nightglow_core::temporal::{BaselineWindow, Period};
use nightglow_core::{AnalysisConfig, BaselineMode, DataIssue, Error, Result, GRID_SCOPE};
use tracing::{debug, warn};

/// How each target's baseline raster is formed
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBaseline {
    /// Mean of the `months` periods immediately preceding the target
    Rolling { months: usize },
    /// Mean over one window for every target
    Fixed(BaselineWindow),
}

impl Default for PixelBaseline {
    fn default() -> Self {
        PixelBaseline::Rolling { months: 6 }
    }
}

impl PixelBaseline {
    /// Baseline policy from a run configuration.
    ///
    /// Fixed mode needs the window's first period; rolling mode ignores it.
    pub fn from_config(config: &AnalysisConfig, fixed_start: Option<Period>) -> Result<Self> {
        match config.pixel_baseline {
            BaselineMode::Rolling => Ok(PixelBaseline::Rolling {
                months: config.baseline_months,
            }),
            BaselineMode::Fixed => {
                let first = fixed_start.ok_or_else(|| Error::InvalidParameter {
                    name: "pixel_baseline",
                    value: "fixed".into(),
                    reason: "fixed mode needs a baseline start period".into(),
                })?;
                Ok(PixelBaseline::Fixed(BaselineWindow::consecutive(first, config.baseline_months)?))
            }
        }
    }

    /// Window used for `target`
    pub fn window_for(&self, target: Period) -> Result<BaselineWindow> {
        match self {
            PixelBaseline::Rolling { months } => BaselineWindow::preceding(target, *months),
            PixelBaseline::Fixed(window) => Ok(window.clone()),
        }
    }
}

/// Change rasters for one target period
#[derive(Debug, Clone)]
pub struct PixelChange {
    pub period: Period,
    pub baseline_periods: Vec<Period>,
    pub baseline: Raster<f64>,
    pub change: ChangeRasters,
}

/// Result of a pixel-level run
#[derive(Debug, Clone, Default)]
pub struct PixelChangeReport {
    /// One entry per computed target, in target order
    pub changes: Vec<PixelChange>,
    /// Targets skipped because the target or part of its window is absent
    pub issues: Vec<DataIssue>,
}

/// Per-target pixel change over `stack`.
///
/// All rasters in the stack must share one grid. A target absent from the
/// stack, or whose baseline window is incomplete, is skipped and reported as
/// a `MissingPeriod` issue scoped to the grid. An incomplete fixed window
/// skips every target and reports its absent periods once.
pub fn pixel_changes(
    stack: &RasterStack,
    targets: &[Period],
    baseline: &PixelBaseline,
    params: &ChangeParams,
) -> Result<PixelChangeReport> {
    if let Some(first) = stack.values().next() {
        for raster in stack.values().skip(1) {
            first.ensure_same_grid(raster)?;
        }
    }

    let shared = match baseline {
        PixelBaseline::Fixed(window) => match baseline_raster_for_window(stack, window)? {
            Ok(raster) => Some(raster),
            Err(absent) => {
                let issues: Vec<DataIssue> = absent.into_iter().map(missing).collect();
                for issue in &issues {
                    warn!("Fixed baseline window incomplete, no target computed: {}", issue);
                }
                return Ok(PixelChangeReport {
                    changes: Vec::new(),
                    issues,
                });
            }
        },
        PixelBaseline::Rolling { .. } => None,
    };

    let outcomes: Vec<(Option<PixelChange>, Vec<DataIssue>)> = targets
        .par_iter()
        .map(|&target| -> Result<(Option<PixelChange>, Vec<DataIssue>)> {
            let Some(observed) = stack.get(&target) else {
                return Ok((None, vec![missing(target)]));
            };
            let window = baseline.window_for(target)?;

            let reference = match &shared {
                Some(raster) => raster.clone(),
                None => match baseline_raster_for_window(stack, &window)? {
                    Ok(raster) => raster,
                    Err(absent) => return Ok((None, absent.into_iter().map(missing).collect())),
                },
            };

            let change = change_rasters(observed, &reference, params)?;
            debug!("Pixel change for {} against {} baseline periods", target, window.len());
            Ok((
                Some(PixelChange {
                    period: target,
                    baseline_periods: window.periods().to_vec(),
                    baseline: reference,
                    change,
                }),
                Vec::new(),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = PixelChangeReport::default();
    for (change, issues) in outcomes {
        for issue in &issues {
            warn!("Skipping pixel change target: {}", issue);
        }
        report.issues.extend(issues);
        report.changes.extend(change);
    }
    Ok(report)
}

fn missing(period: Period) -> DataIssue {
    DataIssue::MissingPeriod {
        unit: GRID_SCOPE.to_string(),
        period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nightglow_core::GeoTransform;

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn make_raster(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(3, 3, value);
        r.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        r
    }

    /// 2023-01..2023-06 at 10, then the listed months
    fn stack_with(extra: &[(&str, f64)]) -> RasterStack {
        let mut stack = RasterStack::new();
        for period in Period::range_inclusive(p("2023-01"), p("2023-06")).unwrap() {
            stack.insert(period, make_raster(10.0).with_period(period));
        }
        for (period, value) in extra {
            stack.insert(p(period), make_raster(*value).with_period(p(period)));
        }
        stack
    }

    #[test]
    fn rolling_baseline_uses_preceding_six_months() {
        let stack = stack_with(&[("2023-07", 15.0)]);
        let report = pixel_changes(&stack, &[p("2023-07")], &PixelBaseline::default(), &ChangeParams::pixel()).unwrap();

        assert!(report.issues.is_empty());
        let change = &report.changes[0];
        assert_eq!(change.baseline_periods.len(), 6);
        assert_eq!(change.baseline_periods[0], p("2023-01"));
        assert_relative_eq!(change.baseline.get(1, 1).unwrap(), 10.0);
        assert_relative_eq!(change.change.percent.get(1, 1).unwrap(), 50.0);
        assert_eq!(change.change.percent.period(), Some(p("2023-07")));
    }

    #[test]
    fn incomplete_window_is_skipped_with_issue() {
        let stack = stack_with(&[("2023-07", 15.0), ("2023-09", 20.0)]);
        let targets = [p("2023-07"), p("2023-09")];
        let report = pixel_changes(&stack, &targets, &PixelBaseline::default(), &ChangeParams::pixel()).unwrap();

        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].period, p("2023-07"));
        assert_eq!(
            report.issues,
            vec![DataIssue::MissingPeriod {
                unit: GRID_SCOPE.to_string(),
                period: p("2023-08"),
            }]
        );
    }

    #[test]
    fn absent_target_is_reported() {
        let stack = stack_with(&[]);
        let report = pixel_changes(&stack, &[p("2023-10")], &PixelBaseline::default(), &ChangeParams::pixel()).unwrap();
        assert!(report.changes.is_empty());
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn fixed_baseline_is_shared_by_targets() {
        let stack = stack_with(&[("2023-08", 15.0), ("2024-01", 0.2)]);
        let window = BaselineWindow::consecutive(p("2023-01"), 6).unwrap();
        let report = pixel_changes(
            &stack,
            &[p("2023-08"), p("2024-01")],
            &PixelBaseline::Fixed(window),
            &ChangeParams::pixel(),
        )
        .unwrap();

        assert_eq!(report.changes.len(), 2);
        assert_relative_eq!(report.changes[0].change.percent.get(0, 0).unwrap(), 50.0);
        assert_relative_eq!(report.changes[1].change.percent.get(0, 0).unwrap(), -98.0, epsilon = 1e-9);
    }

    #[test]
    fn incomplete_fixed_window_is_reported_once() {
        // window 2023-03..2023-10 lacks 07..10; three targets share it
        let stack = stack_with(&[("2023-11", 12.0), ("2023-12", 12.0), ("2024-01", 12.0)]);
        let window = BaselineWindow::consecutive(p("2023-03"), 8).unwrap();
        let report = pixel_changes(
            &stack,
            &[p("2023-11"), p("2023-12"), p("2024-01")],
            &PixelBaseline::Fixed(window),
            &ChangeParams::pixel(),
        )
        .unwrap();

        assert!(report.changes.is_empty());
        let periods: Vec<Period> = report
            .issues
            .iter()
            .map(|issue| match issue {
                DataIssue::MissingPeriod { period, .. } => *period,
                other => panic!("unexpected issue {other:?}"),
            })
            .collect();
        assert_eq!(periods, vec![p("2023-07"), p("2023-08"), p("2023-09"), p("2023-10")]);
    }

    #[test]
    fn mismatched_stack_fails_fast() {
        let mut stack = stack_with(&[]);
        stack.insert(p("2023-07"), Raster::filled(5, 5, 1.0));
        assert!(matches!(
            pixel_changes(&stack, &[p("2023-07")], &PixelBaseline::default(), &ChangeParams::pixel()),
            Err(Error::GridMismatch { .. })
        ));
    }

    #[test]
    fn fixed_mode_requires_start() {
        let config = AnalysisConfig {
            pixel_baseline: BaselineMode::Fixed,
            ..AnalysisConfig::default()
        };
        assert!(PixelBaseline::from_config(&config, None).is_err());
        assert!(matches!(
            PixelBaseline::from_config(&config, Some(p("2023-01"))).unwrap(),
            PixelBaseline::Fixed(_)
        ));
        assert_eq!(
            PixelBaseline::from_config(&AnalysisConfig::default(), None).unwrap(),
            PixelBaseline::Rolling { months: 6 }
        );
    }
}
