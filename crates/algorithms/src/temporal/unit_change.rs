//! Unit-level change table
//!
//! Each unit's baseline is the mean of its observations inside the run's
//! baseline window; every later observation is compared against it.

use crate::change::{baseline_mean, compute_change, ChangeParams};
use crate::maybe_rayon::*;
use nightglow_core::temporal::{BaselineWindow, Period, TimeSeriesTable, UnitSeries};
use nightglow_core::{DataIssue, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// Change of one unit's observation against that unit's baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub unit_id: String,
    pub period: Period,
    pub value: f64,
    pub baseline: Option<f64>,
    pub absolute_change: Option<f64>,
    /// Clamped
    pub percent_change: Option<f64>,
    pub percent_change_raw: Option<f64>,
}

/// Baseline of one unit and how many window observations formed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitBaseline {
    pub unit_id: String,
    pub baseline: Option<f64>,
    pub observations: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UnitChangeReport {
    /// Ordered by unit then period
    pub records: Vec<ChangeRecord>,
    pub baselines: Vec<UnitBaseline>,
    pub issues: Vec<DataIssue>,
}

impl UnitChangeReport {
    /// Records of one unit
    pub fn unit(&self, unit_id: &str) -> impl Iterator<Item = &ChangeRecord> + '_ {
        let unit_id = unit_id.to_string();
        self.records.iter().filter(move |r| r.unit_id == unit_id)
    }

    pub fn get(&self, unit_id: &str, period: &Period) -> Option<&ChangeRecord> {
        self.records
            .iter()
            .find(|r| r.unit_id == unit_id && r.period == *period)
    }
}

/// Change records for one unit, for every period after the window
pub fn unit_change(
    unit_id: &str,
    series: &UnitSeries,
    window: &BaselineWindow,
    params: &ChangeParams,
) -> (UnitBaseline, Vec<ChangeRecord>, Option<DataIssue>) {
    let baseline = baseline_mean(series, window);
    let observations = window.iter().filter(|p| series.contains_key(p)).count();

    let issue = params
        .baseline_problem(baseline)
        .map(|problem| DataIssue::UndefinedBaseline {
            unit: unit_id.to_string(),
            problem,
        });

    let records = series
        .range(window.last()..)
        .filter(|(p, _)| **p > window.last())
        .map(|(period, &value)| {
            let change = compute_change(Some(value), baseline, params);
            ChangeRecord {
                unit_id: unit_id.to_string(),
                period: *period,
                value,
                baseline,
                absolute_change: change.absolute,
                percent_change: change.percent,
                percent_change_raw: change.percent_raw,
            }
        })
        .collect();

    (
        UnitBaseline {
            unit_id: unit_id.to_string(),
            baseline,
            observations,
        },
        records,
        issue,
    )
}

/// Change records for every unit in `table`.
///
/// A unit whose baseline is missing or not above the threshold still gets
/// its records, with undefined percent change, plus an `UndefinedBaseline`
/// issue. Other units are unaffected.
pub fn unit_changes(table: &TimeSeriesTable, window: &BaselineWindow, params: &ChangeParams) -> UnitChangeReport {
    let units: Vec<(&str, &UnitSeries)> = table.iter().collect();
    let per_unit: Vec<_> = units
        .par_iter()
        .map(|(unit_id, series)| unit_change(unit_id, series, window, params))
        .collect();

    let mut report = UnitChangeReport::default();
    for (baseline, records, issue) in per_unit {
        if let Some(issue) = issue {
            warn!("{}", issue);
            report.issues.push(issue);
        }
        report.baselines.push(baseline);
        report.records.extend(records);
    }
    debug!(
        "{} change records for {} units after {}",
        report.records.len(),
        report.baselines.len(),
        window.last()
    );
    report
}

/// Window of `count` consecutive periods starting at `start`, or at the
/// table's earliest period when `start` is `None`
pub fn baseline_window_for(table: &TimeSeriesTable, start: Option<Period>, count: usize) -> Result<Option<BaselineWindow>> {
    match start.or_else(|| table.first_period()) {
        Some(first) => BaselineWindow::consecutive(first, count).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nightglow_core::{BaselineProblem, TimeSeriesRecord};

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn window() -> BaselineWindow {
        BaselineWindow::consecutive(p("2023-01"), 6).unwrap()
    }

    fn records_for(unit: &str, baseline: f64, later: &[(&str, f64)]) -> Vec<TimeSeriesRecord> {
        let mut out: Vec<TimeSeriesRecord> = window()
            .iter()
            .map(|&period| TimeSeriesRecord::new(unit, period, baseline))
            .collect();
        out.extend(later.iter().map(|(period, v)| TimeSeriesRecord::new(unit, p(period), *v)));
        out
    }

    #[test]
    fn records_after_window_only() {
        let table = TimeSeriesTable::from_records(records_for("A", 10.0, &[("2023-08", 15.0), ("2024-01", 0.2)])).unwrap();
        let report = unit_changes(&table, &window(), &ChangeParams::aggregate());

        assert_eq!(report.records.len(), 2);
        let aug = report.get("A", &p("2023-08")).unwrap();
        assert_relative_eq!(aug.baseline.unwrap(), 10.0);
        assert_relative_eq!(aug.absolute_change.unwrap(), 5.0);
        assert_relative_eq!(aug.percent_change.unwrap(), 50.0);
        let jan = report.get("A", &p("2024-01")).unwrap();
        assert_relative_eq!(jan.percent_change.unwrap(), -98.0, epsilon = 1e-9);
        assert!(report.issues.is_empty());
        assert_eq!(report.baselines[0].observations, 6);
    }

    #[test]
    fn undefined_baseline_affects_only_its_unit() {
        let mut records = records_for("GOOD", 10.0, &[("2023-07", 20.0)]);
        records.push(TimeSeriesRecord::new("LATE", p("2023-07"), 5.0));
        let table = TimeSeriesTable::from_records(records).unwrap();

        let report = unit_changes(&table, &window(), &ChangeParams::aggregate());

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].unit(), "LATE");
        assert_eq!(
            report.issues[0],
            DataIssue::UndefinedBaseline {
                unit: "LATE".into(),
                problem: BaselineProblem::NoObservations,
            }
        );
        let late = report.get("LATE", &p("2023-07")).unwrap();
        assert_eq!(late.percent_change, None);
        assert_eq!(late.absolute_change, None);
        assert_relative_eq!(report.get("GOOD", &p("2023-07")).unwrap().percent_change.unwrap(), 100.0);
    }

    #[test]
    fn zero_baseline_is_below_aggregate_threshold() {
        let table = TimeSeriesTable::from_records(records_for("DARK", 0.0, &[("2023-09", 3.0)])).unwrap();
        let report = unit_changes(&table, &window(), &ChangeParams::aggregate());
        assert!(matches!(
            report.issues[0],
            DataIssue::UndefinedBaseline {
                problem: BaselineProblem::BelowThreshold { .. },
                ..
            }
        ));
        assert_eq!(report.unit("DARK").count(), 1);
        assert_eq!(report.records[0].absolute_change, Some(3.0));
    }

    #[test]
    fn window_defaults_to_first_period() {
        let table = TimeSeriesTable::from_records(records_for("A", 1.0, &[])).unwrap();
        let w = baseline_window_for(&table, None, 6).unwrap().unwrap();
        assert_eq!(w, window());
        assert!(baseline_window_for(&TimeSeriesTable::new(), None, 6).unwrap().is_none());
    }
}
