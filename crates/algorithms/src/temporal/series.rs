//! Paired series on a shared date axis
//!
//! Each unit gets two sequences over the same axis: its full series and a
//! baseline-only copy that is undefined outside the baseline window.
//! Renderers draw them as overlaid small multiples, so a missing
//! observation must stay in place as `None` instead of being dropped.

use crate::maybe_rayon::*;
use nightglow_core::temporal::{BaselineWindow, Period, TimeSeriesTable, UnitSeries};
use nightglow_core::{Algorithm, DataIssue, Error, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// Full and baseline-only values of one unit on a shared axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedSeries {
    pub unit_id: String,
    pub axis: Vec<Period>,
    pub full: Vec<Option<f64>>,
    pub baseline: Vec<Option<f64>>,
}

impl PairedSeries {
    /// Positions where the full series has a value
    pub fn observed(&self) -> usize {
        self.full.iter().flatten().count()
    }
}

/// Paired series for every unit plus the gaps found
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesReport {
    pub axis: Vec<Period>,
    pub series: Vec<PairedSeries>,
    pub issues: Vec<DataIssue>,
}

/// Every period from `start` through `last`, stepping by the grain
pub fn date_axis(start: Period, last: Period) -> Result<Vec<Period>> {
    Period::range_inclusive(start, last)
}

/// Align one unit's observations to `axis`
pub fn paired_series(unit_id: &str, series: &UnitSeries, axis: &[Period], window: &BaselineWindow) -> PairedSeries {
    let full: Vec<Option<f64>> = axis.iter().map(|p| series.get(p).copied()).collect();
    let baseline = axis
        .iter()
        .zip(&full)
        .map(|(p, v)| if window.contains(p) { *v } else { None })
        .collect();
    PairedSeries {
        unit_id: unit_id.to_string(),
        axis: axis.to_vec(),
        full,
        baseline,
    }
}

/// Paired series for all units from `start` to the table's latest period.
///
/// Observations before `start` are left out. Each axis position a unit has
/// no observation for is reported as a `MissingPeriod` issue.
pub fn build_paired_series(table: &TimeSeriesTable, start: Period, window: &BaselineWindow) -> Result<SeriesReport> {
    let Some(last) = table.last_period() else {
        return Ok(SeriesReport::default());
    };
    let axis = date_axis(start, last)?;
    debug!("Series axis {}..{} ({} periods)", start, last, axis.len());

    let units: Vec<(&str, &UnitSeries)> = table.iter().collect();
    let series: Vec<PairedSeries> = units
        .par_iter()
        .map(|(unit_id, s)| paired_series(unit_id, s, &axis, window))
        .collect();

    let mut issues = Vec::new();
    for s in &series {
        for (period, value) in s.axis.iter().zip(&s.full) {
            if value.is_none() {
                let issue = DataIssue::MissingPeriod {
                    unit: s.unit_id.clone(),
                    period: *period,
                };
                warn!("{}", issue);
                issues.push(issue);
            }
        }
    }

    Ok(SeriesReport { axis, series, issues })
}

/// Series-assembly stage
#[derive(Debug, Clone, Default)]
pub struct TemporalSeriesBuilder;

impl Algorithm for TemporalSeriesBuilder {
    /// (table, axis start, baseline window)
    type Input = (TimeSeriesTable, Period, BaselineWindow);
    type Output = SeriesReport;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "TemporalSeriesBuilder"
    }

    fn description(&self) -> &'static str {
        "Align unit series to a shared date axis with a baseline-only companion"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        let (table, start, window) = input;
        build_paired_series(&table, start, &window)
    }
}
