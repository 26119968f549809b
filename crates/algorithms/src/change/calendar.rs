//! Calendar-pair change: each month of one year against the same month of
//! an earlier year. Months missing from either year are dropped.

use super::percent::{compute_change, ChangeParams};
use nightglow_core::temporal::{Period, TimeSeriesTable, UnitSeries};
use nightglow_core::Result;
use serde::Serialize;
use tracing::debug;

/// Like-month comparison between two years for one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarChange {
    pub unit_id: String,
    /// Calendar month, 1-12
    pub month: u32,
    pub previous_year: i32,
    pub current_year: i32,
    pub previous: f64,
    pub current: f64,
    pub absolute_change: f64,
    pub percent_change: Option<f64>,
    pub percent_change_raw: Option<f64>,
}

/// Like-month changes from `previous_year` to `current_year` for one unit.
///
/// Only months observed in both years are emitted, in calendar order.
pub fn calendar_pair_change(
    unit_id: &str,
    series: &UnitSeries,
    previous_year: i32,
    current_year: i32,
    params: &ChangeParams,
) -> Result<Vec<CalendarChange>> {
    let mut out = Vec::new();
    for month in 1..=12 {
        let prev = series.get(&Period::month(previous_year, month)?).copied();
        let cur = series.get(&Period::month(current_year, month)?).copied();
        let (Some(previous), Some(current)) = (prev, cur) else {
            continue;
        };
        let change = compute_change(Some(current), Some(previous), params);
        out.push(CalendarChange {
            unit_id: unit_id.to_string(),
            month,
            previous_year,
            current_year,
            previous,
            current,
            absolute_change: current - previous,
            percent_change: change.percent,
            percent_change_raw: change.percent_raw,
        });
    }
    Ok(out)
}

/// Like-month changes for every unit in `table`, ordered by unit then month
pub fn calendar_pair_table(
    table: &TimeSeriesTable,
    previous_year: i32,
    current_year: i32,
    params: &ChangeParams,
) -> Result<Vec<CalendarChange>> {
    let mut out = Vec::new();
    for (unit_id, series) in table.iter() {
        let rows = calendar_pair_change(unit_id, series, previous_year, current_year, params)?;
        debug!("{}: {} comparable months", unit_id, rows.len());
        out.extend(rows);
    }
    Ok(out)
}
