//! Unit time series: change tables and aligned series for rendering

pub mod series;
pub mod unit_change;

pub use series::{build_paired_series, date_axis, paired_series, PairedSeries, SeriesReport, TemporalSeriesBuilder};
pub use unit_change::{baseline_window_for, unit_change, unit_changes, ChangeRecord, UnitBaseline, UnitChangeReport};
