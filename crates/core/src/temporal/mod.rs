//! Periods, time-series tables and baseline windows

mod period;
mod series;
mod window;

pub use period::{Grain, Period};
pub use series::{TimeSeriesRecord, TimeSeriesTable, UnitSeries};
pub use window::BaselineWindow;
