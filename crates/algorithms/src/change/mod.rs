//! Baselines and change against them
//!
//! - [`baseline`]: window means, scalar and per cell
//! - [`percent`]: absolute and clamped percent change
//! - [`pixel`]: per-target change rasters over a monthly stack
//! - [`calendar`]: like-month comparison between two years

pub mod baseline;
pub mod calendar;
pub mod percent;
pub mod pixel;

pub use baseline::{baseline_mean, baseline_raster, baseline_raster_for_window, BaselineEstimator};
pub use calendar::{calendar_pair_change, calendar_pair_table, CalendarChange};
pub use percent::{
    clamp_percent, compute_change, change_rasters, percent_change, Change, ChangeCalculator, ChangeParams,
    ChangeRasters, AGGREGATE_MIN_BASELINE, PIXEL_MIN_BASELINE,
};
pub use pixel::{pixel_changes, PixelBaseline, PixelChange, PixelChangeReport};
