//! # nightglow algorithms
//!
//! Analysis stages for nighttime-light change.
//!
//! ## Available Stages
//!
//! - **imagery**: boundary masking, double-log compression for display
//! - **change**: baselines, absolute/percent change, pixel-level and calendar-pair modes
//! - **statistics**: zonal reduction of rasters to per-unit time series
//! - **temporal**: unit-level change tables, paired series on a shared date axis
//! - **workflow**: run-level entry points taking an explicit `AnalysisConfig`

pub mod change;
pub mod imagery;
pub(crate) mod maybe_rayon;
pub mod statistics;
pub mod temporal;
pub mod workflow;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{
        baseline_mean, baseline_raster, calendar_pair_table, change_rasters, compute_change, pixel_changes,
        BaselineEstimator, CalendarChange, Change, ChangeCalculator, ChangeParams, PixelBaseline,
    };
    pub use crate::imagery::{log_compress, mask_to_boundary, LogCompressor, MaskParams, RasterMasker};
    pub use crate::statistics::{aggregate_stack, AggregationReport, SpatialAggregator};
    pub use crate::temporal::{
        build_paired_series, unit_changes, ChangeRecord, PairedSeries, TemporalSeriesBuilder, UnitChangeReport,
    };
    pub use crate::workflow::{aggregate, analyze_pixels, analyze_units, calendar_changes, map_views};
    pub use nightglow_core::prelude::*;
}
