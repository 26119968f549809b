//! # nightglow core
//!
//! Core types, traits and I/O for nighttime-light change analysis.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced grid with a no-data sentinel and period label
//! - `Boundary` / `BoundarySet`: administrative units keyed by code
//! - `Period`, `TimeSeriesTable`, `BaselineWindow`: the temporal data model
//! - `AnalysisConfig`: thresholds and policies for a run
//! - `DataIssue`: recoverable per-unit conditions
//! - I/O for GeoTIFF, GeoJSON and CSV

pub mod config;
pub mod error;
pub mod io;
pub mod issue;
pub mod raster;
pub mod temporal;
pub mod vector;

pub use config::{AnalysisConfig, BaselineMode, Reduction};
pub use error::{Error, Result};
pub use issue::{BaselineProblem, DataIssue, GRID_SCOPE};
pub use raster::{GeoTransform, Raster, RasterElement, RasterStack};
pub use temporal::{BaselineWindow, Grain, Period, TimeSeriesRecord, TimeSeriesTable, UnitSeries};
pub use vector::{AdminLevel, Boundary, BoundarySet};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::error::{Error, Result};
    pub use crate::issue::DataIssue;
    pub use crate::raster::{GeoTransform, Raster, RasterElement, RasterStack};
    pub use crate::temporal::{BaselineWindow, Period, TimeSeriesRecord, TimeSeriesTable};
    pub use crate::vector::{AdminLevel, Boundary, BoundarySet};
    pub use crate::Algorithm;
}

/// Core trait for the analysis stages.
///
/// Stages are pure functions that transform input data according to parameters.
pub trait Algorithm {
    type Input;
    type Output;
    /// Parameters controlling the stage
    type Params: Default;
    type Error: std::error::Error;

    /// Returns the stage name
    fn name(&self) -> &'static str;

    /// Returns a description of what the stage does
    fn description(&self) -> &'static str;

    /// Execute the stage
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
