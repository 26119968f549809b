//! Raster data structures

mod element;
mod geotransform;
mod grid;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};

use crate::temporal::Period;
use std::collections::BTreeMap;

/// Co-registered rasters keyed by acquisition period, in chronological order
pub type RasterStack = BTreeMap<Period, Raster<f64>>;
