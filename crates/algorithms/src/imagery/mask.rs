//! Boundary masking
//!
//! Clips a radiance raster to an administrative boundary without changing its
//! grid: cells whose centre falls outside the boundary become no-data, as do
//! cells holding the "no light" sentinel.

use crate::maybe_rayon::*;
use ndarray::Array2;
use nightglow_core::raster::{Raster, RasterElement};
use nightglow_core::vector::Boundary;
use nightglow_core::{AnalysisConfig, Algorithm, Error, Result};
use tracing::debug;

/// Parameters for boundary masking
#[derive(Debug, Clone)]
pub struct MaskParams {
    /// Cells equal to this value are set to no-data; `None` keeps them
    pub zero_sentinel: Option<f64>,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            zero_sentinel: Some(0.0),
        }
    }
}

impl From<&AnalysisConfig> for MaskParams {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            zero_sentinel: config.zero_sentinel(),
        }
    }
}

/// Boundary masking stage
#[derive(Debug, Clone, Default)]
pub struct RasterMasker;

impl Algorithm for RasterMasker {
    type Input = (Raster<f64>, Boundary);
    type Output = Raster<f64>;
    type Params = MaskParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "RasterMasker"
    }

    fn description(&self) -> &'static str {
        "Set cells outside a boundary, and no-light sentinel cells, to no-data"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (raster, boundary) = input;
        mask_to_boundary(&raster, &boundary, &params)
    }
}

/// Cells of `template`'s grid whose centre lies inside or on `boundary`.
///
/// A boundary whose envelope misses the raster extent yields an all-`false`
/// mask.
pub fn boundary_mask<T: RasterElement>(template: &Raster<T>, boundary: &Boundary) -> Result<Array2<bool>> {
    let (rows, cols) = template.shape();

    if !boundary.intersects_extent(template.bounds()) {
        debug!("Boundary {} does not overlap the raster extent", boundary.code());
        return Ok(Array2::from_elem((rows, cols), false));
    }

    let flags: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let (x, y) = template.pixel_to_geo(col, row);
                    boundary.covers_point(x, y)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Array2::from_shape_vec((rows, cols), flags).map_err(|e| Error::Other(e.to_string()))
}

/// Mask a raster to a boundary.
///
/// The output keeps the input grid and period, uses `NaN` as no-data, and
/// never defines a cell that was no-data in the input.
pub fn mask_to_boundary(raster: &Raster<f64>, boundary: &Boundary, params: &MaskParams) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();
    let inside = boundary_mask(raster, boundary)?;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                if !inside[(row, col)] {
                    continue;
                }
                let v = unsafe { raster.get_unchecked(row, col) };
                if raster.is_nodata(v) || params.zero_sentinel == Some(v) {
                    continue;
                }
                row_data[col] = v;
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    output.replace_data(data)?;
    Ok(output)
}
