//! Double-log compression for map display
//!
//! Nighttime radiance is heavy-tailed: a handful of city-centre cells are
//! orders of magnitude brighter than rural ones. The transform
//!
//!   f(v) = ln(ln(v + 1) + 1)
//!
//! flattens that range so a linear colour scale shows structure everywhere,
//! while keeping the ordering of cells. Its output is for display only;
//! change computations always use raw radiance.

use crate::maybe_rayon::*;
use nightglow_core::raster::Raster;
use nightglow_core::{Algorithm, Error, Result};

/// Double-log compression stage
#[derive(Debug, Clone, Default)]
pub struct LogCompressor;

impl Algorithm for LogCompressor {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "LogCompressor"
    }

    fn description(&self) -> &'static str {
        "Apply ln(ln(v+1)+1) to every defined cell for display"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        log_compress(&input)
    }
}

/// `ln(ln(v+1)+1)` for one value; `NaN` where the transform is undefined
pub fn log_compress_value(v: f64) -> f64 {
    if !v.is_finite() {
        return f64::NAN;
    }
    let inner = v.ln_1p();
    if !(inner > -1.0) {
        return f64::NAN;
    }
    let out = inner.ln_1p();
    if out.is_finite() {
        out
    } else {
        f64::NAN
    }
}

/// Apply double-log compression to every defined cell.
///
/// No-data cells (per the raster's sentinel, or `NaN`) stay no-data.
pub fn log_compress(raster: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let v = unsafe { raster.get_unchecked(row, col) };
                if raster.is_nodata(v) {
                    continue;
                }
                row_data[col] = log_compress_value(v);
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    output.replace_data(data)?;
    Ok(output)
}
