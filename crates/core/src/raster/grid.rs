//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use crate::temporal::Period;
use ndarray::Array2;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with its affine
/// transform, an optional no-data sentinel and an optional acquisition
/// period. Two rasters describe the same grid when their shapes match and
/// their transforms are aligned (see [`Raster::ensure_same_grid`]).
///
/// # Example
///
/// ```ignore
/// use nightglow_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 42.0)?;
/// let value = raster.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    transform: GeoTransform,
    nodata: Option<T>,
    period: Option<Period>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
            period: None,
        }
    }

    /// Create a zero-filled raster on the same grid, with a different cell type.
    ///
    /// The no-data sentinel is not carried over.
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            nodata: None,
            period: self.period,
        }
    }

    /// Create a raster with the same dimensions and metadata, filled with a value
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
            nodata: self.nodata,
            period: self.period,
        }
    }

    // Dimensions

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Replace the cell data, keeping the grid.
    ///
    /// `data` must have exactly `rows * cols` values in row-major order.
    pub fn replace_data(&mut self, data: Vec<T>) -> Result<()> {
        let (rows, cols) = self.shape();
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        self.data =
            Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
        Ok(())
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Acquisition period label
    pub fn period(&self) -> Option<Period> {
        self.period
    }

    pub fn set_period(&mut self, period: Option<Period>) {
        self.period = period;
    }

    /// Builder-style period setter
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Geographic coordinates of a cell centre
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Fail unless `other` lies on exactly the same grid.
    ///
    /// Comparing or averaging rasters on different grids would silently
    /// misalign cells, so every multi-raster operation calls this first.
    pub fn ensure_same_grid<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        if self.shape() != other.shape() || !self.transform.is_aligned_with(other.transform()) {
            return Err(Error::GridMismatch {
                expected: self.grid_description(),
                actual: other.grid_description(),
            });
        }
        Ok(())
    }

    fn grid_description(&self) -> String {
        let gt = &self.transform;
        format!(
            "{}x{} cells at ({}, {}) step ({}, {})",
            self.cols(),
            self.rows(),
            gt.origin_x,
            gt.origin_y,
            gt.pixel_width,
            gt.pixel_height
        )
    }

    // Value checks

    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Defined cell values as f64, in row-major order
    pub fn defined_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data
            .iter()
            .filter(|v| !self.is_nodata(**v))
            .filter_map(|v| v.to_f64())
    }

    // Statistics

    /// Basic statistics over defined cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }

            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }

            if let Some(v) = value.to_f64() {
                sum += v;
                count += 1;
            }
        }

        let mean = (count > 0).then(|| sum / count as f64);

        RasterStatistics {
            min,
            max,
            sum: (count > 0).then_some(sum),
            mean,
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    /// Sum of defined cells; `None` when no cell is defined
    pub sum: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}
