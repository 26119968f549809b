//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether two grids are co-registered
const GRID_TOLERANCE: f64 = 1e-9;

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// NTL composites are distributed north-up, so the rotation terms are
/// normally zero and `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y, usually negative
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a north-up transform
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Geographic coordinates of a cell centre
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.corner(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Geographic coordinates of a cell's top-left corner
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.corner(col as f64, row as f64)
    }

    fn corner(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Cell size (assumes square cells and no rotation)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Bounding box (min_x, min_y, max_x, max_y) of a `width` x `height` grid
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let corners = [
            self.pixel_to_geo_corner(0, 0),
            self.pixel_to_geo_corner(width, 0),
            self.pixel_to_geo_corner(0, height),
            self.pixel_to_geo_corner(width, height),
        ];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Whether two transforms describe the same grid origin and resolution
    pub fn is_aligned_with(&self, other: &GeoTransform) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= GRID_TOLERANCE * a.abs().max(b.abs()).max(1.0);
        close(self.origin_x, other.origin_x)
            && close(self.origin_y, other.origin_y)
            && close(self.pixel_width, other.pixel_width)
            && close(self.pixel_height, other.pixel_height)
            && close(self.row_rotation, other.row_rotation)
            && close(self.col_rotation, other.col_rotation)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_to_geo_is_cell_centre() {
        let gt = GeoTransform::new(96.0, 28.5, 0.25, -0.25);

        let (x, y) = gt.pixel_to_geo(5, 10);
        assert_relative_eq!(x, 97.375, epsilon = 1e-12);
        assert_relative_eq!(y, 25.875, epsilon = 1e-12);

        let (cx, cy) = gt.pixel_to_geo_corner(5, 10);
        assert_relative_eq!(cx, 97.25, epsilon = 1e-12);
        assert_relative_eq!(cy, 26.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 50);

        assert_relative_eq!(min_x, 0.0);
        assert_relative_eq!(min_y, 50.0);
        assert_relative_eq!(max_x, 100.0);
        assert_relative_eq!(max_y, 100.0);
    }

    #[test]
    fn test_alignment() {
        let a = GeoTransform::new(10.0, 20.0, 0.5, -0.5);
        let b = GeoTransform::new(10.0, 20.0, 0.5, -0.5);
        let c = GeoTransform::new(10.5, 20.0, 0.5, -0.5);
        assert!(a.is_aligned_with(&b));
        assert!(!a.is_aligned_with(&c));
    }
}
