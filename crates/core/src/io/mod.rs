//! Ingestion and export helpers: GeoTIFF rasters, GeoJSON boundaries, CSV tables

mod boundaries;
mod native;
mod table;

pub use boundaries::{parse_boundaries, read_boundaries, BoundaryFields};
pub use native::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
pub use table::{read_table, read_table_from, write_rows, write_table};
