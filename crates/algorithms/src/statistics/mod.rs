//! Spatial reduction of rasters to per-unit values
//!
//! - **zonal**: sum or mean of defined cells inside each administrative unit

pub mod zonal;

pub use zonal::{
    aggregate_period, aggregate_stack, rasterize_boundaries, zonal_aggregates, AggregationReport, SpatialAggregator,
    ZonalAggregate, ZoneIndex,
};
