//! Run-level entry points
//!
//! Each function takes the run's [`AnalysisConfig`] explicitly and wires the
//! stages together the way the map, change and tabular views need them.
//! Display transforms never feed change computation: map views are built
//! from their own copy of the raw rasters.

use crate::change::{calendar_pair_table, pixel_changes, CalendarChange, ChangeParams, PixelBaseline, PixelChangeReport};
use crate::imagery::{log_compress, mask_to_boundary, MaskParams};
use crate::statistics::{aggregate_stack, AggregationReport};
use crate::temporal::{baseline_window_for, build_paired_series, unit_changes, SeriesReport, UnitChangeReport};
use nightglow_core::raster::{Raster, RasterStack};
use nightglow_core::temporal::{BaselineWindow, Period, TimeSeriesTable};
use nightglow_core::vector::{AdminLevel, Boundary, BoundarySet};
use nightglow_core::{AnalysisConfig, Error, Result};
use std::collections::BTreeMap;
use tracing::info;

/// Masked radiance and its display rendition for one period
#[derive(Debug, Clone)]
pub struct MapView {
    pub masked: Raster<f64>,
    pub compressed: Raster<f64>,
}

/// Mask one raster to `boundary` and log-compress it for display
pub fn map_view(raster: &Raster<f64>, boundary: &Boundary, config: &AnalysisConfig) -> Result<MapView> {
    let masked = mask_to_boundary(raster, boundary, &MaskParams::from(config))?;
    let compressed = log_compress(&masked)?;
    Ok(MapView { masked, compressed })
}

/// Map views for every period of `stack`
pub fn map_views(stack: &RasterStack, boundary: &Boundary, config: &AnalysisConfig) -> Result<BTreeMap<Period, MapView>> {
    config.validate()?;
    stack
        .iter()
        .map(|(period, raster)| map_view(raster, boundary, config).map(|view| (*period, view)))
        .collect()
}

/// Pixel-level change for `targets`.
///
/// `fixed_start` is the first baseline period when the configuration asks
/// for a fixed baseline; it is ignored in rolling mode.
pub fn analyze_pixels(
    stack: &RasterStack,
    targets: &[Period],
    config: &AnalysisConfig,
    fixed_start: Option<Period>,
) -> Result<PixelChangeReport> {
    config.validate()?;
    let baseline = PixelBaseline::from_config(config, fixed_start)?;
    let report = pixel_changes(stack, targets, &baseline, &ChangeParams::pixel_from(config))?;
    info!(
        "Pixel change: {} of {} targets computed",
        report.changes.len(),
        targets.len()
    );
    Ok(report)
}

/// Aggregate `stack` over every boundary of `level`
pub fn aggregate(
    stack: &RasterStack,
    boundaries: &BoundarySet,
    level: AdminLevel,
    config: &AnalysisConfig,
) -> Result<AggregationReport> {
    config.validate()?;
    let units = boundaries.at_level(level);
    if units.is_empty() {
        return Err(Error::InvalidParameter {
            name: "level",
            value: level.to_string(),
            reason: "no boundaries at this level".into(),
        });
    }
    let report = aggregate_stack(stack, &units, config.reduction)?;
    info!(
        "Aggregated {} units at {} into {} records",
        units.len(),
        level,
        report.table.len()
    );
    Ok(report)
}

/// Unit-level results of a run
#[derive(Debug, Clone)]
pub struct UnitAnalysis {
    pub window: BaselineWindow,
    pub changes: UnitChangeReport,
    pub series: SeriesReport,
}

/// Baseline, change table and paired series for every unit in `table`.
///
/// The window covers `config.baseline_months` periods from `baseline_start`,
/// or from the table's earliest period. Returns `None` for an empty table.
pub fn analyze_units(
    table: &TimeSeriesTable,
    baseline_start: Option<Period>,
    config: &AnalysisConfig,
) -> Result<Option<UnitAnalysis>> {
    config.validate()?;
    let Some(window) = baseline_window_for(table, baseline_start, config.baseline_months)? else {
        return Ok(None);
    };
    let changes = unit_changes(table, &window, &ChangeParams::aggregate_from(config));
    let series = build_paired_series(table, window.first(), &window)?;
    info!(
        "Baseline {}..{}: {} units, {} change records",
        window.first(),
        window.last(),
        table.unit_count(),
        changes.records.len()
    );
    Ok(Some(UnitAnalysis { window, changes, series }))
}

/// Like-month comparison of two years for every unit
pub fn calendar_changes(
    table: &TimeSeriesTable,
    previous_year: i32,
    current_year: i32,
    config: &AnalysisConfig,
) -> Result<Vec<CalendarChange>> {
    config.validate()?;
    calendar_pair_table(table, previous_year, current_year, &ChangeParams::aggregate_from(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Polygon};
    use nightglow_core::GeoTransform;

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn make_raster(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(4, 4, value);
        r.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        r
    }

    fn rect(code: &str, level: AdminLevel, x0: f64, x1: f64) -> Boundary {
        let poly = Polygon::new(
            LineString::from(vec![(x0, 0.0), (x1, 0.0), (x1, 4.0), (x0, 4.0), (x0, 0.0)]),
            vec![],
        );
        Boundary::new(code, level, MultiPolygon::new(vec![poly]))
    }

    #[test]
    fn map_view_masks_then_compresses() {
        let mut raster = make_raster(10.0);
        raster.set(0, 0, 0.0).unwrap();
        let view = map_view(&raster, &rect("L", AdminLevel::Adm1, 0.0, 2.0), &AnalysisConfig::default()).unwrap();

        assert!(view.masked.get(0, 0).unwrap().is_nan());
        assert!(view.masked.get(0, 3).unwrap().is_nan());
        assert_eq!(view.masked.get(1, 1).unwrap(), 10.0);
        assert!(view.compressed.get(1, 1).unwrap() < 10.0);
        // raw input untouched
        assert_eq!(raster.get(1, 1).unwrap(), 10.0);
    }

    #[test]
    fn aggregate_selects_level() {
        let mut stack = RasterStack::new();
        stack.insert(p("2023-01"), make_raster(1.0));
        let boundaries: BoundarySet = vec![
            rect("NAT", AdminLevel::Adm0, 0.0, 4.0),
            rect("W", AdminLevel::Adm1, 0.0, 2.0),
            rect("E", AdminLevel::Adm1, 2.0, 4.0),
        ]
        .into_iter()
        .collect();

        let config = AnalysisConfig::default();
        let regions = aggregate(&stack, &boundaries, AdminLevel::Adm1, &config).unwrap();
        assert_eq!(regions.table.unit_count(), 2);
        assert_eq!(regions.table.get("W", &p("2023-01")), Some(8.0));

        let national = aggregate(&stack, &boundaries, AdminLevel::Adm0, &config).unwrap();
        assert_eq!(national.table.get("NAT", &p("2023-01")), Some(16.0));

        assert!(aggregate(&stack, &boundaries, AdminLevel::Adm3, &config).is_err());
    }

    #[test]
    fn unit_analysis_on_empty_table() {
        assert!(analyze_units(&TimeSeriesTable::new(), None, &AnalysisConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AnalysisConfig {
            baseline_months: 0,
            ..AnalysisConfig::default()
        };
        assert!(analyze_pixels(&RasterStack::new(), &[], &config, None).is_err());
    }
}
