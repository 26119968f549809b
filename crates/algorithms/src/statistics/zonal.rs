//! Zonal aggregation
//!
//! Reduces the defined cells of each raster in a stack to one value per
//! administrative unit. Units are burned into an integer zone raster once
//! (cell centre on or inside, first boundary wins, 0 = no unit), then every
//! period is reduced against that zone raster.

use crate::imagery::boundary_mask;
use crate::maybe_rayon::*;
use nightglow_core::raster::{Raster, RasterElement, RasterStack};
use nightglow_core::temporal::{Period, TimeSeriesRecord, TimeSeriesTable};
use nightglow_core::vector::Boundary;
use nightglow_core::{Algorithm, DataIssue, Error, Reduction, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// Integer zone raster plus the unit code of each zone id
#[derive(Debug, Clone)]
pub struct ZoneIndex {
    zones: Raster<i32>,
    /// `codes[id - 1]` is the unit of zone `id`
    codes: Vec<String>,
}

impl ZoneIndex {
    pub fn zones(&self) -> &Raster<i32> {
        &self.zones
    }

    /// Unit codes in zone-id order
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Unit code for a zone id; `None` for 0 and unknown ids
    pub fn code(&self, zone: i32) -> Option<&str> {
        usize::try_from(zone)
            .ok()
            .and_then(|z| z.checked_sub(1))
            .and_then(|i| self.codes.get(i))
            .map(String::as_str)
    }

    /// Number of cells assigned to each unit, in zone-id order
    pub fn footprint_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.codes.len()];
        for &zone in self.zones.data().iter() {
            if zone > 0 {
                sizes[(zone - 1) as usize] += 1;
            }
        }
        sizes
    }
}

/// Burn `boundaries` into a zone raster on `template`'s grid.
///
/// A cell belongs to the first boundary covering its centre, so a centre on
/// an edge shared by two units goes to the earlier one. Boundaries at one
/// administrative level are expected not to overlap.
pub fn rasterize_boundaries<T: RasterElement>(template: &Raster<T>, boundaries: &[&Boundary]) -> Result<ZoneIndex> {
    let (rows, cols) = template.shape();
    let mut zones: Raster<i32> = template.with_same_meta(rows, cols);
    zones.set_nodata(Some(0));
    zones.set_period(None);

    let masks = boundaries
        .iter()
        .map(|b| boundary_mask(template, b))
        .collect::<Result<Vec<_>>>()?;

    let data: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0i32; cols];
            for col in 0..cols {
                if let Some(idx) = masks.iter().position(|m| m[(row, col)]) {
                    row_data[col] = idx as i32 + 1;
                }
            }
            row_data
        })
        .collect();
    zones.replace_data(data)?;

    Ok(ZoneIndex {
        zones,
        codes: boundaries.iter().map(|b| b.code().to_string()).collect(),
    })
}

/// Defined-cell count and sum of one unit for one raster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZonalAggregate {
    pub unit_id: String,
    pub count: usize,
    pub sum: f64,
}

impl ZonalAggregate {
    /// Reduced value; `None` when no cell contributed
    pub fn value(&self, reduction: Reduction) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(match reduction {
            Reduction::Sum => self.sum,
            Reduction::Mean => self.sum / self.count as f64,
        })
    }
}

/// Count and sum of defined cells per unit, one entry per unit in zone order
pub fn zonal_aggregates(values: &Raster<f64>, index: &ZoneIndex) -> Result<Vec<ZonalAggregate>> {
    values.ensure_same_grid(&index.zones)?;
    let (rows, cols) = values.shape();

    let mut acc = vec![(0usize, 0.0f64); index.codes.len()];
    for row in 0..rows {
        for col in 0..cols {
            let zone = unsafe { index.zones.get_unchecked(row, col) };
            if zone == 0 {
                continue;
            }
            let v = unsafe { values.get_unchecked(row, col) };
            if values.is_nodata(v) {
                continue;
            }
            let slot = &mut acc[(zone - 1) as usize];
            slot.0 += 1;
            slot.1 += v;
        }
    }

    Ok(index
        .codes
        .iter()
        .zip(acc)
        .map(|(code, (count, sum))| ZonalAggregate {
            unit_id: code.clone(),
            count,
            sum,
        })
        .collect())
}

/// Records and issues for one period
pub fn aggregate_period(
    values: &Raster<f64>,
    period: Period,
    index: &ZoneIndex,
    reduction: Reduction,
) -> Result<(Vec<TimeSeriesRecord>, Vec<DataIssue>)> {
    let mut records = Vec::new();
    let mut issues = Vec::new();
    for agg in zonal_aggregates(values, index)? {
        match agg.value(reduction) {
            Some(value) => records.push(TimeSeriesRecord::new(agg.unit_id, period, value)),
            None => issues.push(DataIssue::SpatialMismatch {
                unit: agg.unit_id,
                period: Some(period),
            }),
        }
    }
    Ok((records, issues))
}

/// Aggregated table plus the units that produced no value
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    pub table: TimeSeriesTable,
    pub issues: Vec<DataIssue>,
}

/// Reduce every raster of `stack` to one record per unit and period.
///
/// All rasters must share one grid. A unit with no defined cell in a period
/// gets no record for it and a `SpatialMismatch` issue instead.
pub fn aggregate_stack(stack: &RasterStack, boundaries: &[&Boundary], reduction: Reduction) -> Result<AggregationReport> {
    let Some(first) = stack.values().next() else {
        return Ok(AggregationReport::default());
    };
    for raster in stack.values().skip(1) {
        first.ensure_same_grid(raster)?;
    }

    let index = rasterize_boundaries(first, boundaries)?;
    for (code, size) in index.codes().iter().zip(index.footprint_sizes()) {
        debug!("Unit {} covers {} cells", code, size);
    }

    let periods: Vec<(&Period, &Raster<f64>)> = stack.iter().collect();
    let per_period = periods
        .par_iter()
        .map(|(period, raster)| aggregate_period(raster, **period, &index, reduction))
        .collect::<Result<Vec<_>>>()?;

    let mut report = AggregationReport::default();
    for (records, issues) in per_period {
        for record in records {
            report.table.insert(record)?;
        }
        for issue in &issues {
            warn!("{}", issue);
        }
        report.issues.extend(issues);
    }
    debug!(
        "Aggregated {} periods into {} records",
        stack.len(),
        report.table.len()
    );
    Ok(report)
}

/// Spatial aggregation stage
#[derive(Debug, Clone, Default)]
pub struct SpatialAggregator;

impl Algorithm for SpatialAggregator {
    type Input = (RasterStack, Vec<Boundary>);
    type Output = AggregationReport;
    type Params = Reduction;
    type Error = Error;

    fn name(&self) -> &'static str {
        "SpatialAggregator"
    }

    fn description(&self) -> &'static str {
        "Reduce defined cells inside each unit to one value per period"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (stack, boundaries) = input;
        let refs: Vec<&Boundary> = boundaries.iter().collect();
        aggregate_stack(&stack, &refs, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{LineString, MultiPolygon, Polygon};
    use nightglow_core::{AdminLevel, GeoTransform};

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    /// 4x4 grid spanning (0,0)-(4,4), cell value = row * 4 + col
    fn make_values() -> Raster<f64> {
        let mut r = Raster::new(4, 4);
        r.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        for row in 0..4 {
            for col in 0..4 {
                r.set(row, col, (row * 4 + col) as f64).unwrap();
            }
        }
        r
    }

    fn rect(code: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Boundary {
        let poly = Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        );
        Boundary::new(code, AdminLevel::Adm3, MultiPolygon::new(vec![poly]))
    }

    fn single(period: &str, raster: Raster<f64>) -> RasterStack {
        let mut stack = RasterStack::new();
        stack.insert(p(period), raster);
        stack
    }

    #[test]
    fn zone_raster_assigns_first_boundary() {
        let values = make_values();
        let left = rect("L", 0.0, 0.0, 2.0, 4.0);
        let right = rect("R", 2.0, 0.0, 4.0, 4.0);
        let index = rasterize_boundaries(&values, &[&left, &right]).unwrap();

        assert_eq!(index.zones().get(0, 0).unwrap(), 1);
        assert_eq!(index.zones().get(3, 3).unwrap(), 2);
        assert_eq!(index.code(2), Some("R"));
        assert_eq!(index.code(0), None);
        assert_eq!(index.footprint_sizes(), vec![8, 8]);
    }

    #[test]
    fn sum_and_mean_skip_nodata() {
        let mut values = make_values();
        values.set(0, 0, f64::NAN).unwrap();
        let whole = rect("ALL", 0.0, 0.0, 4.0, 4.0);
        let index = rasterize_boundaries(&values, &[&whole]).unwrap();

        let agg = &zonal_aggregates(&values, &index).unwrap()[0];
        assert_eq!(agg.count, 15);
        assert_relative_eq!(agg.value(Reduction::Sum).unwrap(), 120.0);
        assert_relative_eq!(agg.value(Reduction::Mean).unwrap(), 8.0);
    }

    #[test]
    fn additive_over_disjoint_parts() {
        let stack = single("2023-01", make_values());
        let whole = rect("ALL", 0.0, 0.0, 4.0, 4.0);
        let left = rect("L", 0.0, 0.0, 2.0, 4.0);
        let right = rect("R", 2.0, 0.0, 4.0, 4.0);

        let total = aggregate_stack(&stack, &[&whole], Reduction::Sum).unwrap();
        let parts = aggregate_stack(&stack, &[&left, &right], Reduction::Sum).unwrap();

        let period = p("2023-01");
        let sum_parts = parts.table.get("L", &period).unwrap() + parts.table.get("R", &period).unwrap();
        assert_relative_eq!(total.table.get("ALL", &period).unwrap(), sum_parts);
        assert_relative_eq!(sum_parts, 120.0);
    }

    #[test]
    fn additive_when_split_runs_through_cell_centres() {
        let mut ones = Raster::filled(4, 4, 1.0);
        ones.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        let stack = single("2023-01", ones);
        let whole = rect("ALL", 0.0, 0.0, 4.0, 4.0);
        let left = rect("L", 0.0, 0.0, 1.5, 4.0);
        let right = rect("R", 1.5, 0.0, 4.0, 4.0);

        let total = aggregate_stack(&stack, &[&whole], Reduction::Sum).unwrap();
        let parts = aggregate_stack(&stack, &[&left, &right], Reduction::Sum).unwrap();

        let period = p("2023-01");
        let l = parts.table.get("L", &period).unwrap();
        let r = parts.table.get("R", &period).unwrap();
        assert_relative_eq!(total.table.get("ALL", &period).unwrap(), 16.0);
        assert_relative_eq!(l + r, 16.0);
        // the shared column goes to the first unit
        assert_relative_eq!(l, 8.0);
    }

    #[test]
    fn unit_without_cells_is_a_spatial_mismatch() {
        let mut values = make_values();
        for row in 0..4 {
            for col in 2..4 {
                values.set(row, col, f64::NAN).unwrap();
            }
        }
        let stack = single("2023-02", values);
        let left = rect("L", 0.0, 0.0, 2.0, 4.0);
        let right = rect("R", 2.0, 0.0, 4.0, 4.0);
        let far = rect("FAR", 50.0, 50.0, 60.0, 60.0);

        let report = SpatialAggregator
            .execute_default((stack, vec![left, right, far]))
            .unwrap();

        assert_eq!(report.table.unit_count(), 1);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].unit(), "R");
        assert_eq!(report.issues[1].unit(), "FAR");
    }

    #[test]
    fn one_record_per_unit_and_period() {
        let mut stack = single("2023-01", make_values());
        stack.insert(p("2023-02"), make_values());
        let whole = rect("ALL", 0.0, 0.0, 4.0, 4.0);
        let report = aggregate_stack(&stack, &[&whole], Reduction::Sum).unwrap();
        assert_eq!(report.table.len(), 2);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn mismatched_stack_fails() {
        let mut stack = single("2023-01", make_values());
        stack.insert(p("2023-02"), Raster::filled(2, 2, 1.0));
        let whole = rect("ALL", 0.0, 0.0, 4.0, 4.0);
        assert!(matches!(
            aggregate_stack(&stack, &[&whole], Reduction::Sum),
            Err(Error::GridMismatch { .. })
        ));
    }

    #[test]
    fn empty_stack_gives_empty_table() {
        let whole = rect("ALL", 0.0, 0.0, 4.0, 4.0);
        let report = aggregate_stack(&RasterStack::new(), &[&whole], Reduction::Sum).unwrap();
        assert!(report.table.is_empty());
    }
}
