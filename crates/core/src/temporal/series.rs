//! Tabular time series keyed by (unit, period)

use super::Period;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One aggregate observation: the reduced value of a spatial unit for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub unit_id: String,
    pub period: Period,
    pub value: f64,
}

impl TimeSeriesRecord {
    pub fn new(unit_id: impl Into<String>, period: Period, value: f64) -> Self {
        Self {
            unit_id: unit_id.into(),
            period,
            value,
        }
    }
}

/// Observations of a single unit, ordered by period
pub type UnitSeries = BTreeMap<Period, f64>;

/// Records grouped by unit, at most one per (unit, period).
///
/// Units iterate in lexical order and each unit's observations in
/// chronological order, so every derived table is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesTable {
    units: BTreeMap<String, UnitSeries>,
}

impl TimeSeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting duplicate (unit, period) pairs
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = TimeSeriesRecord>,
    {
        let mut table = Self::new();
        for record in records {
            table.insert(record)?;
        }
        Ok(table)
    }

    /// Insert a record. A second record for the same (unit, period) is an error.
    pub fn insert(&mut self, record: TimeSeriesRecord) -> Result<()> {
        let series = self.units.entry(record.unit_id.clone()).or_default();
        if series.contains_key(&record.period) {
            return Err(Error::DuplicateRecord {
                unit: record.unit_id,
                period: record.period.to_string(),
            });
        }
        series.insert(record.period, record.value);
        Ok(())
    }

    /// Observations of one unit
    pub fn series(&self, unit_id: &str) -> Option<&UnitSeries> {
        self.units.get(unit_id)
    }

    pub fn get(&self, unit_id: &str, period: &Period) -> Option<f64> {
        self.units.get(unit_id).and_then(|s| s.get(period)).copied()
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// (unit, series) pairs in unit order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitSeries)> {
        self.units.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten back into records, ordered by unit then period
    pub fn records(&self) -> Vec<TimeSeriesRecord> {
        self.units
            .iter()
            .flat_map(|(unit, series)| {
                series
                    .iter()
                    .map(move |(period, value)| TimeSeriesRecord::new(unit.clone(), *period, *value))
            })
            .collect()
    }

    /// Earliest period observed across all units
    pub fn first_period(&self) -> Option<Period> {
        self.units.values().filter_map(|s| s.keys().next()).min().copied()
    }

    /// Latest period observed across all units
    pub fn last_period(&self) -> Option<Period> {
        self.units.values().filter_map(|s| s.keys().next_back()).max().copied()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.units.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn duplicate_unit_period_is_rejected() {
        let mut table = TimeSeriesTable::new();
        table.insert(TimeSeriesRecord::new("MMR001", p("2023-01"), 4.0)).unwrap();
        let err = table
            .insert(TimeSeriesRecord::new("MMR001", p("2023-01"), 5.0))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord { .. }));
        assert_eq!(table.get("MMR001", &p("2023-01")), Some(4.0));
    }

    #[test]
    fn records_are_ordered_by_unit_then_period() {
        let table = TimeSeriesTable::from_records(vec![
            TimeSeriesRecord::new("B", p("2023-02"), 2.0),
            TimeSeriesRecord::new("A", p("2023-03"), 3.0),
            TimeSeriesRecord::new("B", p("2023-01"), 1.0),
        ])
        .unwrap();

        let order: Vec<(String, String)> = table
            .records()
            .into_iter()
            .map(|r| (r.unit_id, r.period.to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A".to_string(), "2023-03".to_string()),
                ("B".to_string(), "2023-01".to_string()),
                ("B".to_string(), "2023-02".to_string()),
            ]
        );
        assert_eq!(table.first_period(), Some(p("2023-01")));
        assert_eq!(table.last_period(), Some(p("2023-03")));
        assert_eq!(table.len(), 3);
        assert_eq!(table.unit_count(), 2);
    }
}
