//! CSV time-series tables (`unit_id,period,value`)

use crate::error::Result;
use crate::temporal::{TimeSeriesRecord, TimeSeriesTable};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;

/// Read a time-series table; duplicate (unit, period) rows are an error.
///
/// Rows with an empty or non-finite value are skipped: a missing
/// observation is a gap, not a zero.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<TimeSeriesTable> {
    let file = std::fs::File::open(path.as_ref())?;
    read_table_from(file)
}

pub fn read_table_from<R: Read>(reader: R) -> Result<TimeSeriesTable> {
    #[derive(serde::Deserialize)]
    struct Row {
        unit_id: String,
        period: crate::temporal::Period,
        value: Option<f64>,
    }

    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut table = TimeSeriesTable::new();
    for row in rdr.deserialize::<Row>() {
        let row = row?;
        if let Some(value) = row.value.filter(|v| v.is_finite()) {
            table.insert(TimeSeriesRecord::new(row.unit_id, row.period, value))?;
        }
    }
    Ok(table)
}

/// Write any serializable rows as CSV with a header
pub fn write_rows<W, S>(writer: W, rows: &[S]) -> Result<()>
where
    W: Write,
    S: Serialize,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a time-series table to a CSV file
pub fn write_table<P: AsRef<Path>>(table: &TimeSeriesTable, path: P) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_rows(file, &table.records())
}
