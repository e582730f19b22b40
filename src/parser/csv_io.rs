use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::record::{RawRecord, Record};
use crate::error::Result;

/// Read the raw inventory spreadsheet export
pub fn read_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    read_rows(File::open(path)?)
}

/// Read a cleaned record file produced by the expander
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    read_rows(File::open(path)?)
}

pub fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    write_rows(File::create(path)?, records)
}

/// Write spreadsheet rows back out unchanged
pub fn write_raw_records(path: &Path, rows: &[RawRecord]) -> Result<()> {
    write_rows(File::create(path)?, rows)
}

/// Write rows with a header row. An empty set still gets its header.
///
/// `T` must serialize its fields in `RECORD_COLUMNS` order.
pub fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(RECORD_COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Column headers of the raw and cleaned record files, in file order
pub const RECORD_COLUMNS: &[&str] = &[
    "File #",
    "Box",
    "Total",
    "Location",
    "API",
    "Operator",
    "Lease",
    "Well #",
    "Sec",
    "Tw",
    "TwD",
    "Rg",
    "RgD",
    "Quarter",
    "Latitude",
    "Longitude",
    "County",
    "State",
    "Formation",
    "Field",
    "Top",
    "Bottom",
    "Type",
    "Box Type",
    "Condition",
    "Diameter",
    "Restrictions",
    "Comments",
];
