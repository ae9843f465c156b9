//! Per-plant statistics table.
//!
//! Floats are written with four decimals, missing values as `nan`, flags
//! as `True`/`False`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serializer;

use crate::error::Result;
use crate::stats::RoiStatRow;

pub(crate) fn serialize_float<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_str("nan")
    } else {
        serializer.serialize_str(&format!("{value:.4}"))
    }
}

pub(crate) fn serialize_flag<S: Serializer>(
    value: &Option<bool>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(flag) => serialize_bool(flag, serializer),
        None => serializer.serialize_str("nan"),
    }
}

pub(crate) fn serialize_bool<S: Serializer>(
    value: &bool,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

/// Column names of the statistics table, in [`RoiStatRow`] field order.
pub const TABLE_COLUMNS: [&str; 14] = [
    "treatment",
    "sampleid",
    "date",
    "parameter",
    "frame",
    "roi",
    "frame_avg",
    "yii_avg",
    "yii_std",
    "npq_avg",
    "npq_std",
    "plantarea",
    "obj_in_frame",
    "unique_roi",
];

/// Write rows as CSV to any writer, header first. An empty batch still
/// gets the header line.
pub fn write_rows<W: Write>(rows: &[RoiStatRow], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv.write_record(TABLE_COLUMNS)?;
    }
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write rows to a CSV file.
pub fn write_table(rows: &[RoiStatRow], path: &Path) -> Result<()> {
    write_rows(rows, BufWriter::new(File::create(path)?))
}
