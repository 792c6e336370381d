//! CSV serialization of tables.
//!
//! The header row carries the column names; null cells become empty fields.
//! Quoting and escaping follow RFC 4180 via the `csv` crate, so values
//! containing delimiters, quotes, or newlines survive a round trip.

use crate::core::table::Table;
use crate::core::value::Value;
use crate::error::Result;
use std::io::Read;
use tracing::debug;

/// Serializes a table to CSV bytes, header first.
pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(Value::render))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::DatalensError::Format(e.to_string()))?;

    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        bytes = bytes.len(),
        "Exported table to CSV"
    );
    Ok(bytes)
}

/// Serializes a table to a CSV string.
pub fn to_csv_string(table: &Table) -> Result<String> {
    let bytes = to_csv(table)?;
    String::from_utf8(bytes).map_err(|e| crate::error::DatalensError::Format(e.to_string()))
}

/// Parses CSV from a reader into a table.
///
/// The first record is taken as the header. Cells come back as text, with
/// empty fields as nulls; logical types are recovered downstream by
/// inference, not here.
pub fn from_csv_reader<R: Read>(reader: R) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(cell_from_field).collect());
    }
    Table::new(columns, rows)
}

/// Parses CSV from a string into a table.
pub fn from_csv_str(text: &str) -> Result<Table> {
    from_csv_reader(text.as_bytes())
}

pub(crate) fn cell_from_field(field: &str) -> Value {
    if field.is_empty() {
        Value::Null
    } else {
        Value::Text(field.to_string())
    }
}
