//! Comma-separated table codec.
//!
//! Reading types the listing's numeric columns and keeps every other column
//! as text; writing renders a header row followed by one record per row with
//! standard CSV quoting.

use std::io::{BufWriter, Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::debug;
use rentals_core::{NUMERIC_COLUMNS, REQUIRED_COLUMNS, Table, TableError, Value};
use thiserror::Error;

const DATE_LAYOUT: &str = "%Y-%m-%d";
const DATE_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Errors raised while loading a delimited table.
#[derive(Debug, Error)]
pub enum ReadTableError {
    /// The file could not be opened.
    #[error("failed to open table at {path}: {source}")]
    Open {
        /// Path being opened.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The content is not a valid delimited table (bad UTF-8, ragged rows, I/O).
    #[error("invalid delimited content: {source}")]
    Csv {
        /// Underlying CSV error, including its position.
        #[source]
        source: csv::Error,
    },
    /// The header lacks a column the listing schema requires.
    #[error("required column {name:?} is missing from the header")]
    MissingColumn {
        /// Absent column.
        name: String,
    },
    /// A numeric column holds something other than a finite number.
    #[error("line {line}: column {column:?} holds {value:?}, which is not a finite number")]
    InvalidNumber {
        /// One-based line in the source file.
        line: u64,
        /// Column name.
        column: String,
        /// Raw cell text.
        value: String,
    },
    /// The header or rows do not form a valid table.
    #[error(transparent)]
    Schema(#[from] TableError),
}

/// Errors raised while writing a delimited table.
#[derive(Debug, Error)]
pub enum WriteTableError {
    /// Encoding or writing a record failed.
    #[error("failed to write delimited record: {0}")]
    Csv(#[from] csv::Error),
    /// Flushing the destination failed.
    #[error("failed to flush delimited output: {0}")]
    Flush(#[source] std::io::Error),
}

/// Read a listing table from `path`.
///
/// The header must contain every required listing column; `price`,
/// `longitude` and `latitude` are parsed as numbers.
///
/// # Errors
///
/// Returns [`ReadTableError`] when the file cannot be opened, is not valid
/// CSV, holds a non-numeric value in a numeric column or lacks a required
/// column.
pub fn read_listings(path: &Utf8Path) -> Result<Table, ReadTableError> {
    let file = rentals_fs::open_utf8_file(path).map_err(|source| ReadTableError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_table(file, &NUMERIC_COLUMNS)?;
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|name| table.column_index(name).is_none())
    {
        return Err(ReadTableError::MissingColumn {
            name: (*missing).to_owned(),
        });
    }
    debug!("Loaded {} rows from {path}", table.len());
    Ok(table)
}

/// Read a comma-separated table with a header row.
///
/// Cells in `numeric_columns` become [`Value::Number`]; other cells stay
/// [`Value::Text`]. Empty cells are [`Value::Null`] in every column.
///
/// # Examples
///
/// ```
/// use rentals_core::Value;
/// use rentals_data::read_table;
///
/// # fn main() -> Result<(), rentals_data::ReadTableError> {
/// let csv = "name,price\nLoft,120\nStudio,\n";
/// let table = read_table(csv.as_bytes(), &["price"])?;
/// assert_eq!(table.value(0, "price"), Some(&Value::Number(120.0)));
/// assert_eq!(table.value(1, "price"), Some(&Value::Null));
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`ReadTableError`] for malformed CSV, invalid UTF-8, ragged or
/// duplicate columns, and non-numeric values in `numeric_columns`.
pub fn read_table<R: Read>(reader: R, numeric_columns: &[&str]) -> Result<Table, ReadTableError> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let header: Vec<String> = csv_reader
        .headers()
        .map_err(|source| ReadTableError::Csv { source })?
        .iter()
        .map(str::to_owned)
        .collect();
    let numeric: Vec<bool> = header
        .iter()
        .map(|name| numeric_columns.contains(&name.as_str()))
        .collect();
    let mut table = Table::new(header.clone())?;

    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|source| ReadTableError::Csv { source })?;
        let line = record
            .position()
            .map_or_else(|| fallback_line(index), csv::Position::line);
        table.push_row(decode_record(&record, &numeric, &header, line)?)?;
    }
    Ok(table)
}

fn fallback_line(index: usize) -> u64 {
    u64::try_from(index).map_or(u64::MAX, |offset| offset.saturating_add(2))
}

fn decode_record(
    record: &StringRecord,
    numeric: &[bool],
    columns: &[String],
    line: u64,
) -> Result<Vec<Value>, ReadTableError> {
    record
        .iter()
        .zip(numeric.iter().zip(columns))
        .map(|(cell, (is_numeric, column))| {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                Ok(Value::Null)
            } else if *is_numeric {
                parse_number(trimmed).ok_or_else(|| ReadTableError::InvalidNumber {
                    line,
                    column: column.clone(),
                    value: cell.to_owned(),
                })
            } else {
                Ok(Value::Text(cell.to_owned()))
            }
        })
        .collect()
}

fn parse_number(raw: &str) -> Option<Value> {
    raw.parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .map(Value::Number)
}

/// Write `table` as comma-separated text with a header row.
///
/// Numbers use their shortest round-trip form and nulls are empty cells.
/// A timestamp column renders as `YYYY-MM-DD` when every timestamp in it
/// falls on midnight, and as `YYYY-MM-DD HH:MM:SS` otherwise. Fractional
/// seconds are appended only when present.
///
/// # Examples
///
/// ```
/// use rentals_core::{Table, Value};
/// use rentals_data::write_table;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let table = Table::from_rows(
///     vec!["name".into(), "price".into()],
///     [vec![Value::from("Loft, Brooklyn"), Value::Number(120.0)]],
/// )?;
/// let mut out = Vec::new();
/// write_table(&mut out, &table)?;
/// assert_eq!(String::from_utf8(out)?, "name,price\n\"Loft, Brooklyn\",120\n");
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`WriteTableError`] when a record cannot be written or the
/// destination cannot be flushed.
pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<(), WriteTableError> {
    let layouts = timestamp_layouts(table);
    let mut csv_writer = WriterBuilder::new().from_writer(BufWriter::new(writer));
    csv_writer.write_record(table.columns())?;
    for row in table.rows() {
        let cells = row
            .iter()
            .zip(&layouts)
            .map(|(value, layout)| render(value, layout));
        csv_writer.write_record(cells)?;
    }
    csv_writer.flush().map_err(WriteTableError::Flush)?;
    Ok(())
}

fn timestamp_layouts(table: &Table) -> Vec<&'static str> {
    (0..table.columns().len())
        .map(|index| {
            let has_time_of_day = table
                .rows()
                .filter_map(|row| row.get(index).and_then(Value::as_timestamp))
                .any(|timestamp| timestamp.time() != NaiveTime::MIN);
            if has_time_of_day {
                DATE_TIME_LAYOUT
            } else {
                DATE_LAYOUT
            }
        })
        .collect()
}

fn render(value: &Value, layout: &str) -> String {
    match value {
        Value::Null => String::new(),
        Value::Number(number) => number.to_string(),
        Value::Text(text) => text.clone(),
        Value::Timestamp(timestamp) => format_timestamp(*timestamp, layout),
    }
}

fn format_timestamp(timestamp: NaiveDateTime, layout: &str) -> String {
    timestamp.format(layout).to_string()
}
