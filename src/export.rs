//! Export — write a store back to long format.
//!
//! ```text
//! Store → to_table() → Table (one row per stored element)
//!   → write_csv() → CSV with `NA` for missing values
//! ```
//!
//! Sparse stores export in first-write order, dense stores in row-major
//! order over set cells. Unset dense cells produce no row.
//!
//! Written CSV reads back to equal values under the same `CsvOptions`:
//! floats always carry a decimal point or exponent, and strings that would
//! parse as something else get the text marker. Two cases stay lossy:
//! non-finite floats (read back as the strings `NaN`/`inf`) and strings with
//! leading or trailing whitespace when the reader trims.

use std::io::Write;

use crate::model::Value;
use crate::store::{Store, VariableStore};
use crate::table::{parse_cell, CsvOptions, Table};
use crate::{Error, Result};

/// Token written for `Value::Null` when the options list none.
pub const MISSING_TOKEN: &str = "NA";

/// Convert a store into a long-format table.
///
/// `dimension_columns` names one column per dimension; pass an empty slice
/// to use the dimensions' own names.
pub fn to_table(store: &Store, dimension_columns: &[&str], value_column: &str) -> Result<Table> {
    let mut columns: Vec<String> = if dimension_columns.is_empty() {
        store.dimensions().iter().map(|d| d.name().to_string()).collect()
    } else {
        if dimension_columns.len() != store.arity() {
            return Err(Error::ArityMismatch {
                expected: store.arity(),
                got: dimension_columns.len(),
            });
        }
        dimension_columns.iter().map(|c| c.to_string()).collect()
    };
    columns.push(value_column.to_string());

    let mut table = Table::new(columns);
    match store {
        Store::Sparse(sparse) => {
            for (key, value) in sparse.iter() {
                table.push_row(key.iter().chain(std::iter::once(value)).cloned())?;
            }
        }
        Store::Dense(dense) => {
            for (index, value) in dense.iter_set() {
                let mut row = dense.labels_of(&index)?;
                row.push(value.clone());
                table.push_row(row)?;
            }
        }
    }
    Ok(table)
}

/// Write a table as CSV with the default options.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    write_csv_with(table, writer, &CsvOptions::default())
}

/// Write a table as CSV that `Table::from_csv_reader` reads back with `opts`.
pub fn write_csv_with<W: Write>(table: &Table, writer: W, opts: &CsvOptions) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(opts.delimiter)
        .from_writer(writer);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| format_cell(v, opts)))?;
    }
    wtr.flush()?;
    Ok(())
}

fn format_cell(value: &Value, opts: &CsvOptions) -> String {
    match value {
        Value::Null => opts
            .missing_tokens
            .first()
            .map_or(MISSING_TOKEN, String::as_str)
            .to_string(),
        // Debug keeps the ".0" on integral floats.
        Value::Float(f) if f.is_finite() => format!("{f:?}"),
        Value::String(s) => match opts.text_marker {
            Some(marker) if s.starts_with(marker) || !reads_back_as_string(s, opts) => {
                format!("{marker}{s}")
            }
            _ => s.clone(),
        },
        other => other.to_string(),
    }
}

fn reads_back_as_string(s: &str, opts: &CsvOptions) -> bool {
    matches!(parse_cell(s, opts), Value::String(parsed) if parsed == s)
}
