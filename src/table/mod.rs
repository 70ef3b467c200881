//! Long-format tables — the input surface of the loader.
//!
//! A `Table` is a list of named columns and rows of [`Value`]s. Rows are
//! read once while loading and never retained by the stores built from them.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use crate::model::Value;
use crate::{Error, Result};

/// CSV configuration, shared by the reader and `export::write_csv_with`.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Cells equal to one of these (after trimming) become `Value::Null`.
    /// The first one is written for `Null` on export.
    pub missing_tokens: Vec<String>,
    pub trim: bool,
    /// A cell starting with this character is read as the literal string
    /// after it, skipping type detection. Export prefixes it to strings that
    /// would otherwise read back as another type (`"2020"`, `"NA"`, `"true"`).
    pub text_marker: Option<char>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            missing_tokens: vec!["NA".into(), String::new()],
            trim: true,
            text_marker: Some('\''),
        }
    }
}

/// A long-format table: one row per (dimension combination, value).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Its width must equal the column count.
    pub fn push_row<I, V>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let row: Vec<Value> = row.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(Error::ArityMismatch {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] { &self.columns }
    pub fn rows(&self) -> &[Vec<Value>] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    pub fn column_values(&self, name: &str) -> Result<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Rows whose `column` equals `value` exactly, in source order.
    pub fn filter_eq(&self, column: &str, value: &Value) -> Result<Table> {
        let idx = self.column_index(column)?;
        Ok(Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| &row[idx] == value).cloned().collect(),
        })
    }

    // ========================================================================
    // CSV
    // ========================================================================

    pub fn from_csv_reader<R: Read>(reader: R, opts: &CsvOptions) -> Result<Table> {
        let rdr = csv_builder(opts).from_reader(reader);
        Self::from_csv(rdr, opts)
    }

    pub fn from_csv_path(path: impl AsRef<Path>, opts: &CsvOptions) -> Result<Table> {
        let rdr = csv_builder(opts).from_path(path)?;
        Self::from_csv(rdr, opts)
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>, opts: &CsvOptions) -> Result<Table> {
        let mut table = Table::new(rdr.headers()?.iter());
        for record in rdr.records() {
            let record = record?;
            table.push_row(record.iter().map(|field| parse_cell(field, opts)))?;
        }
        Ok(table)
    }

    // ========================================================================
    // JSON
    // ========================================================================

    /// Build a table from a JSON array of flat objects.
    ///
    /// Columns appear in first-occurrence order across records (keys of a
    /// single record in sorted order); a field missing from a record is `Null`.
    pub fn from_json_records(json: &str) -> Result<Table> {
        let records: Vec<serde_json::Map<String, JsonValue>> = serde_json::from_str(json)?;

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Table::new(columns.iter().cloned());
        for record in &records {
            let row = columns
                .iter()
                .map(|c| record.get(c).map(json_to_value).transpose())
                .collect::<Result<Vec<Option<Value>>>>()?;
            table.push_row(row.into_iter().map(|v| v.unwrap_or(Value::Null)))?;
        }
        Ok(table)
    }
}

fn csv_builder(opts: &CsvOptions) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(opts.delimiter)
        .trim(if opts.trim { csv::Trim::All } else { csv::Trim::None });
    builder
}

pub(crate) fn parse_cell(field: &str, opts: &CsvOptions) -> Value {
    let field = if opts.trim { field.trim() } else { field };
    if let Some(text) = opts.text_marker.and_then(|m| field.strip_prefix(m)) {
        return Value::String(text.to_string());
    }
    if opts.missing_tokens.iter().any(|t| t == field) {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Int(i);
    }
    // `f64::from_str` also takes "nan", "inf" and "infinity"; those stay labels.
    if field.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = field.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
    }
    match field {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(d) = NaiveDate::parse_from_str(field, "%Y-%m-%d") {
        return Value::Date(d);
    }
    Value::String(field.to_string())
}

fn json_to_value(json: &JsonValue) -> Result<Value> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .ok_or_else(|| Error::InvalidInput(format!("unrepresentable number {n}"))),
        JsonValue::String(s) => Ok(Value::String(s.clone())),
        other => Err(Error::InvalidInput(format!(
            "nested JSON value in table record: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
region,product,value
us,banana,10
us,apples,NA
eu,banana,2.5
";

    #[test]
    fn test_csv_parsing() {
        let table = Table::from_csv_reader(CSV.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(table.columns(), ["region", "product", "value"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0][2], Value::Int(10));
        assert_eq!(table.rows()[1][2], Value::Null);
        assert_eq!(table.rows()[2][2], Value::Float(2.5));
    }

    #[test]
    fn test_parse_cell_kinds() {
        let opts = CsvOptions::default();
        assert_eq!(parse_cell("true", &opts), Value::Bool(true));
        assert_eq!(
            parse_cell("2024-02-29", &opts),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(parse_cell(" juice ", &opts), Value::from("juice"));
        assert_eq!(parse_cell("", &opts), Value::Null);
    }

    #[test]
    fn test_non_finite_words_stay_labels() {
        let opts = CsvOptions::default();
        for word in ["nan", "NaN", "Inf", "-inf", "infinity", "1e999"] {
            assert_eq!(parse_cell(word, &opts), Value::from(word), "{word}");
        }
        assert_eq!(parse_cell("1e3", &opts), Value::Float(1000.0));

        let table = Table::from_csv_reader("region,value\nnan,1\nInf,2\n".as_bytes(), &opts).unwrap();
        let regions: Vec<&Value> = table.column_values("region").unwrap().collect();
        assert_eq!(regions, [&Value::from("nan"), &Value::from("Inf")]);
    }

    #[test]
    fn test_text_marker() {
        let opts = CsvOptions::default();
        assert_eq!(parse_cell("'2020", &opts), Value::from("2020"));
        assert_eq!(parse_cell("'NA", &opts), Value::from("NA"));
        assert_eq!(parse_cell("'", &opts), Value::from(""));
        assert_eq!(parse_cell("''quoted", &opts), Value::from("'quoted"));

        let plain = CsvOptions { text_marker: None, ..CsvOptions::default() };
        assert_eq!(parse_cell("'2020", &plain), Value::from("'2020"));
    }

    #[test]
    fn test_push_row_width() {
        let mut table = Table::new(["a", "b"]);
        assert!(table.push_row([1, 2]).is_ok());
        assert!(matches!(
            table.push_row([1]),
            Err(Error::ArityMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_filter_eq_and_unknown_column() {
        let table = Table::from_csv_reader(CSV.as_bytes(), &CsvOptions::default()).unwrap();
        let us = table.filter_eq("region", &"us".into()).unwrap();
        assert_eq!(us.len(), 2);
        assert!(matches!(
            table.filter_eq("nope", &Value::Null),
            Err(Error::UnknownColumn(c)) if c == "nope"
        ));
    }

    #[test]
    fn test_json_records() {
        let json = r#"[
            {"region": "us", "value": 1},
            {"region": "eu", "year": 2020, "value": 0.5}
        ]"#;
        let table = Table::from_json_records(json).unwrap();
        assert_eq!(table.columns(), ["region", "value", "year"]);
        assert_eq!(table.rows()[0], vec![Value::from("us"), Value::Int(1), Value::Null]);
        assert_eq!(table.rows()[1][2], Value::Int(2020));
    }

    #[test]
    fn test_json_rejects_nested() {
        let err = Table::from_json_records(r#"[{"a": [1, 2]}]"#);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }
}
