//! Categorical encoding and field conversion.
//!
//! Every string column of the row schema gets its own [`ColumnEncoder`], a
//! bijection between raw strings and dense integer codes. Codes 0 and 1 are
//! reserved for the literals `"0"` and `"1"`; the first new string receives
//! code 2, the next one 3 and so on. Tables only grow.
//!
//! Numeric columns bypass the tables: empty fields are read as `0`.
//! Date columns are parsed with a `chrono` format string and stored as the
//! number of days since 1970-01-01.
//!
//! # Example
//!
//! ```
//! use rebate_dataset::preprocessing::CategoricalEncoder;
//! use rebate_dataset::schema::{RowSchema, SchemaVariant};
//!
//! let schema = RowSchema::from_variant(SchemaVariant::Combined);
//! let mut encoder = CategoricalEncoder::new(&schema, "%Y-%m-%d");
//!
//! let row = encoder
//!     .encode_row(&["Polo", "2017", "1970-01-03", "", "12"], 1)
//!     .unwrap();
//! assert_eq!(row, vec![2.0, 2017.0, 2.0, 0.0, 12.0]);
//! assert_eq!(encoder.decode(0, 2).unwrap(), "Polo");
//! ```

use crate::error::{DatasetError, Result};
use crate::schema::{ColumnType, RowSchema};
use ahash::AHashMap;
use chrono::{Datelike, NaiveDate};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// First code handed out to a new string.
pub const FIRST_FREE_CODE: u32 = 2;

/// Parse a date field into days since 1970-01-01.
pub fn parse_epoch_day(value: &str, format: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(value.trim(), format).ok()?;
    Some(i64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE))
}

/// Format days since 1970-01-01 as a date string.
pub fn format_epoch_day(day: i64, format: &str) -> Option<String> {
    let ce_days = i32::try_from(day).ok()?.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?;
    NaiveDate::from_num_days_from_ce_opt(ce_days).map(|d| d.format(format).to_string())
}

/// Read a numeric field; empty or blank fields are 0.
///
/// `NaN` and infinities are rejected like any other malformed number.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// String ↔ code table for one column.
#[derive(Debug, Clone)]
pub struct ColumnEncoder {
    codes: AHashMap<String, u32>,
    values: Vec<String>,
}

impl ColumnEncoder {
    /// Create a table holding only the reserved codes.
    pub fn new() -> Self {
        let mut encoder = Self {
            codes: AHashMap::new(),
            values: Vec::new(),
        };
        encoder.insert("0");
        encoder.insert("1");
        encoder
    }

    fn insert(&mut self, value: &str) -> u32 {
        let code = self.values.len() as u32;
        self.codes.insert(value.to_string(), code);
        self.values.push(value.to_string());
        code
    }

    /// Code of `value`, allocating the next free code on first sight.
    pub fn encode(&mut self, value: &str) -> u32 {
        match self.codes.get(value) {
            Some(&code) => code,
            None => self.insert(value),
        }
    }

    /// Code of `value` without allocating.
    pub fn lookup(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// String behind `code`.
    pub fn decode(&self, code: u32) -> Option<&str> {
        self.values.get(code as usize).map(String::as_str)
    }

    /// Number of allocated codes, reserved ones included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when only the reserved codes exist.
    pub fn is_empty(&self) -> bool {
        self.values.len() <= FIRST_FREE_CODE as usize
    }
}

impl Default for ColumnEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Row-level converter holding one [`ColumnEncoder`] per string column.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    column_types: Vec<ColumnType>,
    date_format: String,
    tables: AHashMap<usize, ColumnEncoder>,
}

impl CategoricalEncoder {
    /// Create an encoder for a schema.
    pub fn new(schema: &RowSchema, date_format: impl Into<String>) -> Self {
        let column_types = schema.column_types();
        let tables = column_types
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == ColumnType::String)
            .map(|(i, _)| (i, ColumnEncoder::new()))
            .collect();

        Self {
            column_types,
            date_format: date_format.into(),
            tables,
        }
    }

    /// Date format used for date columns.
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Encode a raw string of a string column.
    pub fn encode(&mut self, column: usize, raw: &str) -> Result<u32> {
        self.tables
            .get_mut(&column)
            .map(|table| table.encode(raw))
            .ok_or(DatasetError::InvalidColumn { column })
    }

    /// Code of a raw string of a string column, without allocating.
    pub fn lookup(&self, column: usize, raw: &str) -> Option<u32> {
        self.tables.get(&column)?.lookup(raw)
    }

    /// Decode a code of a string column.
    pub fn decode(&self, column: usize, code: u32) -> Result<&str> {
        let table = self
            .tables
            .get(&column)
            .ok_or(DatasetError::InvalidColumn { column })?;
        table
            .decode(code)
            .ok_or(DatasetError::UnknownCode { column, code })
    }

    /// Table of one string column.
    pub fn column(&self, column: usize) -> Option<&ColumnEncoder> {
        self.tables.get(&column)
    }

    /// Convert one row of raw fields into numbers.
    ///
    /// `line` is the 1-based source line used in error messages.
    pub fn encode_row<S: AsRef<str>>(&mut self, fields: &[S], line: usize) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(fields.len());

        for (column, field) in fields.iter().enumerate() {
            let raw = field.as_ref();
            let column_type = self
                .column_types
                .get(column)
                .copied()
                .unwrap_or(ColumnType::Ignore);

            let value = match column_type {
                ColumnType::String => f64::from(self.encode(column, raw.trim())?),
                ColumnType::Number => {
                    parse_number(raw).ok_or_else(|| DatasetError::NumberFormat {
                        line,
                        column,
                        value: raw.to_string(),
                    })?
                }
                ColumnType::Date => parse_epoch_day(raw, &self.date_format).ok_or_else(|| {
                    DatasetError::DateFormat {
                        line,
                        value: raw.to_string(),
                        format: self.date_format.clone(),
                    }
                })? as f64,
                ColumnType::Ignore => 0.0,
            };
            values.push(value);
        }

        Ok(values)
    }

    /// Convert a numeric row back into strings.
    pub fn decode_row(&self, values: &[f64]) -> Result<Vec<String>> {
        values
            .iter()
            .enumerate()
            .map(|(column, &value)| {
                let column_type = self
                    .column_types
                    .get(column)
                    .copied()
                    .unwrap_or(ColumnType::Ignore);

                match column_type {
                    ColumnType::String => {
                        self.decode(column, value as u32).map(str::to_string)
                    }
                    ColumnType::Date => Ok(format_epoch_day(value as i64, &self.date_format)
                        .unwrap_or_else(|| value.to_string())),
                    ColumnType::Number => Ok(value.to_string()),
                    ColumnType::Ignore => Ok("0".to_string()),
                }
            })
            .collect()
    }
}
