//! CSV loading and cleaning
//!
//! Reads the song dataset into a [`Table`] and applies the cleaning steps the
//! dashboard relies on:
//!
//! 1. keep only the requested columns
//! 2. drop rows with missing values (empty cells and the usual NA markers
//!    such as `NA`, `NaN`, `N/A`, `null`)
//! 3. drop duplicate rows
//! 4. drop rows whose integer columns do not hold integers, and convert them
//! 5. infer numeric types for the remaining columns; text is lowercased
//!
//! Row conversion runs on rayon's thread pool; output row order matches the
//! file.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use rayon::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::table::{Table, TableError, Value};

/// Errors that can occur while loading the dataset
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read data file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Data file is not valid UTF-8 (set encoding = \"latin1\"): {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Column not found in CSV header: {0}")]
    ColumnNotFound(String),

    #[error("Table error: {0}")]
    TableError(#[from] TableError),
}

/// Text encoding of the data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    /// ISO-8859-1
    #[serde(alias = "latin-1", alias = "iso-8859-1")]
    Latin1,
}

impl Encoding {
    /// Decode raw file bytes into a string
    pub fn decode(self, bytes: Vec<u8>) -> Result<String, LoadError> {
        match self {
            Encoding::Utf8 => Ok(String::from_utf8(bytes)?),
            // Every latin1 byte maps to the code point with the same value
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(format!("unsupported encoding: {}", other)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf-8"),
            Encoding::Latin1 => write!(f, "iso-8859-1"),
        }
    }
}

/// Cell contents read as missing, matching pandas' default `na_values`
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// What to keep from the CSV and how to read it
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Columns to keep, in output order (empty keeps every column)
    pub columns: Vec<String>,
    /// Columns that must hold integers; rows where they don't are dropped
    pub integer_columns: Vec<String>,
    pub encoding: Encoding,
}

/// Read a CSV file and clean it
pub fn read_and_clean_csv(path: &Path, options: &LoadOptions) -> Result<Table, LoadError> {
    let bytes = fs::read(path)?;
    let text = options.encoding.decode(bytes)?;
    let table = clean_csv(&text, options)?;

    info!(
        path = %path.display(),
        rows = table.num_rows(),
        columns = table.columns().len(),
        "Loaded dataset"
    );
    Ok(table)
}

/// Parse CSV text and clean it
pub fn clean_csv(text: &str, options: &LoadOptions) -> Result<Table, LoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let columns: Vec<String> = if options.columns.is_empty() {
        headers.clone()
    } else {
        options.columns.clone()
    };

    let indices: Vec<usize> = columns
        .iter()
        .map(|name| position(&headers, name))
        .collect::<Result<_, _>>()?;

    let integer_mask: Vec<bool> = {
        for name in &options.integer_columns {
            position(&columns, name)?;
        }
        columns
            .iter()
            .map(|c| options.integer_columns.contains(c))
            .collect()
    };

    let mut raw: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw.push(
            indices
                .iter()
                .map(|&i| {
                    record
                        .get(i)
                        .map(str::trim)
                        .filter(|s| !is_missing(s))
                        .map(str::to_string)
                })
                .collect(),
        );
    }
    let total = raw.len();

    let mut rows: Vec<Vec<String>> = raw
        .into_iter()
        .filter_map(|row| row.into_iter().collect::<Option<Vec<_>>>())
        .collect();
    debug!(dropped = total - rows.len(), "Dropped rows with missing values");

    let before = rows.len();
    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(row.clone()));
    debug!(dropped = before - rows.len(), "Dropped duplicate rows");

    let before = rows.len();
    let mut rows: Vec<Vec<Value>> = rows
        .into_par_iter()
        .filter_map(|row| convert_row(row, &integer_mask))
        .collect();
    debug!(
        dropped = before - rows.len(),
        "Dropped rows with non-integer values in integer columns"
    );

    for (col, is_integer) in integer_mask.iter().enumerate() {
        if !is_integer {
            infer_column(&mut rows, col);
        }
    }

    Ok(Table::from_rows(columns, rows)?)
}

fn position(names: &[String], name: &str) -> Result<usize, LoadError> {
    names
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| LoadError::ColumnNotFound(name.to_string()))
}

fn is_missing(cell: &str) -> bool {
    NA_VALUES.contains(&cell)
}

/// Convert integer columns, or `None` if any of them fails to parse
fn convert_row(row: Vec<String>, integer_mask: &[bool]) -> Option<Vec<Value>> {
    row.into_iter()
        .zip(integer_mask)
        .map(|(cell, &is_integer)| {
            if is_integer {
                parse_integer(&cell).map(Value::Int)
            } else {
                Some(Value::Text(cell))
            }
        })
        .collect()
}

/// Parse an integer, accepting floats with no fractional part (`"3.0"`)
pub fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Give a text column a numeric type when every value parses, else lowercase it
fn infer_column(rows: &mut [Vec<Value>], col: usize) {
    let all_parse = |ok: fn(&str) -> bool| {
        rows.iter()
            .filter_map(|row| row[col].as_str())
            .all(ok)
    };
    let all_int = all_parse(|s| s.parse::<i64>().is_ok());
    let all_float = all_parse(|s| s.parse::<f64>().is_ok_and(f64::is_finite));

    if all_int {
        for row in rows.iter_mut() {
            if let Some(i) = row[col].as_str().and_then(|s| s.parse::<i64>().ok()) {
                row[col] = Value::Int(i);
            }
        }
    } else if all_float {
        for row in rows.iter_mut() {
            if let Some(f) = row[col].as_str().and_then(|s| s.parse::<f64>().ok()) {
                row[col] = Value::float(f);
            }
        }
    } else {
        for row in rows.iter_mut() {
            if let Value::Text(s) = &mut row[col] {
                *s = s.to_lowercase();
            }
        }
    }
}
