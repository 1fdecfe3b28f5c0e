//! In-memory table for the dashboard
//!
//! A small row-oriented dataframe: named columns, rows of [`Value`]s, and the
//! handful of relational operations the dashboard needs (projection,
//! filtering, null/duplicate removal and grouped aggregation).
//!
//! ## Value ordering
//!
//! Values are totally ordered so they can be used as group keys and sorted
//! deterministically:
//!
//! ```text
//! Null < numbers (Int and Float compared numerically) < Text (lexicographic)
//! ```
//!
//! An `Int` and a `Float` with the same numeric value are distinct values;
//! the `Int` sorts first.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors that can occur when building or querying a table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Row has {found} values but the table has {expected} columns")]
    RowLength { expected: usize, found: usize },

    #[error("Column '{column}' holds a non-numeric value: {value:?}")]
    NonNumeric { column: String, value: String },
}

/// A single table cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Missing value
    Null,
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
}

impl Value {
    /// Build a float value
    pub fn float(v: f64) -> Self {
        Value::Float(OrderedFloat(v))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value; `None` for text and nulls
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(f.0),
            Value::Null | Value::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => OrderedFloat(*a as f64)
                .cmp(b)
                .then(Ordering::Less),
            (Value::Float(a), Value::Int(b)) => a
                .cmp(&OrderedFloat(*b as f64))
                .then(Ordering::Greater),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v.0),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(v.0),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Row-oriented table with uniquely named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a table and fill it with rows
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row; its length must match the column count
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowLength {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    /// Positions of several columns, in the order given
    pub fn column_indices(&self, names: &[&str]) -> Result<Vec<usize>, TableError> {
        names.iter().map(|name| self.column_index(name)).collect()
    }

    /// Iterate over the values of one column
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_, TableError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Projection onto the given columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Table, TableError> {
        let indices = self.column_indices(names)?;
        let mut table = Table::new(names.iter().copied())?;
        table.rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(table)
    }

    /// Keep the rows for which `predicate` returns true
    pub fn filter<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        }
    }

    /// Remove every row that contains a null
    pub fn drop_nulls(mut self) -> Table {
        self.rows.retain(|row| !row.iter().any(Value::is_null));
        self
    }

    /// Remove repeated rows, keeping the first occurrence
    pub fn drop_duplicates(mut self) -> Table {
        let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(self.rows.len());
        self.rows.retain(|row| seen.insert(row.clone()));
        self
    }

    /// Group by `names` and count rows per group
    ///
    /// The result has the grouping columns followed by `count_column`, one row
    /// per distinct key, sorted by key.
    pub fn group_count(&self, names: &[&str], count_column: &str) -> Result<Table, TableError> {
        let indices = self.column_indices(names)?;

        let mut counts: BTreeMap<Vec<Value>, i64> = BTreeMap::new();
        for row in &self.rows {
            let key: Vec<Value> = indices.iter().map(|&i| row[i].clone()).collect();
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut table = Table::new(names.iter().copied().chain(std::iter::once(count_column)))?;
        table.rows = counts
            .into_iter()
            .map(|(mut key, count)| {
                key.push(Value::Int(count));
                key
            })
            .collect();
        Ok(table)
    }

    /// Mean of a numeric column per distinct key, sorted by key
    pub fn group_mean(&self, key: &str, value: &str) -> Result<Vec<(Value, f64)>, TableError> {
        let key_idx = self.column_index(key)?;
        let value_idx = self.column_index(value)?;

        let mut sums: BTreeMap<&Value, (f64, usize)> = BTreeMap::new();
        for row in &self.rows {
            let v = row[value_idx]
                .as_f64()
                .ok_or_else(|| TableError::NonNumeric {
                    column: value.to_string(),
                    value: row[value_idx].to_string(),
                })?;
            let entry = sums.entry(&row[key_idx]).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }

        Ok(sums
            .into_iter()
            .map(|(k, (sum, n))| (k.clone(), sum / n as f64))
            .collect())
    }

    /// Distinct values of one column, sorted
    pub fn distinct_values(&self, name: &str) -> Result<Vec<Value>, TableError> {
        let set: BTreeSet<&Value> = self.column(name)?.collect();
        Ok(set.into_iter().cloned().collect())
    }
}
