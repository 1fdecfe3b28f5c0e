//! Aggregations behind the dashboard views
//!
//! Every function here is a pure transformation of a [`Table`]; the web layer
//! turns the results into figures.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::sankey::{COUNT_COLUMN, DiagramSpec, SankeyError, SankeyOptions, make_sankey};
use crate::table::{Table, TableError, Value};

pub const MONTH_COLUMN: &str = "released_month";
pub const STREAMS_COLUMN: &str = "streams";

/// Errors raised while aggregating the dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("{0}")]
    Table(#[from] TableError),

    #[error("{0}")]
    Sankey(#[from] SankeyError),

    #[error("Column '{column}' holds a non-numeric value: {value:?}")]
    NonNumeric { column: String, value: String },
}

/// Mean of a value column for one key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub key: Value,
    pub mean: f64,
}

/// Mean of `value` per distinct `key`, sorted by key
pub fn mean_by(table: &Table, key: &str, value: &str) -> Result<Vec<GroupMean>, StatsError> {
    Ok(table
        .group_mean(key, value)?
        .into_iter()
        .map(|(key, mean)| GroupMean { key, mean })
        .collect())
}

/// Mean streams per release month (the bar chart)
pub fn mean_streams_by_month(table: &Table) -> Result<Vec<GroupMean>, StatsError> {
    mean_by(table, MONTH_COLUMN, STREAMS_COLUMN)
}

/// Integer bounds of the keys, e.g. the month slider range
pub fn key_range(means: &[GroupMean]) -> Option<(i64, i64)> {
    let keys = means.iter().filter_map(|m| m.key.as_i64());
    let min = keys.clone().min()?;
    let max = keys.max()?;
    Some((min, max))
}

/// Rows whose numeric `column` lies in `[lo, hi]`
pub fn filter_range(table: &Table, column: &str, lo: f64, hi: f64) -> Result<Table, StatsError> {
    let idx = table.column_index(column)?;
    Ok(table.filter(|row| {
        row[idx]
            .as_f64()
            .is_some_and(|v| (lo..=hi).contains(&v))
    }))
}

/// One marker of the faceted scatter plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: Value,
    pub y: Value,
    /// Number of identical (x, y, facet) observations
    pub count: i64,
}

/// All scatter points sharing one facet value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetSeries {
    pub facet: Value,
    pub points: Vec<ScatterPoint>,
}

/// Scatter points of `y` against `x`, split by `facet` and sized by repeat count
pub fn facet_scatter(
    table: &Table,
    x: &str,
    y: &str,
    facet: &str,
) -> Result<Vec<FacetSeries>, StatsError> {
    let grouped = table.group_count(&[facet, x, y], COUNT_COLUMN)?;

    let mut series: Vec<FacetSeries> = Vec::new();
    for row in grouped.rows() {
        let point = ScatterPoint {
            x: row[1].clone(),
            y: row[2].clone(),
            count: row[3].as_i64().unwrap_or(0),
        };
        match series.last_mut() {
            // groups come out sorted by facet first
            Some(last) if last.facet == row[0] => last.points.push(point),
            _ => series.push(FacetSeries {
                facet: row[0].clone(),
                points: vec![point],
            }),
        }
    }
    Ok(series)
}

/// Distribution of `y` for one color group, with the `x` category per sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolinSeries {
    pub group: Value,
    pub x: Vec<Value>,
    pub y: Vec<f64>,
}

/// Samples of numeric `y` per `color` group, in row order
pub fn violin_groups(
    table: &Table,
    x: &str,
    y: &str,
    color: &str,
) -> Result<Vec<ViolinSeries>, StatsError> {
    let x_idx = table.column_index(x)?;
    let y_idx = table.column_index(y)?;
    let color_idx = table.column_index(color)?;

    let mut groups: BTreeMap<&Value, ViolinSeries> = BTreeMap::new();
    for row in table.rows() {
        let sample = row[y_idx].as_f64().ok_or_else(|| StatsError::NonNumeric {
            column: y.to_string(),
            value: row[y_idx].to_string(),
        })?;
        let series = groups
            .entry(&row[color_idx])
            .or_insert_with(|| ViolinSeries {
                group: row[color_idx].clone(),
                x: Vec::new(),
                y: Vec::new(),
            });
        series.x.push(row[x_idx].clone());
        series.y.push(sample);
    }
    Ok(groups.into_values().collect())
}

/// Sankey diagram of how often each combination of `columns` occurs
///
/// Combinations seen fewer than `min_count` times are left out.
pub fn sankey_counts(
    table: &Table,
    columns: &[&str],
    min_count: i64,
    options: &SankeyOptions,
) -> Result<DiagramSpec, StatsError> {
    if columns.len() < 2 {
        return Err(SankeyError::InsufficientColumns(columns.len()).into());
    }

    let grouped = table
        .group_count(columns, COUNT_COLUMN)
        .map_err(SankeyError::from)?;
    let count_idx = columns.len();
    let frequent = grouped.filter(|row| row[count_idx].as_i64().is_some_and(|c| c >= min_count));

    Ok(make_sankey(&frequent, columns, Some(COUNT_COLUMN), options)?)
}
