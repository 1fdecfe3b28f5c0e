//! Sankey diagram preparation
//!
//! Turns a table of categorical columns into the node/link description a
//! Sankey renderer consumes. The pipeline has three stages:
//!
//! 1. **Column stacking** ([`stack_columns`]) - every adjacent pair of the
//!    chosen columns becomes one hop of `source -> target` edges, and edges
//!    sharing the same pair are merged by summing their weights.
//! 2. **Label coding** ([`code_labels`]) - every distinct source/target value
//!    gets one integer code in a single global numbering space.
//! 3. **Assembly** ([`make_sankey`]) - derives a count weight when none is
//!    given, runs the two stages above and returns a [`DiagramSpec`].
//!
//! Label codes follow the [`Value`] ordering, so the same input always
//! produces the same diagram.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::table::{Table, TableError, Value};

/// Name of the column derived by counting rows when no weight is given
pub const COUNT_COLUMN: &str = "count";

/// Errors raised while preparing a Sankey diagram
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SankeyError {
    #[error("At least 2 columns are required to create a Sankey diagram (got {0})")]
    InsufficientColumns(usize),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Cannot sum weight column '{column}': non-numeric value {value:?}")]
    NonNumericWeight { column: String, value: String },

    #[error("Table error: {0}")]
    Table(TableError),
}

impl From<TableError> for SankeyError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::ColumnNotFound(name) => SankeyError::ColumnNotFound(name),
            other => SankeyError::Table(other),
        }
    }
}

/// One aggregated `source -> target` edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    pub source: Value,
    pub target: Value,
    pub weight: f64,
}

/// Output of the column stacker, one record per distinct (source, target)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeTable {
    pub edges: Vec<EdgeRecord>,
}

impl EdgeTable {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Stack adjacent column pairs into an aggregated edge table
///
/// For columns `[c0, c1, ..., cn]` this emits `c0 -> c1`, `c1 -> c2`, ...,
/// each row contributing its `weight_column` value to its edge. Edges with
/// the same (source, target) pair are summed; the result is ordered by
/// (source, target).
///
/// Weights must be numeric; a text or null weight fails with
/// [`SankeyError::NonNumericWeight`]. Negative and zero weights are summed
/// as given, so a pair can net out to zero or below.
pub fn stack_columns(
    table: &Table,
    columns: &[&str],
    weight_column: &str,
) -> Result<EdgeTable, SankeyError> {
    if columns.len() < 2 {
        return Err(SankeyError::InsufficientColumns(columns.len()));
    }

    let indices = table.column_indices(columns)?;
    let weight_idx = table.column_index(weight_column)?;

    let mut weights: BTreeMap<(&Value, &Value), f64> = BTreeMap::new();
    for row in table.rows() {
        let weight = row[weight_idx]
            .as_f64()
            .ok_or_else(|| SankeyError::NonNumericWeight {
                column: weight_column.to_string(),
                value: row[weight_idx].to_string(),
            })?;

        for hop in indices.windows(2) {
            *weights.entry((&row[hop[0]], &row[hop[1]])).or_insert(0.0) += weight;
        }
    }

    let edges = weights
        .into_iter()
        .map(|((source, target), weight)| EdgeRecord {
            source: source.clone(),
            target: target.clone(),
            weight,
        })
        .collect();

    Ok(EdgeTable { edges })
}

/// A link expressed in label codes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CodedLink {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// Edge table rewritten in terms of label codes
///
/// `labels[code]` is the label for `code`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeTable {
    pub links: Vec<CodedLink>,
    pub labels: Vec<Value>,
}

impl CodeTable {
    /// Label for a code, if the code is in range
    pub fn label(&self, code: usize) -> Option<&Value> {
        self.labels.get(code)
    }
}

/// Assign one integer code per distinct label and rewrite the edges
///
/// Labels from every column share one numbering space; codes are given in
/// sorted [`Value`] order.
pub fn code_labels(edges: &EdgeTable) -> CodeTable {
    let distinct: BTreeSet<&Value> = edges
        .edges
        .iter()
        .flat_map(|e| [&e.source, &e.target])
        .collect();

    let codes: BTreeMap<&Value, usize> = distinct
        .iter()
        .enumerate()
        .map(|(code, &label)| (label, code))
        .collect();

    let links = edges
        .edges
        .iter()
        .map(|e| CodedLink {
            source: codes[&e.source],
            target: codes[&e.target],
            weight: e.weight,
        })
        .collect();

    CodeTable {
        links,
        labels: distinct.into_iter().cloned().collect(),
    }
}

/// Stroke style for links and node outlines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
}

impl LineStyle {
    pub fn new(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
        }
    }
}

/// Visual options passed through to the renderer untouched
#[derive(Debug, Clone, PartialEq)]
pub struct SankeyOptions {
    pub node_thickness: f64,
    pub node_pad: f64,
    pub link_line: LineStyle,
    pub node_line: LineStyle,
    /// Where the renderer should write the finished figure, if anywhere
    pub save: Option<PathBuf>,
}

impl Default for SankeyOptions {
    fn default() -> Self {
        Self {
            node_thickness: 50.0,
            node_pad: 50.0,
            link_line: LineStyle::new("black", 2.0),
            node_line: LineStyle::new("black", 1.0),
            save: None,
        }
    }
}

/// Passthrough style section of a [`DiagramSpec`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramStyle {
    pub node_thickness: f64,
    pub node_pad: f64,
    pub link_line: LineStyle,
    pub node_line: LineStyle,
}

/// A link of the finished diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

/// Node and link description ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramSpec {
    /// Node labels in code order
    pub nodes: Vec<String>,
    pub links: Vec<Link>,
    pub style: DiagramStyle,
}

impl DiagramSpec {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Total weight carried by all links
    pub fn total_value(&self) -> f64 {
        self.links.iter().map(|l| l.value).sum()
    }

    fn from_codes(codes: CodeTable, options: &SankeyOptions) -> Self {
        Self {
            nodes: codes.labels.iter().map(ToString::to_string).collect(),
            links: codes
                .links
                .iter()
                .map(|l| Link {
                    source: l.source,
                    target: l.target,
                    value: l.weight,
                })
                .collect(),
            style: DiagramStyle {
                node_thickness: options.node_thickness,
                node_pad: options.node_pad,
                link_line: options.link_line.clone(),
                node_line: options.node_line.clone(),
            },
        }
    }
}

/// Build a Sankey diagram over `columns`
///
/// When `weight_column` is `None` the table is grouped by `columns` and the
/// row count of each group (column [`COUNT_COLUMN`]) is used as the weight.
pub fn make_sankey(
    table: &Table,
    columns: &[&str],
    weight_column: Option<&str>,
    options: &SankeyOptions,
) -> Result<DiagramSpec, SankeyError> {
    if columns.len() < 2 {
        return Err(SankeyError::InsufficientColumns(columns.len()));
    }

    let edges = match weight_column {
        Some(weight) => stack_columns(table, columns, weight)?,
        None => {
            let grouped = table.group_count(columns, COUNT_COLUMN)?;
            stack_columns(&grouped, columns, COUNT_COLUMN)?
        }
    };

    let codes = code_labels(&edges);
    Ok(DiagramSpec::from_codes(codes, options))
}
