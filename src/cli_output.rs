//! JSON output for automation
//!
//! Machine-readable counterparts of the text reports, written with serde_json.

use std::io::{self, Write};

use serde::Serialize;

use crate::dashboard::DashboardContext;
use crate::sankey::DiagramSpec;
use crate::stats::GroupMean;

/// Dataset summary in JSON form
#[derive(Debug, Serialize)]
pub struct SummaryOutput<'a> {
    pub rows: usize,
    pub columns: &'a [String],
    pub month_range: Option<(i64, i64)>,
    pub monthly_means: &'a [GroupMean],
}

/// Sankey diagram plus the request that produced it
#[derive(Debug, Serialize)]
pub struct SankeyOutput<'a> {
    pub columns: &'a [&'a str],
    pub min_count: i64,
    pub total_value: f64,
    #[serde(flatten)]
    pub diagram: &'a DiagramSpec,
}

fn write_json<W: Write, T: Serialize>(value: &T, writer: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}

/// Write the dataset summary as JSON
pub fn generate_summary_json<W: Write>(
    dashboard: &DashboardContext,
    writer: &mut W,
) -> io::Result<()> {
    let output = SummaryOutput {
        rows: dashboard.table().num_rows(),
        columns: dashboard.columns(),
        month_range: dashboard.month_range(),
        monthly_means: dashboard.monthly_means(),
    };
    write_json(&output, writer)
}

/// Write a Sankey diagram as JSON
pub fn generate_sankey_json<W: Write>(
    spec: &DiagramSpec,
    columns: &[&str],
    min_count: i64,
    writer: &mut W,
) -> io::Result<()> {
    let output = SankeyOutput {
        columns,
        min_count,
        total_value: spec.total_value(),
        diagram: spec,
    };
    write_json(&output, writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::sample_context;

    #[test]
    fn test_summary_json() {
        let ctx = sample_context();
        let mut output = Vec::new();
        generate_summary_json(&ctx, &mut output).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["rows"], 7);
        assert_eq!(json["month_range"], serde_json::json!([1, 6]));
        assert_eq!(json["monthly_means"][0]["key"], 1);
        assert_eq!(json["monthly_means"][0]["mean"], 200.0);
    }

    #[test]
    fn test_sankey_json() {
        let ctx = sample_context();
        let spec = ctx.sankey(&["released_year", "mode"], Some(1)).unwrap();

        let mut output = Vec::new();
        generate_sankey_json(&spec, &["released_year", "mode"], 1, &mut output).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["columns"], serde_json::json!(["released_year", "mode"]));
        assert_eq!(json["total_value"], 7.0);
        assert_eq!(
            json["nodes"],
            serde_json::json!(["2022", "2023", "major", "minor"])
        );
        assert_eq!(
            json["links"][0],
            serde_json::json!({"source": 0, "target": 2, "value": 2.0})
        );
        assert_eq!(json["style"]["node_thickness"], 50.0);
    }
}
