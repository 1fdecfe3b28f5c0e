//! Report generation for the dashboard data
//!
//! Generates human-readable text reports: a dataset summary and the
//! node/link listing of a Sankey diagram.

use std::io::{self, Write};

use crate::dashboard::DashboardContext;
use crate::sankey::DiagramSpec;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const BAR_WIDTH: usize = 30;

/// Generate a dataset summary to the given writer
pub fn generate_summary<W: Write>(dashboard: &DashboardContext, writer: &mut W) -> io::Result<()> {
    let table = dashboard.table();

    writeln!(writer, "Spotify Dataset Summary")?;
    writeln!(writer, "{}", RULE)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Songs: {} | Columns: {}",
        table.num_rows(),
        table.columns().len()
    )?;
    match dashboard.month_range() {
        Some((lo, hi)) => writeln!(writer, "Release months: {} - {}", lo, hi)?,
        None => writeln!(writer, "Release months: none")?,
    }
    writeln!(writer)?;

    writeln!(writer, "Distinct values per column:")?;
    for name in table.columns() {
        let distinct = table
            .distinct_values(name)
            .map(|values| values.len())
            .unwrap_or(0);
        writeln!(writer, "  {:<24} {}", name, distinct)?;
    }
    writeln!(writer)?;

    let means = dashboard.monthly_means();
    if !means.is_empty() {
        writeln!(writer, "Average Streams per Month:")?;
        let max = means.iter().map(|m| m.mean).fold(0.0_f64, f64::max);
        for m in means {
            let len = if max > 0.0 {
                ((m.mean / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            writeln!(
                writer,
                "  {:>4} {:<width$} {:.0}",
                m.key.to_string(),
                "█".repeat(len),
                m.mean,
                width = BAR_WIDTH
            )?;
        }
        writeln!(writer)?;
    }

    let charts = dashboard.charts();
    let scatter = dashboard.scatter();
    if !scatter.is_empty() {
        writeln!(
            writer,
            "{} vs. {} by {}:",
            charts.scatter_y, charts.scatter_x, charts.facet
        )?;
        for series in scatter {
            let songs: i64 = series.points.iter().map(|p| p.count).sum();
            writeln!(
                writer,
                "  {:<8} {} songs, {} distinct points",
                series.facet.to_string(),
                songs,
                series.points.len()
            )?;
        }
    }

    Ok(())
}

/// Generate the node and link listing of a Sankey diagram
pub fn generate_sankey_report<W: Write>(
    spec: &DiagramSpec,
    columns: &[&str],
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "Sankey: {}", columns.join(" → "))?;
    writeln!(writer, "{}", RULE)?;
    writeln!(writer)?;

    if spec.is_empty() {
        writeln!(writer, "No links (every combination was filtered out)")?;
        return Ok(());
    }

    writeln!(
        writer,
        "Nodes: {} | Links: {} | Total weight: {}",
        spec.nodes.len(),
        spec.links.len(),
        spec.total_value()
    )?;
    writeln!(writer)?;

    writeln!(writer, "| Code | Label |")?;
    writeln!(writer, "|------|-------|")?;
    for (code, label) in spec.nodes.iter().enumerate() {
        writeln!(writer, "| {} | {} |", code, label)?;
    }
    writeln!(writer)?;

    writeln!(writer, "| Source | Target | Weight |")?;
    writeln!(writer, "|--------|--------|--------|")?;
    for link in &spec.links {
        writeln!(
            writer,
            "| {} | {} | {} |",
            spec.nodes[link.source], spec.nodes[link.target], link.value
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::sample_context;
    use crate::sankey::{SankeyOptions, make_sankey};
    use crate::table::Table;

    #[test]
    fn test_generate_summary() {
        let ctx = sample_context();
        let mut output = Vec::new();

        let result = generate_summary(&ctx, &mut output);
        assert!(result.is_ok());

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("Spotify Dataset Summary"));
        assert!(output_str.contains("Songs: 7 | Columns: 6"));
        assert!(output_str.contains("Release months: 1 - 6"));
        assert!(output_str.contains("bpm vs. key by mode:"));
        assert!(output_str.contains(&format!("  {:<24} {}", "key", 3)));
        assert!(output_str.contains(&format!("  {:<24} {}", "released_year", 2)));
    }

    #[test]
    fn test_generate_sankey_report() {
        let table = Table::from_rows(
            ["a", "b"],
            vec![vec!["x".into(), "y".into()], vec!["x".into(), "y".into()]],
        )
        .unwrap();
        let spec = make_sankey(&table, &["a", "b"], None, &SankeyOptions::default()).unwrap();

        let mut output = Vec::new();
        generate_sankey_report(&spec, &["a", "b"], &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("Sankey: a → b"));
        assert!(output_str.contains("Nodes: 2 | Links: 1 | Total weight: 2"));
        assert!(output_str.contains("| x | y | 2 |"));
    }

    #[test]
    fn test_empty_sankey_report() {
        let table = Table::new(["a", "b"]).unwrap();
        let spec = make_sankey(&table, &["a", "b"], None, &SankeyOptions::default()).unwrap();

        let mut output = Vec::new();
        generate_sankey_report(&spec, &["a", "b"], &mut output).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("No links"));
    }
}
