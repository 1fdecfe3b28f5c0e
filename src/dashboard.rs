//! Dashboard context
//!
//! [`DashboardContext`] owns the cleaned dataset together with the aggregates
//! computed once at startup. It is built before the server starts and only
//! read afterwards; every view is a pure function of the context and the
//! current selection (month range, chosen columns).

use crate::config::{ChartsConfig, DashboardConfig, SankeyConfig};
use crate::sankey::{DiagramSpec, SankeyOptions};
use crate::stats::{
    self, FacetSeries, GroupMean, MONTH_COLUMN, StatsError, ViolinSeries, filter_range,
    mean_streams_by_month,
};
use crate::table::Table;

/// Read-only state shared by every dashboard view
#[derive(Debug, Clone)]
pub struct DashboardContext {
    table: Table,
    monthly_means: Vec<GroupMean>,
    month_range: Option<(i64, i64)>,
    scatter: Vec<FacetSeries>,
    sankey: SankeyConfig,
    charts: ChartsConfig,
}

impl DashboardContext {
    /// Build the context and precompute the startup aggregates
    pub fn new(table: Table, config: &DashboardConfig) -> Result<Self, StatsError> {
        let monthly_means = mean_streams_by_month(&table)?;
        let month_range = stats::key_range(&monthly_means);
        let charts = config.charts.clone();
        let scatter = stats::facet_scatter(
            &table,
            &charts.scatter_x,
            &charts.scatter_y,
            &charts.facet,
        )?;

        Ok(Self {
            table,
            monthly_means,
            month_range,
            scatter,
            sankey: config.sankey.clone(),
            charts,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        self.table.columns()
    }

    /// Smallest and largest release month in the dataset
    pub fn month_range(&self) -> Option<(i64, i64)> {
        self.month_range
    }

    pub fn monthly_means(&self) -> &[GroupMean] {
        &self.monthly_means
    }

    pub fn charts(&self) -> &ChartsConfig {
        &self.charts
    }

    pub fn default_sankey_columns(&self) -> &[String] {
        &self.sankey.columns
    }

    pub fn default_min_count(&self) -> i64 {
        self.sankey.min_count
    }

    pub fn sankey_options(&self) -> SankeyOptions {
        self.sankey.options()
    }

    /// Mean streams per month, restricted to an inclusive month range
    ///
    /// A missing bound falls back to the dataset's own bound.
    pub fn bar(
        &self,
        min_month: Option<i64>,
        max_month: Option<i64>,
    ) -> Result<Vec<GroupMean>, StatsError> {
        if min_month.is_none() && max_month.is_none() {
            return Ok(self.monthly_means.clone());
        }

        let (lo, hi) = self.month_range.unwrap_or((i64::MIN, i64::MAX));
        let lo = min_month.unwrap_or(lo);
        let hi = max_month.unwrap_or(hi);
        let filtered = filter_range(&self.table, MONTH_COLUMN, lo as f64, hi as f64)?;
        mean_streams_by_month(&filtered)
    }

    /// Sankey diagram over the given columns
    ///
    /// `min_count` defaults to the configured threshold.
    pub fn sankey(
        &self,
        columns: &[&str],
        min_count: Option<i64>,
    ) -> Result<DiagramSpec, StatsError> {
        stats::sankey_counts(
            &self.table,
            columns,
            min_count.unwrap_or(self.sankey.min_count),
            &self.sankey_options(),
        )
    }

    /// Scatter of the configured y against x, faceted, computed at startup
    pub fn scatter(&self) -> &[FacetSeries] {
        &self.scatter
    }

    /// Violin samples of the configured y per x, colored by facet
    pub fn violin(&self) -> Result<Vec<ViolinSeries>, StatsError> {
        stats::violin_groups(
            &self.table,
            &self.charts.scatter_x,
            &self.charts.scatter_y,
            &self.charts.facet,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::table::Value;

    pub(crate) fn sample_table() -> Table {
        let rows = [
            (2022, 1, 100, 120, "a", "major"),
            (2022, 1, 300, 120, "a", "major"),
            (2022, 3, 200, 90, "c#", "minor"),
            (2023, 3, 400, 120, "a", "major"),
            (2023, 6, 50, 100, "b", "minor"),
            (2023, 6, 70, 100, "b", "minor"),
            (2023, 6, 90, 100, "b", "minor"),
        ];
        Table::from_rows(
            ["released_year", "released_month", "streams", "bpm", "key", "mode"],
            rows.iter()
                .map(|&(year, month, streams, bpm, key, mode)| {
                    vec![
                        Value::Int(year),
                        Value::Int(month),
                        Value::Int(streams),
                        Value::Int(bpm),
                        Value::from(key),
                        Value::from(mode),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    pub(crate) fn sample_context() -> DashboardContext {
        DashboardContext::new(sample_table(), &DashboardConfig::default()).unwrap()
    }

    #[test]
    fn test_startup_aggregates() {
        let ctx = sample_context();
        assert_eq!(ctx.month_range(), Some((1, 6)));
        assert_eq!(ctx.monthly_means().len(), 3);
        assert_eq!(ctx.monthly_means()[0].mean, 200.0);
        assert_eq!(ctx.scatter().len(), 2);
    }

    #[test]
    fn test_bar_range() {
        let ctx = sample_context();
        assert_eq!(ctx.bar(None, None).unwrap(), ctx.monthly_means());

        let means = ctx.bar(Some(3), None).unwrap();
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].key, Value::Int(3));
        assert_eq!(means[0].mean, 300.0);

        let means = ctx.bar(None, Some(1)).unwrap();
        assert_eq!(means.len(), 1);

        assert!(ctx.bar(Some(7), Some(12)).unwrap().is_empty());
    }

    #[test]
    fn test_sankey_uses_configured_threshold() {
        let ctx = sample_context();
        // only (2023, minor) occurs 3 times
        let spec = ctx.sankey(&["released_year", "mode"], None).unwrap();
        assert_eq!(spec.nodes, vec!["2023", "minor"]);
        assert_eq!(spec.links[0].value, 3.0);

        let spec = ctx.sankey(&["released_year", "mode"], Some(1)).unwrap();
        assert_eq!(spec.links.len(), 4);
        assert_eq!(spec.total_value(), 7.0);
    }

    #[test]
    fn test_missing_dataset_columns() {
        let table = sample_table().select(&["bpm", "key", "mode"]).unwrap();
        assert!(DashboardContext::new(table, &DashboardConfig::default()).is_err());
    }

    #[test]
    fn test_violin() {
        let ctx = sample_context();
        let groups = ctx.violin().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].y, vec![90.0, 100.0, 100.0, 100.0]);
    }
}
