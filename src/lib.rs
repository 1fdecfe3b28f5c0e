//! # spotify-dashboard - Song Dataset Dashboard
//!
//! A small dashboard for the Spotify 2023 song dataset. It loads and cleans
//! the CSV once, then serves three interactive views in the browser:
//!
//! 1. **Streaming statistics** - mean streams per release month, with a
//!    month range slider
//! 2. **Sankey generator** - flows between any two or more categorical
//!    columns (e.g. release year → mode)
//! 3. **Musical statistics** - BPM vs key by mode, as a faceted scatter and
//!    a violin plot
//!
//! ## Usage
//!
//! ```bash
//! # Serve the dashboard
//! spotify-dashboard --web spotify-2023.csv
//!
//! # Print a Sankey diagram of released_year -> mode
//! spotify-dashboard spotify-2023.csv --sankey released_year mode
//!
//! # Same diagram as JSON, keeping pairs seen at least once
//! spotify-dashboard spotify-2023.csv --json --min-count 1 --sankey released_year key mode
//! ```
//!
//! ## Sankey pipeline
//!
//! ```text
//! table ──group/count──▶ stack_columns ──▶ code_labels ──▶ DiagramSpec
//!                         (source, target,   (codes + labels)  (nodes, links)
//!                          summed weight)
//! ```

pub mod cli_output;
pub mod config;
pub mod dashboard;
pub mod loader;
pub mod report;
pub mod sankey;
pub mod stats;
pub mod table;
pub mod web;

pub use cli_output::{SankeyOutput, SummaryOutput, generate_sankey_json, generate_summary_json};
pub use config::{
    ChartsConfig, CliOverrides, ConfigError, DashboardConfig, DataConfig, SankeyConfig,
    ServerSection, load_config, load_config_file,
};
pub use dashboard::DashboardContext;
pub use loader::{Encoding, LoadError, LoadOptions, clean_csv, read_and_clean_csv};
pub use report::{generate_sankey_report, generate_summary};
pub use sankey::{
    COUNT_COLUMN, CodeTable, CodedLink, DiagramSpec, DiagramStyle, EdgeRecord, EdgeTable,
    LineStyle, Link, SankeyError, SankeyOptions, code_labels, make_sankey, stack_columns,
};
pub use stats::{
    FacetSeries, GroupMean, ScatterPoint, StatsError, ViolinSeries, facet_scatter, filter_range,
    mean_streams_by_month, sankey_counts, violin_groups,
};
pub use table::{Table, TableError, Value};
