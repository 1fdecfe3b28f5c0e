//! spotify-dashboard CLI - Song Dataset Dashboard
//!
//! Loads the Spotify song dataset and either serves the interactive
//! dashboard or prints a summary / Sankey diagram.
//!
//! Usage:
//!   spotify-dashboard [OPTIONS] [CSV]

use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use spotify_dashboard::{
    CliOverrides, DashboardConfig, DashboardContext, Encoding, SankeyOptions, generate_sankey_json,
    generate_sankey_report, generate_summary, generate_summary_json, load_config,
    load_config_file, read_and_clean_csv, sankey_counts,
    web::{ServerConfig, figures::sankey_figure, start_server, write_figure},
};

/// spotify-dashboard - Explore the Spotify song dataset
#[derive(Parser, Debug)]
#[command(name = "spotify-dashboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to load (default: [data].path from the config)
    path: Option<PathBuf>,

    /// Config file path (default: search for .dashboard.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text encoding of the CSV (utf-8 or iso-8859-1)
    #[arg(long)]
    encoding: Option<Encoding>,

    /// Output file for the report (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a Sankey diagram over these columns (two or more)
    #[arg(long, num_args = 1.., value_name = "COLUMN")]
    sankey: Vec<String>,

    /// Hide Sankey combinations seen fewer times than this
    #[arg(long)]
    min_count: Option<i64>,

    /// Sankey node thickness
    #[arg(long)]
    node_thickness: Option<f64>,

    /// Also write the Sankey figure JSON to this path
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Machine-readable JSON output
    #[arg(long)]
    json: bool,

    /// Show the dataset summary (default when --sankey is not given)
    #[arg(short, long)]
    summary: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads used while cleaning the CSV (default: all CPU cores)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,

    // === Web dashboard options ===
    /// Start web server for the interactive dashboard
    #[arg(long)]
    web: bool,

    /// Port for web server (default: [server].port, 8050)
    #[arg(long)]
    port: Option<u16>,

    /// Don't open browser automatically when starting web server
    #[arg(long)]
    no_open: bool,

    /// API endpoint URL for frontend (useful for separate deployments)
    #[arg(long)]
    api_endpoint: Option<String>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "spotify_dashboard=debug,tower_http=debug"
    } else {
        "spotify_dashboard=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .unwrap_or_else(|e| warn!("Could not set thread count: {}", e));
    }

    let total_start = Instant::now();

    // Load configuration file
    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => {
            let start = args.path.clone().unwrap_or_else(|| PathBuf::from("."));
            match load_config(&start) {
                Ok(config) => config,
                Err(e) => {
                    warn!("No config file loaded: {}", e);
                    DashboardConfig::default()
                }
            }
        }
    };

    // CLI args override config, which overrides defaults
    config.apply_overrides(&CliOverrides {
        data_path: args.path.clone(),
        encoding: args.encoding,
        min_count: args.min_count,
        node_thickness: args.node_thickness,
        port: args.port,
    })?;

    info!("Loading dataset from '{}'...", config.data.path.display());
    let load_start = Instant::now();
    let table = read_and_clean_csv(&config.data.path, &config.data.load_options())?;
    debug!("Dataset loaded in {:.2?}", load_start.elapsed());

    let dashboard = DashboardContext::new(table, &config)?;

    // Web dashboard mode
    if args.web {
        let server_config = ServerConfig {
            port: config.server.port,
            open_browser: config.server.open_browser && !args.no_open,
            api_endpoint: args.api_endpoint.clone(),
        };

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(start_server(dashboard, server_config))
            .map_err(|e| -> Box<dyn std::error::Error> { e })?;

        return Ok(());
    }

    // Generate output
    let output: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(stdout()),
    };

    let mut writer = output;

    if args.summary || args.sankey.is_empty() {
        if args.json {
            generate_summary_json(&dashboard, &mut writer)?;
        } else {
            generate_summary(&dashboard, &mut writer)?;
        }
    }

    if !args.sankey.is_empty() {
        let columns: Vec<&str> = args.sankey.iter().map(String::as_str).collect();
        let min_count = dashboard.default_min_count();
        let options = SankeyOptions {
            save: args.save.clone(),
            ..dashboard.sankey_options()
        };
        let spec = sankey_counts(dashboard.table(), &columns, min_count, &options)?;

        if args.json {
            generate_sankey_json(&spec, &columns, min_count, &mut writer)?;
        } else {
            generate_sankey_report(&spec, &columns, &mut writer)?;
        }

        if let Some(path) = &options.save {
            write_figure(&sankey_figure(&spec, &columns), path)?;
            info!("Sankey figure written to: {}", path.display());
        }
    }

    writer.flush()?;

    // Notify about output file
    if let Some(path) = &args.output {
        info!("Report written to: {}", path.display());
    }

    debug!("Total time: {:.2?}", total_start.elapsed());

    Ok(())
}
