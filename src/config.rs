//! Configuration file support for spotify-dashboard
//!
//! This module handles parsing `.dashboard.toml` configuration files that
//! describe where the dataset lives, how to clean it, and the defaults used
//! by the dashboard views.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # .dashboard.toml
//!
//! [data]
//! # CSV file, relative to this config file
//! path = "spotify-2023.csv"
//! encoding = "iso-8859-1"
//!
//! # Columns to keep (empty keeps everything)
//! columns = ["track_name", "released_year", "released_month", "streams", "key", "mode"]
//!
//! # Rows whose value in these columns is not an integer are dropped
//! integer_columns = ["released_year", "released_month", "streams"]
//!
//! [sankey]
//! columns = ["released_year", "mode"]
//! min_count = 3
//! node_thickness = 50
//! node_pad = 50
//!
//! [charts]
//! scatter_x = "key"
//! scatter_y = "bpm"
//! facet = "mode"
//!
//! [server]
//! port = 8050
//! open_browser = true
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::loader::{Encoding, LoadOptions};
use crate::sankey::SankeyOptions;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

const SPOTIFY_COLUMNS: &[&str] = &[
    "track_name",
    "artist(s)_name",
    "artist_count",
    "released_year",
    "released_month",
    "in_spotify_playlists",
    "in_spotify_charts",
    "streams",
    "bpm",
    "key",
    "mode",
    "danceability_%",
    "valence_%",
    "energy_%",
    "acousticness_%",
    "instrumentalness_%",
    "liveness_%",
    "speechiness_%",
];

const SPOTIFY_INTEGER_COLUMNS: &[&str] = &[
    "released_year",
    "released_month",
    "in_spotify_playlists",
    "in_spotify_charts",
    "streams",
    "bpm",
    "danceability_%",
    "valence_%",
    "energy_%",
    "acousticness_%",
    "instrumentalness_%",
    "liveness_%",
    "speechiness_%",
];

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Dataset configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// CSV file to load
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    #[serde(default = "default_encoding")]
    pub encoding: Encoding,

    /// Columns to keep
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,

    /// Columns that must hold integers
    #[serde(default = "default_integer_columns")]
    pub integer_columns: Vec<String>,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("spotify-2023.csv")
}

fn default_encoding() -> Encoding {
    Encoding::Latin1
}

fn default_columns() -> Vec<String> {
    strings(SPOTIFY_COLUMNS)
}

fn default_integer_columns() -> Vec<String> {
    strings(SPOTIFY_INTEGER_COLUMNS)
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            encoding: default_encoding(),
            columns: default_columns(),
            integer_columns: default_integer_columns(),
        }
    }
}

impl DataConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            columns: self.columns.clone(),
            integer_columns: self.integer_columns.clone(),
            encoding: self.encoding,
        }
    }
}

/// Sankey defaults
#[derive(Debug, Clone, Deserialize)]
pub struct SankeyConfig {
    /// Columns shown when the Sankey tab opens
    #[serde(default = "default_sankey_columns")]
    pub columns: Vec<String>,

    /// Combinations seen fewer times than this are hidden
    #[serde(default = "default_min_count")]
    pub min_count: i64,

    #[serde(default = "default_node_size")]
    pub node_thickness: f64,

    #[serde(default = "default_node_size")]
    pub node_pad: f64,
}

fn default_sankey_columns() -> Vec<String> {
    strings(&["released_year", "mode"])
}

fn default_min_count() -> i64 {
    3
}

fn default_node_size() -> f64 {
    50.0
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            columns: default_sankey_columns(),
            min_count: default_min_count(),
            node_thickness: default_node_size(),
            node_pad: default_node_size(),
        }
    }
}

impl SankeyConfig {
    pub fn options(&self) -> SankeyOptions {
        SankeyOptions {
            node_thickness: self.node_thickness,
            node_pad: self.node_pad,
            ..SankeyOptions::default()
        }
    }
}

/// Columns used by the scatter and violin views
#[derive(Debug, Clone, Deserialize)]
pub struct ChartsConfig {
    #[serde(default = "default_scatter_x")]
    pub scatter_x: String,

    #[serde(default = "default_scatter_y")]
    pub scatter_y: String,

    #[serde(default = "default_facet")]
    pub facet: String,
}

fn default_scatter_x() -> String {
    "key".to_string()
}

fn default_scatter_y() -> String {
    "bpm".to_string()
}

fn default_facet() -> String {
    "mode".to_string()
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            scatter_x: default_scatter_x(),
            scatter_y: default_scatter_y(),
            facet: default_facet(),
        }
    }
}

/// Web server configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_port() -> u16 {
    8050
}

fn default_open_browser() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            open_browser: default_open_browser(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub sankey: SankeyConfig,

    #[serde(default)]
    pub charts: ChartsConfig,

    #[serde(default)]
    pub server: ServerSection,
}

/// Values given on the command line; each one replaces its config entry
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_path: Option<PathBuf>,
    pub encoding: Option<Encoding>,
    pub min_count: Option<i64>,
    pub node_thickness: Option<f64>,
    pub port: Option<u16>,
}

impl DashboardConfig {
    /// Parse a config from TOML text and check it
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line values on top of the file config, then re-check it
    pub fn apply_overrides(&mut self, overrides: &CliOverrides) -> Result<(), ConfigError> {
        if let Some(path) = &overrides.data_path {
            self.data.path = path.clone();
        }
        if let Some(encoding) = overrides.encoding {
            self.data.encoding = encoding;
        }
        if let Some(min_count) = overrides.min_count {
            self.sankey.min_count = min_count;
        }
        if let Some(thickness) = overrides.node_thickness {
            self.sankey.node_thickness = thickness;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sankey.columns.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "[sankey].columns needs at least 2 columns, got {}",
                self.sankey.columns.len()
            )));
        }
        if self.sankey.node_thickness <= 0.0 || self.sankey.node_pad < 0.0 {
            return Err(ConfigError::Invalid(
                "[sankey] node sizes must be positive".to_string(),
            ));
        }
        if self.sankey.min_count < 0 {
            return Err(ConfigError::Invalid(format!(
                "[sankey].min_count must not be negative, got {}",
                self.sankey.min_count
            )));
        }
        Ok(())
    }
}

/// Load configuration starting from the given path
///
/// Searches for `.dashboard.toml` in the given directory and parent
/// directories. A relative `[data].path` is resolved against the directory
/// holding the config file.
pub fn load_config(start_path: &Path) -> Result<DashboardConfig, ConfigError> {
    match find_config_file(start_path) {
        Some(path) => load_config_file(&path),
        None => Ok(DashboardConfig::default()),
    }
}

/// Load one specific configuration file
pub fn load_config_file(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = DashboardConfig::from_toml(&content)?;
    if config.data.path.is_relative() {
        if let Some(dir) = path.parent() {
            config.data.path = dir.join(&config.data.path);
        }
    }
    Ok(config)
}

/// Find the config file by searching up the directory tree
fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = [".dashboard.toml", "dashboard.toml"];

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &config_names {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // Move to parent directory
        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.data.encoding, Encoding::Latin1);
        assert_eq!(config.data.columns.len(), 18);
        assert_eq!(config.data.integer_columns.len(), 13);
        assert_eq!(config.sankey.columns, vec!["released_year", "mode"]);
        assert_eq!(config.sankey.min_count, 3);
        assert_eq!(config.server.port, 8050);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [data]
            path = "songs.csv"
            encoding = "utf-8"
            columns = ["artist", "mode"]
            integer_columns = []

            [sankey]
            columns = ["artist", "mode"]
            min_count = 1
            node_thickness = 20

            [server]
            port = 9000
        "#;

        let config = DashboardConfig::from_toml(toml).unwrap();
        assert_eq!(config.data.path, PathBuf::from("songs.csv"));
        assert_eq!(config.data.encoding, Encoding::Utf8);
        assert_eq!(config.data.columns.len(), 2);
        assert!(config.data.integer_columns.is_empty());
        assert_eq!(config.sankey.min_count, 1);
        assert_eq!(config.sankey.node_thickness, 20.0);
        assert_eq!(config.sankey.node_pad, 50.0);
        assert_eq!(config.server.port, 9000);
        assert!(config.server.open_browser);
        assert_eq!(config.charts.scatter_y, "bpm");
    }

    #[test]
    fn test_sankey_needs_two_columns() {
        let toml = r#"
            [sankey]
            columns = ["mode"]
        "#;
        assert!(matches!(
            DashboardConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_cli_overrides_win_over_file() {
        let mut config = DashboardConfig::from_toml(
            "[sankey]\nmin_count = 5\nnode_thickness = 20\n[server]\nport = 9000\n",
        )
        .unwrap();

        config
            .apply_overrides(&CliOverrides {
                min_count: Some(1),
                port: Some(8080),
                ..CliOverrides::default()
            })
            .unwrap();

        assert_eq!(config.sankey.min_count, 1);
        assert_eq!(config.server.port, 8080);
        // untouched entries keep the file value
        assert_eq!(config.sankey.node_thickness, 20.0);
        assert_eq!(config.sankey.columns, vec!["released_year", "mode"]);
    }

    #[test]
    fn test_invalid_cli_overrides_rejected() {
        let mut config = DashboardConfig::default();
        let err = config.apply_overrides(&CliOverrides {
            node_thickness: Some(-5.0),
            ..CliOverrides::default()
        });
        assert!(matches!(err, Err(ConfigError::Invalid(_))));

        let mut config = DashboardConfig::default();
        let err = config.apply_overrides(&CliOverrides {
            min_count: Some(-1),
            ..CliOverrides::default()
        });
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_sankey_options_from_config() {
        let config = SankeyConfig {
            node_thickness: 12.0,
            ..SankeyConfig::default()
        };
        let options = config.options();
        assert_eq!(options.node_thickness, 12.0);
        assert_eq!(options.node_pad, 50.0);
        assert!(options.save.is_none());
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".dashboard.toml"),
            "[data]\npath = \"data/songs.csv\"\n",
        )
        .unwrap();
        let nested = dir.path().join("data");
        fs::create_dir(&nested).unwrap();

        let config = load_config(&nested).unwrap();
        assert_eq!(config.data.path, dir.path().join("data/songs.csv"));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dashboard.toml");
        fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
