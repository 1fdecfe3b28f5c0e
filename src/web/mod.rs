//! Web dashboard for spotify-dashboard
//!
//! Serves a browser dashboard with three views, each backed by a JSON
//! figure endpoint rendered client-side with Plotly.js:
//! - Streaming statistics (mean streams per month, month range slider)
//! - Sankey generator (any two or more categorical columns)
//! - Musical statistics (BPM vs key by mode, scatter and violin)

pub mod figures;
pub mod routes;
pub mod server;

pub use figures::{Figure, write_figure};
pub use server::{AppState, ServerConfig, build_router, start_server};
