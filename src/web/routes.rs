//! HTTP routes for the dashboard
//!
//! Provides API endpoints for figure data and static file serving.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::figures::{self, Figure};
use super::server::AppState;

/// Embedded static assets
#[derive(RustEmbed)]
#[folder = "web-assets/"]
struct Assets;

/// Frontend configuration
#[derive(Serialize)]
struct FrontendConfig {
    api_endpoint: Option<String>,
    columns: Vec<String>,
    month_range: Option<(i64, i64)>,
    sankey_columns: Vec<String>,
    min_count: i64,
}

/// Query parameters for the bar chart (the month slider)
#[derive(Deserialize)]
struct BarQuery {
    min_month: Option<i64>,
    max_month: Option<i64>,
}

/// Query parameters for the Sankey diagram
#[derive(Deserialize)]
struct SankeyQuery {
    /// Comma-separated column names
    cols: Option<String>,
    min_count: Option<i64>,
}

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/config", get(get_config))
        .route("/api/bar", get(get_bar))
        .route("/api/sankey", get(get_sankey))
        .route("/api/scatter", get(get_scatter))
        .route("/api/violin", get(get_violin))
}

/// Create static file routes
pub fn static_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index_html))
        .route("/{*path}", get(static_handler))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn figure_response<E: std::fmt::Display>(figure: Result<Figure, E>) -> Response {
    match figure {
        Ok(figure) => Json(figure).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// GET /api/health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// GET /api/config - Returns frontend configuration
async fn get_config(State(state): State<Arc<AppState>>) -> Json<FrontendConfig> {
    let dashboard = &state.dashboard;
    Json(FrontendConfig {
        api_endpoint: state.api_endpoint.clone(),
        columns: dashboard.columns().to_vec(),
        month_range: dashboard.month_range(),
        sankey_columns: dashboard.default_sankey_columns().to_vec(),
        min_count: dashboard.default_min_count(),
    })
}

/// GET /api/bar - Mean streams per month within the selected months
async fn get_bar(State(state): State<Arc<AppState>>, Query(query): Query<BarQuery>) -> Response {
    debug!(min = ?query.min_month, max = ?query.max_month, "bar chart requested");
    figure_response(
        state
            .dashboard
            .bar(query.min_month, query.max_month)
            .map(|means| figures::bar_figure(&means)),
    )
}

/// GET /api/sankey - Sankey diagram over the selected columns
async fn get_sankey(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SankeyQuery>,
) -> Response {
    let dashboard = &state.dashboard;
    let columns: Vec<&str> = match &query.cols {
        Some(cols) => cols
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect(),
        None => dashboard
            .default_sankey_columns()
            .iter()
            .map(String::as_str)
            .collect(),
    };
    debug!(?columns, min_count = ?query.min_count, "sankey requested");

    figure_response(
        dashboard
            .sankey(&columns, query.min_count)
            .map(|spec| figures::sankey_figure(&spec, &columns)),
    )
}

/// GET /api/scatter - Faceted scatter plot
async fn get_scatter(State(state): State<Arc<AppState>>) -> Json<Figure> {
    let charts = state.dashboard.charts();
    Json(figures::scatter_figure(
        state.dashboard.scatter(),
        &charts.scatter_x,
        &charts.scatter_y,
    ))
}

/// GET /api/violin - Violin plot
async fn get_violin(State(state): State<Arc<AppState>>) -> Response {
    let charts = state.dashboard.charts();
    figure_response(
        state
            .dashboard
            .violin()
            .map(|series| figures::violin_figure(&series, &charts.scatter_x, &charts.scatter_y)),
    )
}

/// GET / - Serve index.html
async fn index_html() -> impl IntoResponse {
    match Assets::get("index.html") {
        Some(content) => Html(content.data.into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

/// Static file handler for embedded assets
async fn static_handler(
    axum::extract::Path(path): axum::extract::Path<String>,
) -> impl IntoResponse {
    let path = path.trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response(),
    }
}
