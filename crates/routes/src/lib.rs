pub mod analyzer;
pub mod cache;
pub mod complexity;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod gpx_processor;
pub mod gradient;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod power;
pub mod request_id;
pub mod retry;
pub mod statistics;
pub mod terrain;
pub mod traffic;

use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::{
    analyzer::RouteAnalyzer,
    config::AnalysisConfig,
    handlers::{analyze_batch, analyze_gpx, analyze_route, health_check},
    request_id::request_id_middleware,
};

/// GPX uploads and large batches can exceed axum's 2 MB default.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn create_router(analyzer: Arc<RouteAnalyzer>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/routes/analyze", post(analyze_route))
        .route("/routes/analyze/gpx", post(analyze_gpx))
        .route("/routes/analyze/batch", post(analyze_batch))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(Extension(analyzer))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}

pub async fn run_server(config: AnalysisConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!(
        "Traffic analysis {} (Overpass endpoint {})",
        if config.enable_traffic_analysis { "enabled" } else { "disabled" },
        config.overpass.endpoint
    );

    let analyzer = Arc::new(RouteAnalyzer::new(config)?);
    let app = create_router(analyzer);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
