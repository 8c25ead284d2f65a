//! Route analysis handlers.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Json, Query},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    analyzer::RouteAnalyzer,
    errors::AppError,
    gpx_processor::GpxProcessor,
    models::{RouteStatistics, TrackPoint},
};

/// Upper bound on routes accepted by one batch request.
pub const MAX_BATCH_ROUTES: usize = 100;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRouteRequest {
    pub points: Vec<TrackPoint>,
    /// Overrides the server default when present.
    #[serde(default)]
    pub include_traffic_analysis: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeGpxQuery {
    pub include_traffic: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeGpxResponse {
    pub name: Option<String>,
    pub statistics: Arc<RouteStatistics>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeBatchRequest {
    pub routes: Vec<Vec<TrackPoint>>,
}

fn validate_points(points: &[TrackPoint]) -> Result<(), AppError> {
    if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| {
        !(-90.0..=90.0).contains(&p.lat)
            || !(-180.0..=180.0).contains(&p.lon)
            || p.elevation.is_some_and(|e| !e.is_finite())
    }) {
        return Err(AppError::InvalidInput(format!(
            "Point {i} is out of range: lat={}, lon={}",
            p.lat, p.lon
        )));
    }
    Ok(())
}

/// Analyze a route given as a JSON point list.
pub async fn analyze_route(
    Extension(analyzer): Extension<Arc<RouteAnalyzer>>,
    Json(req): Json<AnalyzeRouteRequest>,
) -> Result<Json<Arc<RouteStatistics>>, AppError> {
    validate_points(&req.points)?;

    let stats = analyzer
        .analyze(&req.points, req.include_traffic_analysis)
        .await;
    Ok(Json(stats))
}

/// Analyze a route uploaded as a raw GPX document.
pub async fn analyze_gpx(
    Extension(analyzer): Extension<Arc<RouteAnalyzer>>,
    Query(params): Query<AnalyzeGpxQuery>,
    body: Bytes,
) -> Result<Json<AnalyzeGpxResponse>, AppError> {
    let parsed = GpxProcessor::parse(&body)?;
    validate_points(&parsed.points)?;

    tracing::info!(
        "Analyzing GPX route {:?} with {} points",
        parsed.name,
        parsed.points.len()
    );

    let statistics = analyzer
        .analyze(&parsed.points, params.include_traffic)
        .await;
    Ok(Json(AnalyzeGpxResponse {
        name: parsed.name,
        statistics,
    }))
}

/// Analyze several routes at once. Traffic analysis is never run for batches.
pub async fn analyze_batch(
    Extension(analyzer): Extension<Arc<RouteAnalyzer>>,
    Json(req): Json<AnalyzeBatchRequest>,
) -> Result<Json<Vec<Arc<RouteStatistics>>>, AppError> {
    if req.routes.len() > MAX_BATCH_ROUTES {
        return Err(AppError::BatchTooLarge {
            got: req.routes.len(),
            max: MAX_BATCH_ROUTES,
        });
    }
    for points in &req.routes {
        validate_points(points)?;
    }

    let results = tokio::task::spawn_blocking(move || analyzer.analyze_batch(&req.routes))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(results))
}
