//! HTTP surface tests, driving the router directly without a listener.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use routes::{analyzer::RouteAnalyzer, config::AnalysisConfig, create_router};
use serde_json::{Value, json};
use tower::ServiceExt;

const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="api-test" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata><name>Flagstaff Climb</name></metadata>
  <trk>
    <trkseg>
      <trkpt lat="40.000" lon="-105.30"><ele>1700</ele></trkpt>
      <trkpt lat="40.001" lon="-105.30"><ele>1708</ele></trkpt>
      <trkpt lat="40.002" lon="-105.30"><ele>1716</ele></trkpt>
      <trkpt lat="40.003" lon="-105.30"><ele>1724</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

fn app() -> Router {
    let analyzer = RouteAnalyzer::with_client(AnalysisConfig::default(), None).unwrap();
    create_router(Arc::new(analyzer))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_check_and_headers() {
    let response = app()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "trace-me");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
}

#[tokio::test]
async fn analyze_json_points() {
    let request = json_request(
        "/routes/analyze",
        json!({
            "points": [
                {"lat": 40.0, "lon": -105.0, "elevation": 1600.0},
                {"lat": 40.01, "lon": -105.0, "elevation": 1650.0},
                {"lat": 40.02, "lon": -105.0, "elevation": null, "time": "2025-06-01T08:00:00Z"}
            ]
        }),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await;
    assert_eq!(stats["total_points"], 3);
    assert_eq!(stats["total_elevation_gain_m"], 50.0);
    assert_eq!(stats["traffic_analysis"]["analysis_available"], false);
    assert_eq!(
        stats["traffic_analysis"]["reason"],
        "Traffic analysis disabled for performance"
    );
    assert!(stats["total_duration_seconds"].is_null());
}

#[tokio::test]
async fn analyze_rejects_out_of_range_points() {
    let request = json_request(
        "/routes/analyze",
        json!({"points": [{"lat": 95.0, "lon": 0.0}]}),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn analyze_gpx_upload() {
    let request = Request::post("/routes/analyze/gpx?include_traffic=false")
        .header(header::CONTENT_TYPE, "application/gpx+xml")
        .body(Body::from(GPX))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "Flagstaff Climb");
    assert_eq!(body["statistics"]["total_points"], 4);
    assert_eq!(body["statistics"]["climb_analysis"]["climb_count"], 1);
}

#[tokio::test]
async fn analyze_gpx_rejects_garbage() {
    let request = Request::post("/routes/analyze/gpx")
        .body(Body::from("definitely not xml"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_batch_of_routes() {
    let request = json_request(
        "/routes/analyze/batch",
        json!({
            "routes": [
                [{"lat": 40.0, "lon": -105.0}, {"lat": 40.01, "lon": -105.0}],
                [],
                [{"lat": 41.0, "lon": -105.0, "elevation": 10.0}]
            ]
        }),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let results = body_json(response).await;
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["total_points"], 2);
    assert_eq!(results[1]["total_points"], 0);
    assert!(results[1]["traffic_analysis"].is_null());
    assert_eq!(results[2]["max_elevation_m"], 10.0);
}

#[tokio::test]
async fn analyze_batch_rejects_oversized_requests() {
    let routes: Vec<Value> = (0..101).map(|_| json!([])).collect();
    let request = json_request("/routes/analyze/batch", json!({ "routes": routes }));
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body_json(response).await["error"],
        "Batch of 101 routes exceeds the limit of 100"
    );
}
