//! OpenStreetMap Overpass API client for fetching traffic infrastructure.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::{Infrastructure, InfrastructureFeature, RoadChain, TrafficLight};
use crate::{
    config::OverpassConfig,
    models::Bounds,
    retry::{Cancellation, RequestPacer, RetryError, RetryPolicy, retry},
};

#[derive(Debug, Error)]
pub enum OsmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Overpass returned HTTP {0}")]
    Status(u16),
    #[error("Rate limited, try again later")]
    RateLimited,
}

/// Sends a raw Overpass QL query and returns the response body.
#[async_trait]
pub trait OverpassTransport: Send + Sync {
    async fn post_query(&self, query: &str) -> Result<String, OsmError>;
}

/// Transport backed by a real HTTP endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OsmError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl OverpassTransport for HttpTransport {
    async fn post_query(&self, query: &str) -> Result<String, OsmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(query.to_string())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OsmError::RateLimited);
        }
        if !status.is_success() {
            return Err(OsmError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Response from Overpass API.
#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum OverpassElement {
    #[serde(rename = "node")]
    Node {
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(rename = "way")]
    Way {
        id: i64,
        #[serde(default)]
        geometry: Vec<GeometryPoint>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct GeometryPoint {
    lat: f64,
    lon: f64,
}

/// Paced, retrying client for infrastructure lookups.
pub struct OverpassClient {
    transport: Arc<dyn OverpassTransport>,
    pacer: RequestPacer,
    policy: RetryPolicy,
}

impl OverpassClient {
    /// Creates a client talking HTTP to the configured endpoint.
    pub fn new(config: &OverpassConfig) -> Result<Self, OsmError> {
        let transport = HttpTransport::new(&config.endpoint, config.request_timeout)?;
        Ok(Self::with_transport(
            Arc::new(transport),
            config.request_delay,
            config.retry,
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn OverpassTransport>,
        request_delay: Duration,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            pacer: RequestPacer::new(request_delay),
            policy,
        }
    }

    /// Fetches traffic signals and major roads inside `window`.
    pub async fn fetch_infrastructure(
        &self,
        window: &Bounds,
        cancel: &Cancellation,
    ) -> Result<Infrastructure, RetryError<OsmError>> {
        let lights = self.execute_query(&traffic_light_query(window), cancel).await?;
        let roads = self.execute_query(&major_roads_query(window), cancel).await?;

        let infrastructure: Infrastructure = lights.into_iter().chain(roads).collect();
        tracing::debug!(
            "Fetched {} traffic lights and {} major roads",
            infrastructure.traffic_lights.len(),
            infrastructure.major_roads.len()
        );
        Ok(infrastructure)
    }

    /// Executes an Overpass query and parses the results.
    async fn execute_query(
        &self,
        query: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<InfrastructureFeature>, RetryError<OsmError>> {
        retry(&self.policy, cancel, |_| async move {
            self.pacer.wait().await;
            let body = self.transport.post_query(query).await?;
            parse_response(&body)
        })
        .await
    }
}

/// Query for signal nodes inside `b`.
pub fn traffic_light_query(b: &Bounds) -> String {
    format!(
        r#"[out:json][timeout:25];
(
  node["highway"="traffic_signals"]({s},{w},{n},{e});
  node["traffic_signals"]({s},{w},{n},{e});
);
out geom;"#,
        s = b.south,
        w = b.west,
        n = b.north,
        e = b.east,
    )
}

/// Query for major-road ways with their geometry inside `b`.
pub fn major_roads_query(b: &Bounds) -> String {
    format!(
        r#"[out:json][timeout:25];
(
  way["highway"~"^(motorway|trunk|primary|secondary)$"]({s},{w},{n},{e});
);
out geom;"#,
        s = b.south,
        w = b.west,
        n = b.north,
        e = b.east,
    )
}

/// Parses an Overpass JSON body into infrastructure features.
///
/// Ways without geometry and element types other than nodes and ways are skipped.
pub fn parse_response(body: &str) -> Result<Vec<InfrastructureFeature>, OsmError> {
    let response: OverpassResponse = serde_json::from_str(body)?;

    let features = response
        .elements
        .into_iter()
        .filter_map(|element| match element {
            OverpassElement::Node { lat, lon, tags } => {
                Some(InfrastructureFeature::TrafficLight(TrafficLight { lat, lon, tags }))
            }
            OverpassElement::Way { id, geometry, tags } if !geometry.is_empty() => {
                Some(InfrastructureFeature::RoadSegmentChain(RoadChain {
                    id,
                    highway_type: tags
                        .get("highway")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    name: tags
                        .get("name")
                        .cloned()
                        .unwrap_or_else(|| "Unnamed Road".to_string()),
                    polyline: geometry.into_iter().map(|p| (p.lat, p.lon)).collect(),
                }))
            }
            _ => None,
        })
        .collect();

    Ok(features)
}
