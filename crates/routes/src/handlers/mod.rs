//! HTTP request handlers for the route analysis API.

pub mod analysis;
pub mod health;

pub use analysis::{
    AnalyzeBatchRequest, AnalyzeGpxQuery, AnalyzeGpxResponse, AnalyzeRouteRequest, analyze_batch,
    analyze_gpx, analyze_route,
};
pub use health::health_check;
