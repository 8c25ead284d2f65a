//! Traffic-stop estimation from OpenStreetMap infrastructure.
//!
//! - [`overpass`]: fetches traffic signals and major roads around the route
//! - [`matcher`]: matches them against the route and turns hits into stop estimates

pub mod matcher;
pub mod overpass;

use std::collections::BTreeMap;

use crate::geometry::LatLon;

pub use matcher::{Intersections, analyze_traffic_stops, find_route_intersections, remove_duplicate_stops};
pub use overpass::{HttpTransport, OsmError, OverpassClient, OverpassTransport};

/// Road classes whose crossings usually force a stop.
pub const MAJOR_HIGHWAY_TYPES: [&str; 4] = ["motorway", "trunk", "primary", "secondary"];

/// Calibration inputs for stop detection. Defaults are empirical values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficConfig {
    /// Margin added to every side of the route bounds for the map query, in degrees.
    pub bounds_margin_deg: f64,
    /// Only every n-th route point is matched against infrastructure.
    pub sample_stride: usize,
    pub traffic_light_match_m: f64,
    pub road_crossing_match_m: f64,
    pub traffic_light_dedup_m: f64,
    pub road_crossing_dedup_m: f64,
    pub traffic_light_penalty_min: f64,
    pub road_crossing_penalty_min: f64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            bounds_margin_deg: 0.002,
            sample_stride: 3,
            traffic_light_match_m: 20.0,
            road_crossing_match_m: 12.0,
            traffic_light_dedup_m: 50.0,
            road_crossing_dedup_m: 25.0,
            traffic_light_penalty_min: 0.33,
            road_crossing_penalty_min: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLight {
    pub lat: f64,
    pub lon: f64,
    pub tags: BTreeMap<String, String>,
}

/// A way from the map service with its full vertex geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadChain {
    pub id: i64,
    pub highway_type: String,
    pub name: String,
    pub polyline: Vec<LatLon>,
}

impl RoadChain {
    pub fn is_major(&self) -> bool {
        MAJOR_HIGHWAY_TYPES.contains(&self.highway_type.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfrastructureFeature {
    TrafficLight(TrafficLight),
    RoadSegmentChain(RoadChain),
}

/// Infrastructure found inside one query window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Infrastructure {
    pub traffic_lights: Vec<TrafficLight>,
    pub major_roads: Vec<RoadChain>,
}

impl FromIterator<InfrastructureFeature> for Infrastructure {
    fn from_iter<I: IntoIterator<Item = InfrastructureFeature>>(iter: I) -> Self {
        let mut infrastructure = Infrastructure::default();
        for feature in iter {
            match feature {
                InfrastructureFeature::TrafficLight(light) => {
                    infrastructure.traffic_lights.push(light)
                }
                InfrastructureFeature::RoadSegmentChain(road) => {
                    infrastructure.major_roads.push(road)
                }
            }
        }
        infrastructure
    }
}
