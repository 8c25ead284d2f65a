use std::collections::BTreeMap;

use geo::{BoundingRect as _, MultiPoint, Point};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::geometry::haversine_distance;

/// A single recorded GPS sample. Order within a track is the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default, alias = "time", with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64, elevation: Option<f64>) -> Self {
        Self {
            lat,
            lon,
            elevation,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Lat/lon bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    /// Bounding box of `points`, or `None` for an empty slice.
    pub fn from_points(points: &[TrackPoint]) -> Option<Self> {
        let multi: MultiPoint<f64> = points.iter().map(|p| Point::new(p.lon, p.lat)).collect();
        multi.bounding_rect().map(|rect| Self {
            north: rect.max().y,
            south: rect.min().y,
            east: rect.max().x,
            west: rect.min().x,
        })
    }

    /// Grows the box by `margin_deg` on every side.
    pub fn expand(&self, margin_deg: f64) -> Self {
        Self {
            north: self.north + margin_deg,
            south: self.south - margin_deg,
            east: self.east + margin_deg,
            west: self.west - margin_deg,
        }
    }

    /// Great-circle length of the north-west to south-east diagonal, in km.
    pub fn diagonal_km(&self) -> f64 {
        haversine_distance(self.north, self.west, self.south, self.east)
    }
}

/// Distance, elevation change and gradient between two consecutive points with elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub distance_m: f64,
    pub elevation_change_m: f64,
    pub gradient_percent: f64,
}

/// A sustained climb detected along the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Climb {
    pub start_elevation: f64,
    pub end_elevation: f64,
    pub distance_m: f64,
    pub elevation_gain_m: f64,
    pub max_gradient: f64,
    pub average_gradient: f64,
    pub difficulty_score: f64,
    pub segment_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientAnalysis {
    pub average_gradient_percent: f64,
    pub max_gradient_percent: f64,
    pub min_gradient_percent: f64,
    pub gradient_std_dev: f64,
    pub steep_climbs_percent: f64,
    pub moderate_climbs_percent: f64,
    pub flat_sections_percent: f64,
    pub descents_percent: f64,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimbAnalysis {
    pub climb_count: usize,
    pub total_climb_distance_km: f64,
    pub total_climb_elevation_m: f64,
    pub average_climb_length_m: f64,
    pub average_climb_gradient: f64,
    pub max_climb_gradient: f64,
    pub climb_difficulty_score: f64,
    pub climbs: Vec<Climb>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    pub average_direction_change_deg: f64,
    pub max_direction_change_deg: f64,
    pub total_direction_change_deg: f64,
    pub significant_turns_count: usize,
    pub moderate_turns_count: usize,
    /// In `(0, 1]`; 1 is perfectly straight.
    pub route_straightness_index: f64,
    pub complexity_score: f64,
}

impl Default for ComplexityAnalysis {
    fn default() -> Self {
        Self {
            average_direction_change_deg: 0.0,
            max_direction_change_deg: 0.0,
            total_direction_change_deg: 0.0,
            significant_turns_count: 0,
            moderate_turns_count: 0,
            route_straightness_index: 1.0,
            complexity_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    #[default]
    Flat,
    Rolling,
    Hilly,
    Mountainous,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainDistribution {
    pub flat_percent: f64,
    pub moderate_climbs_percent: f64,
    pub steep_climbs_percent: f64,
    pub descents_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainAnalysis {
    pub terrain_type: TerrainType,
    pub terrain_distribution: TerrainDistribution,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerZones {
    pub endurance_percent: f64,
    pub tempo_percent: f64,
    pub threshold_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerAnalysis {
    pub average_power_watts: f64,
    pub max_power_watts: f64,
    pub normalized_power_watts: f64,
    pub total_energy_kj: f64,
    pub energy_per_km_kj: f64,
    pub power_zones: PowerZones,
}

/// Which kind of infrastructure a stop candidate was matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureRef {
    TrafficLight {
        light_lat: f64,
        light_lon: f64,
        tags: BTreeMap<String, String>,
    },
    RoadCrossing {
        road_name: String,
        highway_type: String,
    },
}

/// A raw proximity hit between a sampled route point and an infrastructure feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopCandidate {
    pub route_point_index: usize,
    pub route_lat: f64,
    pub route_lon: f64,
    pub distance_to_feature_m: f64,
    pub feature_ref: FeatureRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureSummary {
    pub total_traffic_lights_in_area: usize,
    pub total_major_roads_in_area: usize,
    pub route_intersections_found: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficAnalysis {
    pub analysis_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub traffic_lights_detected: usize,
    pub major_road_crossings: usize,
    pub total_potential_stops: usize,
    pub stop_density_per_km: f64,
    pub average_distance_between_stops_km: f64,
    pub estimated_time_penalty_minutes: f64,
    pub traffic_light_locations: Vec<StopCandidate>,
    pub major_crossing_locations: Vec<StopCandidate>,
    pub infrastructure_summary: InfrastructureSummary,
}

impl TrafficAnalysis {
    /// A zeroed analysis explaining why no stops could be estimated.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            analysis_available: false,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElevationDataQuality {
    pub has_elevation_data: bool,
    pub points_with_elevation: usize,
    pub total_points: usize,
    pub elevation_data_percentage: f64,
    pub elevation_range_m: f64,
    pub has_elevation_variation: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyRating {
    #[default]
    Easy,
    Moderate,
    Hard,
    #[serde(rename = "Very Hard")]
    VeryHard,
}

impl DifficultyRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyRating::Easy => "Easy",
            DifficultyRating::Moderate => "Moderate",
            DifficultyRating::Hard => "Hard",
            DifficultyRating::VeryHard => "Very Hard",
        }
    }
}

/// Everything derived from one track. Produced once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteStatistics {
    pub total_distance_km: f64,
    pub total_elevation_gain_m: f64,
    pub total_elevation_loss_m: f64,
    pub max_elevation_m: Option<f64>,
    pub min_elevation_m: Option<f64>,
    pub total_points: usize,
    pub total_duration_seconds: Option<f64>,
    pub bounds: Option<Bounds>,
    pub elevation_data_quality: ElevationDataQuality,
    pub gradient_analysis: GradientAnalysis,
    pub climb_analysis: ClimbAnalysis,
    pub complexity_analysis: ComplexityAnalysis,
    pub terrain_analysis: TerrainAnalysis,
    pub power_analysis: PowerAnalysis,
    pub traffic_analysis: Option<TrafficAnalysis>,
    pub ml_features: BTreeMap<String, f64>,
    pub average_gradient: f64,
    pub max_gradient: f64,
    pub difficulty_rating: DifficultyRating,
    pub route_complexity_score: f64,
    pub traffic_points: usize,
    pub intersections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_points() {
        let points = vec![
            TrackPoint::new(40.0, -105.3, None),
            TrackPoint::new(40.2, -105.1, None),
            TrackPoint::new(39.9, -105.2, None),
        ];
        let bounds = Bounds::from_points(&points).unwrap();
        assert_eq!(bounds.north, 40.2);
        assert_eq!(bounds.south, 39.9);
        assert_eq!(bounds.east, -105.1);
        assert_eq!(bounds.west, -105.3);
    }

    #[test]
    fn test_bounds_of_empty_and_single_point() {
        assert!(Bounds::from_points(&[]).is_none());

        let single = Bounds::from_points(&[TrackPoint::new(1.0, 2.0, None)]).unwrap();
        assert!(single.north >= single.south);
        assert!(single.east >= single.west);
        assert_eq!((single.north, single.east), (1.0, 2.0));
    }

    #[test]
    fn test_bounds_expand() {
        let bounds = Bounds {
            north: 1.0,
            south: 0.0,
            east: 1.0,
            west: 0.0,
        }
        .expand(0.002);
        assert!((bounds.north - 1.002).abs() < 1e-12);
        assert!((bounds.south + 0.002).abs() < 1e-12);
        assert!((bounds.east - 1.002).abs() < 1e-12);
        assert!((bounds.west + 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_track_point_accepts_time_alias() {
        let json = r#"{"lat": 40.0, "lon": -105.0, "elevation": null, "time": "2024-05-01T08:00:00Z"}"#;
        let point: TrackPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.elevation, None);
        assert_eq!(
            point.timestamp,
            Some(time::macros::datetime!(2024-05-01 08:00:00 UTC))
        );
    }

    #[test]
    fn test_track_point_optional_fields_default() {
        let point: TrackPoint = serde_json::from_str(r#"{"lat": 1.0, "lon": 2.0}"#).unwrap();
        assert_eq!(point, TrackPoint::new(1.0, 2.0, None));
    }

    #[test]
    fn test_difficulty_rating_serializes_with_space() {
        let json = serde_json::to_string(&DifficultyRating::VeryHard).unwrap();
        assert_eq!(json, r#""Very Hard""#);
        assert_eq!(DifficultyRating::VeryHard.as_str(), "Very Hard");
    }

    #[test]
    fn test_unavailable_traffic_analysis() {
        let analysis = TrafficAnalysis::unavailable("Overpass unreachable");
        assert!(!analysis.analysis_available);
        assert_eq!(analysis.reason.as_deref(), Some("Overpass unreachable"));
        assert_eq!(analysis.total_potential_stops, 0);
    }
}
