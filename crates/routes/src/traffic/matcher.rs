use super::{Infrastructure, TrafficConfig};
use crate::{
    geometry::{haversine_distance, point_to_segment_distance},
    models::{FeatureRef, InfrastructureSummary, StopCandidate, TrackPoint, TrafficAnalysis},
};

/// Raw proximity hits, before de-duplication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intersections {
    pub traffic_lights: Vec<StopCandidate>,
    pub major_road_crossings: Vec<StopCandidate>,
}

fn sampled(points: &[TrackPoint], stride: usize) -> impl Iterator<Item = (usize, &TrackPoint)> {
    points.iter().enumerate().step_by(stride.max(1))
}

/// Matches sampled route points against traffic lights and major roads.
pub fn find_route_intersections(
    points: &[TrackPoint],
    infrastructure: &Infrastructure,
    config: &TrafficConfig,
) -> Intersections {
    let mut intersections = Intersections::default();

    for (index, point) in sampled(points, config.sample_stride) {
        for light in &infrastructure.traffic_lights {
            let distance_m = haversine_distance(point.lat, point.lon, light.lat, light.lon) * 1000.0;
            if distance_m <= config.traffic_light_match_m {
                intersections.traffic_lights.push(StopCandidate {
                    route_point_index: index,
                    route_lat: point.lat,
                    route_lon: point.lon,
                    distance_to_feature_m: distance_m,
                    feature_ref: FeatureRef::TrafficLight {
                        light_lat: light.lat,
                        light_lon: light.lon,
                        tags: light.tags.clone(),
                    },
                });
            }
        }
    }

    for road in infrastructure.major_roads.iter().filter(|r| r.is_major()) {
        for (index, point) in sampled(points, config.sample_stride) {
            let hit = road.polyline.windows(2).find_map(|pair| {
                let distance_m =
                    point_to_segment_distance((point.lat, point.lon), pair[0], pair[1]) * 1000.0;
                (distance_m <= config.road_crossing_match_m).then_some(distance_m)
            });

            if let Some(distance_m) = hit {
                intersections.major_road_crossings.push(StopCandidate {
                    route_point_index: index,
                    route_lat: point.lat,
                    route_lon: point.lon,
                    distance_to_feature_m: distance_m,
                    feature_ref: FeatureRef::RoadCrossing {
                        road_name: road.name.clone(),
                        highway_type: road.highway_type.clone(),
                    },
                });
            }
        }
    }

    intersections
}

/// Greedy de-duplication in input order: a candidate is kept only when its route position is
/// more than `threshold_m` away from every candidate already kept.
pub fn remove_duplicate_stops(candidates: &[StopCandidate], threshold_m: f64) -> Vec<StopCandidate> {
    let mut unique: Vec<StopCandidate> = Vec::new();

    for candidate in candidates {
        let is_duplicate = unique.iter().any(|kept| {
            haversine_distance(
                candidate.route_lat,
                candidate.route_lon,
                kept.route_lat,
                kept.route_lon,
            ) * 1000.0
                <= threshold_m
        });
        if !is_duplicate {
            unique.push(candidate.clone());
        }
    }

    unique
}

/// Turns infrastructure near the route into stop counts, density and a time penalty.
pub fn analyze_traffic_stops(
    points: &[TrackPoint],
    infrastructure: &Infrastructure,
    total_distance_km: f64,
    config: &TrafficConfig,
) -> TrafficAnalysis {
    let intersections = find_route_intersections(points, infrastructure, config);

    let lights = remove_duplicate_stops(&intersections.traffic_lights, config.traffic_light_dedup_m);
    let crossings = remove_duplicate_stops(
        &intersections.major_road_crossings,
        config.road_crossing_dedup_m,
    );
    let unique_stops = lights.len() + crossings.len();

    tracing::debug!(
        "Traffic matching: {} raw light hits -> {} lights, {} raw road hits -> {} crossings",
        intersections.traffic_lights.len(),
        lights.len(),
        intersections.major_road_crossings.len(),
        crossings.len()
    );

    TrafficAnalysis {
        analysis_available: true,
        reason: None,
        traffic_lights_detected: lights.len(),
        major_road_crossings: crossings.len(),
        total_potential_stops: unique_stops,
        stop_density_per_km: unique_stops as f64 / total_distance_km.max(0.1),
        average_distance_between_stops_km: if unique_stops > 1 {
            total_distance_km / unique_stops as f64
        } else {
            total_distance_km
        },
        estimated_time_penalty_minutes: lights.len() as f64 * config.traffic_light_penalty_min
            + crossings.len() as f64 * config.road_crossing_penalty_min,
        infrastructure_summary: InfrastructureSummary {
            total_traffic_lights_in_area: infrastructure.traffic_lights.len(),
            total_major_roads_in_area: infrastructure.major_roads.len(),
            route_intersections_found: unique_stops,
        },
        traffic_light_locations: lights,
        major_crossing_locations: crossings,
    }
}
