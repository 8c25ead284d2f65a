//! Assembles every analysis stage into one [`RouteStatistics`].

use std::collections::BTreeMap;

use crate::{
    complexity::analyze_route_complexity,
    gradient::{ClimbThresholds, analyze_gradients_and_climbs},
    metrics::basic_metrics,
    models::{
        Bounds, ComplexityAnalysis, DifficultyRating, GradientAnalysis, RouteStatistics,
        TrackPoint, TrafficAnalysis,
    },
    power::{PowerModel, estimate_power_requirements},
    terrain::classify_terrain,
};

/// Runs the pure analysis pipeline over `points`.
///
/// `traffic` is the already computed traffic section, if any; it is dropped for tracks too short
/// to analyze.
pub fn calculate_route_statistics(
    points: &[TrackPoint],
    traffic: Option<TrafficAnalysis>,
) -> RouteStatistics {
    let basic = basic_metrics(points);
    let bounds = Bounds::from_points(points);

    let mut stats = RouteStatistics {
        total_distance_km: basic.total_distance_km,
        total_elevation_gain_m: basic.elevation_gain_m,
        total_elevation_loss_m: basic.elevation_loss_m,
        max_elevation_m: basic.max_elevation_m,
        min_elevation_m: basic.min_elevation_m,
        total_points: points.len(),
        total_duration_seconds: basic.total_duration_seconds,
        bounds,
        elevation_data_quality: basic.elevation_data_quality,
        ..Default::default()
    };

    if points.len() < 2 {
        tracing::debug!("Skipping detailed analysis for a {}-point track", points.len());
        return stats;
    }

    let (gradients, climbs) = analyze_gradients_and_climbs(points, &ClimbThresholds::default());
    let complexity = analyze_route_complexity(points);
    let terrain = classify_terrain(&gradients);
    let power = estimate_power_requirements(
        &PowerModel::STANDARD,
        &gradients.segments,
        stats.total_distance_km,
    );

    let mut features = ml_features(&stats, &gradients, &complexity);
    if let Some(traffic) = traffic.as_ref().filter(|t| t.analysis_available) {
        features.insert("stop_density_per_km".into(), traffic.stop_density_per_km);
        features.insert(
            "estimated_stop_time_penalty_min".into(),
            traffic.estimated_time_penalty_minutes,
        );
        features.insert(
            "traffic_complexity_factor".into(),
            traffic.stop_density_per_km * 0.1 + traffic.traffic_lights_detected as f64 * 0.02,
        );
    }

    stats.average_gradient = gradients.average_gradient_percent;
    stats.max_gradient = gradients.max_gradient_percent;
    stats.route_complexity_score = complexity.complexity_score;
    stats.difficulty_rating = difficulty_rating(
        stats.total_distance_km,
        stats.total_elevation_gain_m,
        gradients.steep_climbs_percent,
    );
    if let Some(traffic) = &traffic {
        stats.traffic_points = traffic.traffic_lights_detected;
        stats.intersections = traffic.major_road_crossings;
    }

    tracing::info!(
        "Analyzed route: {:.2} km, {:.0} m gain, {} climbs, {}",
        stats.total_distance_km,
        stats.total_elevation_gain_m,
        climbs.climb_count,
        stats.difficulty_rating.as_str()
    );

    stats.gradient_analysis = gradients;
    stats.climb_analysis = climbs;
    stats.complexity_analysis = complexity;
    stats.terrain_analysis = terrain;
    stats.power_analysis = power;
    stats.ml_features = features;
    stats.traffic_analysis = traffic;
    stats
}

fn ml_features(
    stats: &RouteStatistics,
    gradients: &GradientAnalysis,
    complexity: &ComplexityAnalysis,
) -> BTreeMap<String, f64> {
    let distance = stats.total_distance_km.max(0.1);
    let diagonal = stats.bounds.map_or(0.0, |b| b.diagonal_km()).max(0.1);

    BTreeMap::from([
        (
            "route_density_points_per_km".to_string(),
            stats.total_points as f64 / distance,
        ),
        (
            "elevation_range_m".to_string(),
            stats.elevation_data_quality.elevation_range_m,
        ),
        (
            "elevation_variation_index".to_string(),
            stats.total_elevation_gain_m / distance,
        ),
        (
            "route_compactness".to_string(),
            stats.total_distance_km / diagonal,
        ),
        (
            "difficulty_index".to_string(),
            (gradients.steep_climbs_percent * 3.0
                + gradients.moderate_climbs_percent * 1.5
                + complexity.complexity_score * 0.5)
                / 100.0,
        ),
    ])
}

/// Coarse rating from distance, climbing per km and the share of steep segments.
pub fn difficulty_rating(
    distance_km: f64,
    elevation_gain_m: f64,
    steep_percent: f64,
) -> DifficultyRating {
    let mut score = 0;

    score += match distance_km {
        d if d > 100.0 => 3,
        d if d > 50.0 => 2,
        d if d > 20.0 => 1,
        _ => 0,
    };

    score += match elevation_gain_m / distance_km.max(1.0) {
        e if e > 50.0 => 3,
        e if e > 25.0 => 2,
        e if e > 10.0 => 1,
        _ => 0,
    };

    score += match steep_percent {
        s if s > 15.0 => 2,
        s if s > 5.0 => 1,
        _ => 0,
    };

    match score {
        6.. => DifficultyRating::VeryHard,
        4..=5 => DifficultyRating::Hard,
        2..=3 => DifficultyRating::Moderate,
        _ => DifficultyRating::Easy,
    }
}
