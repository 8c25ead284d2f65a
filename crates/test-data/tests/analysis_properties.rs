//! Properties of the analysis pipeline on generated tracks.

use bytes::Bytes;
use routes::{
    gpx_processor::GpxProcessor, models::TerrainType, statistics::calculate_route_statistics,
};
use test_data::prelude::*;

#[test]
fn straight_line_has_no_turns_or_climbing() {
    let stats = calculate_route_statistics(&straight_line(30, 50.0), None);

    assert!((stats.total_distance_km - 1.45).abs() < 1e-9);
    assert_eq!(stats.complexity_analysis.total_direction_change_deg, 0.0);
    assert_eq!(stats.complexity_analysis.route_straightness_index, 1.0);
    assert_eq!(stats.route_complexity_score, 0.0);
    assert_eq!(stats.total_elevation_gain_m, 0.0);
    assert_eq!(stats.climb_analysis.climb_count, 0);
    assert_eq!(stats.terrain_analysis.terrain_type, TerrainType::Flat);
}

#[test]
fn complexity_grows_with_zigzag_amplitude() {
    let scores: Vec<f64> = [0.0, 10.0, 25.0, 50.0, 100.0]
        .iter()
        .map(|amplitude| {
            calculate_route_statistics(&zigzag(40, 100.0, *amplitude), None).route_complexity_score
        })
        .collect();

    assert_eq!(scores[0], 0.0);
    for pair in scores.windows(2) {
        assert!(pair[1] > pair[0], "scores not increasing: {scores:?}");
    }
}

#[test]
fn sustained_grade_is_one_climb() {
    let stats = calculate_route_statistics(&gradient_profile(&[0.0, 4.0, 4.0, 4.0, 0.5, 0.0], 100.0), None);

    assert_eq!(stats.climb_analysis.climb_count, 1);
    let climb = &stats.climb_analysis.climbs[0];
    assert_eq!(climb.segment_count, 3);
    assert!((climb.elevation_gain_m - 12.0).abs() < 1e-6);
    assert!((climb.distance_m - 300.0).abs() < 1e-6);
    assert!((climb.average_gradient - 4.0).abs() < 1e-6);
    assert!((stats.total_elevation_gain_m - 12.5).abs() < 1e-9);
}

#[test]
fn small_bumps_are_not_climbs() {
    let stats = calculate_route_statistics(&gradient_profile(&[0.0, 5.0, 0.0], 100.0), None);
    assert_eq!(stats.climb_analysis.climb_count, 0);
    assert!((stats.total_elevation_gain_m - 5.0).abs() < 1e-9);
}

#[test]
fn rectangle_loop_turns_three_times() {
    let stats = calculate_route_statistics(&rectangle_loop(500.0, 300.0), None);

    assert!((stats.total_distance_km - 1.6).abs() < 1e-3);
    assert_eq!(stats.complexity_analysis.significant_turns_count, 3);
    assert_eq!(stats.complexity_analysis.moderate_turns_count, 0);
    assert!((stats.complexity_analysis.max_direction_change_deg - 90.0).abs() < 0.1);
    assert!(stats.bounds.is_some());
}

#[test]
fn procedural_rides_produce_sane_statistics() {
    for seed in 1..=5u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let ride = ProceduralGenerator::new(seed as u32)
            .with_distance(8_000.0)
            .generate(&mut rng);
        let stats = calculate_route_statistics(&ride, None);

        assert_eq!(stats.total_points, ride.len());
        assert!(
            stats.total_distance_km > 7.5 && stats.total_distance_km < 10.0,
            "seed {seed}: {} km",
            stats.total_distance_km
        );
        assert_eq!(stats.elevation_data_quality.elevation_data_percentage, 100.0);
        assert!(stats.elevation_data_quality.has_elevation_variation);

        let duration = stats.total_duration_seconds.unwrap();
        assert!(duration > 0.0);
        for pair in ride.windows(2) {
            assert!(pair[1].timestamp > pair[0].timestamp);
        }

        for value in [
            stats.total_elevation_gain_m,
            stats.total_elevation_loss_m,
            stats.average_gradient,
            stats.max_gradient,
            stats.route_complexity_score,
            stats.gradient_analysis.gradient_std_dev,
            stats.complexity_analysis.route_straightness_index,
            stats.power_analysis.average_power_watts,
            stats.power_analysis.total_energy_kj,
        ] {
            assert!(value.is_finite(), "seed {seed}: {value}");
        }
        assert!(stats.ml_features.values().all(|v| v.is_finite()));
        assert!(stats.traffic_analysis.is_none());
    }
}

#[test]
fn generated_gpx_parses_back() {
    let mut rng = StdRng::seed_from_u64(99);
    let ride = ProceduralGenerator::new(99)
        .with_distance(2_000.0)
        .generate(&mut rng);

    let gpx = generate_gpx(&ride, "Sunday Loop");
    let parsed = GpxProcessor::parse(&Bytes::from(gpx)).unwrap();

    assert_eq!(parsed.name.as_deref(), Some("Sunday Loop"));
    assert_eq!(parsed.points.len(), ride.len());
    for (written, read) in ride.iter().zip(&parsed.points) {
        assert!((written.lat - read.lat).abs() < 1e-6);
        assert!((written.lon - read.lon).abs() < 1e-6);
        assert!((written.elevation.unwrap() - read.elevation.unwrap()).abs() < 0.01);
    }
    assert_eq!(parsed.points[0].timestamp, ride[0].timestamp);

    let direct = calculate_route_statistics(&ride, None);
    let via_gpx = calculate_route_statistics(&parsed.points, None);
    assert!((direct.total_distance_km - via_gpx.total_distance_km).abs() < 1e-3);
}
