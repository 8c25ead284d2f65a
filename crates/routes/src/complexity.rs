//! Turn statistics derived from changes in travel direction.

use crate::{geometry::bearing, models::ComplexityAnalysis, models::TrackPoint};

/// Direction change (degrees) above which a turn counts as significant.
pub const SIGNIFICANT_TURN_DEG: f64 = 45.0;
/// Direction change (degrees) above which a turn counts as moderate.
pub const MODERATE_TURN_DEG: f64 = 15.0;

/// Absolute change between two bearings, folded into `[0, 180]`.
pub fn direction_change(from: f64, to: f64) -> f64 {
    let change = (to - from).abs();
    if change > 180.0 { 360.0 - change } else { change }
}

pub fn analyze_route_complexity(points: &[TrackPoint]) -> ComplexityAnalysis {
    if points.len() < 3 {
        return ComplexityAnalysis::default();
    }

    let bearings: Vec<f64> = points
        .windows(2)
        .map(|pair| bearing(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
        .collect();
    let changes: Vec<f64> = bearings
        .windows(2)
        .map(|pair| direction_change(pair[0], pair[1]))
        .collect();

    let total: f64 = changes.iter().sum();
    let mean = total / changes.len() as f64;

    ComplexityAnalysis {
        average_direction_change_deg: mean,
        max_direction_change_deg: changes.iter().copied().fold(0.0, f64::max),
        total_direction_change_deg: total,
        significant_turns_count: changes.iter().filter(|c| **c > SIGNIFICANT_TURN_DEG).count(),
        moderate_turns_count: changes
            .iter()
            .filter(|c| **c > MODERATE_TURN_DEG && **c <= SIGNIFICANT_TURN_DEG)
            .count(),
        route_straightness_index: 1.0 / (1.0 + mean / 180.0),
        complexity_score: total / points.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag(amplitude_deg: f64) -> Vec<TrackPoint> {
        (0..20)
            .map(|i| {
                let offset = if i % 2 == 0 { 0.0 } else { amplitude_deg };
                TrackPoint::new(45.0 + i as f64 * 0.001, 7.0 + offset, None)
            })
            .collect()
    }

    #[test]
    fn test_direction_change_wraps() {
        assert_eq!(direction_change(350.0, 10.0), 20.0);
        assert_eq!(direction_change(10.0, 350.0), 20.0);
        assert_eq!(direction_change(90.0, 270.0), 180.0);
        assert_eq!(direction_change(0.0, 45.0), 45.0);
    }

    #[test]
    fn test_straight_route_has_zero_complexity() {
        let points = zigzag(0.0);
        let analysis = analyze_route_complexity(&points);
        assert!(analysis.complexity_score.abs() < 1e-9);
        assert!(analysis.total_direction_change_deg.abs() < 1e-9);
        assert!((analysis.route_straightness_index - 1.0).abs() < 1e-9);
        assert_eq!(analysis.significant_turns_count, 0);
        assert_eq!(analysis.moderate_turns_count, 0);
    }

    #[test]
    fn test_complexity_grows_with_zigzag_amplitude() {
        let scores: Vec<f64> = [0.0, 0.0002, 0.0005, 0.001, 0.002]
            .iter()
            .map(|a| analyze_route_complexity(&zigzag(*a)).complexity_score)
            .collect();
        for pair in scores.windows(2) {
            assert!(pair[1] > pair[0], "scores not increasing: {scores:?}");
        }
    }

    #[test]
    fn test_turn_classification() {
        // North, then east (90° turn), then north-east-ish (~45° turn is moderate at most)
        let points = vec![
            TrackPoint::new(0.0, 0.0, None),
            TrackPoint::new(0.001, 0.0, None),
            TrackPoint::new(0.001, 0.001, None),
            TrackPoint::new(0.0011, 0.0012, None),
        ];
        let analysis = analyze_route_complexity(&points);
        assert_eq!(analysis.significant_turns_count, 1);
        assert_eq!(analysis.moderate_turns_count, 1);
        assert!((analysis.max_direction_change_deg - 90.0).abs() < 0.01);
        assert!(analysis.route_straightness_index > 0.0);
        assert!(analysis.route_straightness_index < 1.0);
    }

    #[test]
    fn test_too_few_points() {
        let points = vec![TrackPoint::new(0.0, 0.0, None), TrackPoint::new(1.0, 0.0, None)];
        assert_eq!(analyze_route_complexity(&points), ComplexityAnalysis::default());
        assert_eq!(analyze_route_complexity(&[]), ComplexityAnalysis::default());
    }
}
