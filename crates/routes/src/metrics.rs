use time::OffsetDateTime;

use crate::{
    geometry::haversine_distance,
    models::{ElevationDataQuality, TrackPoint},
};

/// A single-pass accumulator over track points.
pub trait TrackMetric {
    type Score;
    fn next_point(&mut self, point: &TrackPoint);
    fn finish(&mut self) -> Self::Score;
}

/// Whole-track totals that every analysis starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BasicMetrics {
    pub total_distance_km: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub max_elevation_m: Option<f64>,
    pub min_elevation_m: Option<f64>,
    pub total_duration_seconds: Option<f64>,
    pub elevation_data_quality: ElevationDataQuality,
}

pub fn basic_metrics(points: &[TrackPoint]) -> BasicMetrics {
    let mut acc = Metrics::default();
    for point in points {
        acc.next_point(point);
    }
    acc.finish()
}

#[derive(Debug, Clone, Default)]
struct Metrics {
    distance: DistanceMetric,
    duration: DurationMetric,
    elevation: ElevationMetric,
    total_points: usize,
}

impl TrackMetric for Metrics {
    type Score = BasicMetrics;

    fn next_point(&mut self, point: &TrackPoint) {
        self.distance.next_point(point);
        self.duration.next_point(point);
        self.elevation.next_point(point);
        self.total_points += 1;
    }

    fn finish(&mut self) -> BasicMetrics {
        let elevation = self.elevation.finish();
        let range = match (elevation.min, elevation.max) {
            (Some(min), Some(max)) => max - min,
            _ => 0.0,
        };

        BasicMetrics {
            total_distance_km: self.distance.finish(),
            elevation_gain_m: elevation.gain,
            elevation_loss_m: elevation.loss,
            max_elevation_m: elevation.max,
            min_elevation_m: elevation.min,
            total_duration_seconds: self.duration.finish(),
            elevation_data_quality: ElevationDataQuality {
                has_elevation_data: elevation.samples > 0,
                points_with_elevation: elevation.samples,
                total_points: self.total_points,
                elevation_data_percentage: if self.total_points > 0 {
                    elevation.samples as f64 / self.total_points as f64 * 100.0
                } else {
                    0.0
                },
                elevation_range_m: range,
                has_elevation_variation: range > 1.0,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DistanceMetric {
    total_km: f64,
    last: Option<(f64, f64)>,
}

impl TrackMetric for DistanceMetric {
    type Score = f64;

    fn next_point(&mut self, point: &TrackPoint) {
        self.total_km += self
            .last
            .map_or(0.0, |(lat, lon)| haversine_distance(lat, lon, point.lat, point.lon));
        self.last = Some((point.lat, point.lon));
    }

    fn finish(&mut self) -> f64 {
        self.total_km
    }
}

#[derive(Debug, Clone, Default)]
struct DurationMetric {
    start_time: Option<OffsetDateTime>,
    end_time: Option<OffsetDateTime>,
}

impl TrackMetric for DurationMetric {
    type Score = Option<f64>;

    fn next_point(&mut self, point: &TrackPoint) {
        if let Some(time) = point.timestamp {
            if self.start_time.is_none() {
                self.start_time = Some(time);
            } else {
                self.end_time = Some(time);
            }
        }
    }

    fn finish(&mut self) -> Option<f64> {
        let (start, end) = (self.start_time?, self.end_time?);
        Some((end - start).as_seconds_f64())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ElevationSummary {
    gain: f64,
    loss: f64,
    min: Option<f64>,
    max: Option<f64>,
    samples: usize,
}

/// Gain and loss between successive elevation samples; points without one are skipped.
#[derive(Debug, Clone, Default)]
struct ElevationMetric {
    summary: ElevationSummary,
    last_elevation: Option<f64>,
}

impl TrackMetric for ElevationMetric {
    type Score = ElevationSummary;

    fn next_point(&mut self, point: &TrackPoint) {
        let Some(elevation) = point.elevation else {
            return;
        };

        let s = &mut self.summary;
        if let Some(last) = self.last_elevation {
            let diff = elevation - last;
            if diff > 0.0 {
                s.gain += diff;
            } else {
                s.loss -= diff;
            }
        }
        s.min = Some(s.min.map_or(elevation, |m| m.min(elevation)));
        s.max = Some(s.max.map_or(elevation, |m| m.max(elevation)));
        s.samples += 1;
        self.last_elevation = Some(elevation);
    }

    fn finish(&mut self) -> ElevationSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_empty_track() {
        let m = basic_metrics(&[]);
        assert_eq!(m.total_distance_km, 0.0);
        assert_eq!(m.total_duration_seconds, None);
        assert_eq!(m.max_elevation_m, None);
        assert_eq!(m.elevation_data_quality, ElevationDataQuality::default());
    }

    #[test]
    fn test_distance_and_elevation() {
        let points = vec![
            TrackPoint::new(40.0, -105.0, Some(1600.0)),
            TrackPoint::new(40.01, -105.0, Some(1650.0)),
            TrackPoint::new(40.02, -105.0, Some(1620.0)),
            TrackPoint::new(40.03, -105.0, Some(1700.0)),
        ];
        let m = basic_metrics(&points);

        let expected_km = haversine_distance(40.0, -105.0, 40.03, -105.0);
        assert!((m.total_distance_km - expected_km).abs() < 1e-9);
        assert!((m.elevation_gain_m - 130.0).abs() < 1e-9);
        assert!((m.elevation_loss_m - 30.0).abs() < 1e-9);
        assert_eq!(m.max_elevation_m, Some(1700.0));
        assert_eq!(m.min_elevation_m, Some(1600.0));

        let q = m.elevation_data_quality;
        assert!(q.has_elevation_data);
        assert_eq!(q.points_with_elevation, 4);
        assert_eq!(q.elevation_data_percentage, 100.0);
        assert_eq!(q.elevation_range_m, 100.0);
        assert!(q.has_elevation_variation);
    }

    #[test]
    fn test_gaps_are_skipped() {
        let points = vec![
            TrackPoint::new(40.0, -105.0, Some(100.0)),
            TrackPoint::new(40.001, -105.0, None),
            TrackPoint::new(40.002, -105.0, Some(150.0)),
            TrackPoint::new(40.003, -105.0, Some(160.0)),
        ];
        let m = basic_metrics(&points);
        assert!((m.elevation_gain_m - 60.0).abs() < 1e-9);
        assert_eq!(m.elevation_loss_m, 0.0);
        assert_eq!(m.elevation_data_quality.points_with_elevation, 3);
        assert_eq!(m.elevation_data_quality.elevation_data_percentage, 75.0);
    }

    #[test]
    fn test_flat_track_has_no_variation() {
        let points = vec![
            TrackPoint::new(40.0, -105.0, Some(100.0)),
            TrackPoint::new(40.001, -105.0, Some(100.5)),
        ];
        let q = basic_metrics(&points).elevation_data_quality;
        assert!(q.has_elevation_data);
        assert!(!q.has_elevation_variation);
    }

    #[test]
    fn test_duration_needs_two_timestamps() {
        let start = datetime!(2025-06-01 08:00:00 UTC);
        let one = vec![
            TrackPoint::new(40.0, -105.0, None).with_timestamp(start),
            TrackPoint::new(40.001, -105.0, None),
        ];
        assert_eq!(basic_metrics(&one).total_duration_seconds, None);

        let two = vec![
            TrackPoint::new(40.0, -105.0, None).with_timestamp(start),
            TrackPoint::new(40.001, -105.0, None),
            TrackPoint::new(40.002, -105.0, None).with_timestamp(datetime!(2025-06-01 08:20:30 UTC)),
        ];
        assert_eq!(basic_metrics(&two).total_duration_seconds, Some(1230.0));
    }
}
