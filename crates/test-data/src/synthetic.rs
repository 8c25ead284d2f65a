//! Exact geometric tracks whose statistics can be computed by hand.
//!
//! Every shape starts at [`ORIGIN`]. Distances are converted with the same sphere the
//! analysis uses, so a step of `n` meters along a meridian measures `n` meters.

use routes::geometry::EARTH_RADIUS_KM;

use crate::TrackPoint;

pub const ORIGIN: (f64, f64) = (40.0, -105.0);
pub const ORIGIN_ELEVATION_M: f64 = 1600.0;

/// Meters per degree of latitude on the analysis sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_KM * 1000.0 * std::f64::consts::PI / 180.0;

fn north(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

fn east(meters: f64, lat: f64) -> f64 {
    meters / (METERS_PER_DEGREE * lat.to_radians().cos())
}

/// `count` points heading due north, `step_m` apart, at constant elevation.
pub fn straight_line(count: usize, step_m: f64) -> Vec<TrackPoint> {
    (0..count)
        .map(|i| {
            TrackPoint::new(
                ORIGIN.0 + north(i as f64 * step_m),
                ORIGIN.1,
                Some(ORIGIN_ELEVATION_M),
            )
        })
        .collect()
}

/// A northbound line whose odd points are pushed `amplitude_m` east.
pub fn zigzag(count: usize, step_m: f64, amplitude_m: f64) -> Vec<TrackPoint> {
    (0..count)
        .map(|i| {
            let lat = ORIGIN.0 + north(i as f64 * step_m);
            let offset = if i % 2 == 1 { east(amplitude_m, lat) } else { 0.0 };
            TrackPoint::new(lat, ORIGIN.1 + offset, Some(ORIGIN_ELEVATION_M))
        })
        .collect()
}

/// A northbound track with one `step_m` segment per entry of `grades_percent`.
///
/// Returns `grades_percent.len() + 1` points; each segment climbs `grade / 100 * step_m`.
pub fn gradient_profile(grades_percent: &[f64], step_m: f64) -> Vec<TrackPoint> {
    let mut elevation = ORIGIN_ELEVATION_M;
    let mut points = vec![TrackPoint::new(ORIGIN.0, ORIGIN.1, Some(elevation))];

    for (i, grade) in grades_percent.iter().enumerate() {
        elevation += grade / 100.0 * step_m;
        points.push(TrackPoint::new(
            ORIGIN.0 + north((i + 1) as f64 * step_m),
            ORIGIN.1,
            Some(elevation),
        ));
    }
    points
}

/// A closed clockwise loop: south-west, north-west, north-east, south-east, back to start.
pub fn rectangle_loop(width_m: f64, height_m: f64) -> Vec<TrackPoint> {
    let (south, west) = ORIGIN;
    let north_lat = south + north(height_m);
    let east_lon = west + east(width_m, south);

    [
        (south, west),
        (north_lat, west),
        (north_lat, east_lon),
        (south, east_lon),
        (south, west),
    ]
    .into_iter()
    .map(|(lat, lon)| TrackPoint::new(lat, lon, Some(ORIGIN_ELEVATION_M)))
    .collect()
}
