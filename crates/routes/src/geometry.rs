//! Great-circle geometry primitives shared by every analysis stage.
//!
//! Everything here is a pure function of its arguments. Callers that evaluate the same inputs
//! repeatedly cache at the orchestration layer (see [`crate::cache`]), never in here.

/// A `(lat, lon)` pair in decimal degrees.
pub type LatLon = (f64, f64);

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();

    let a =
        (d_lat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Initial bearing from the first coordinate to the second, in degrees `[0, 360)`.
///
/// Coincident points yield 0.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let y = d_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * d_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Gradient in percent for a horizontal distance and an elevation change, both in meters.
pub fn gradient(distance_m: f64, elevation_change_m: f64) -> f64 {
    if distance_m == 0.0 {
        return 0.0;
    }
    elevation_change_m / distance_m * 100.0
}

/// Shortest distance in kilometers from `point` to the segment `start..end`.
///
/// The projection is done in raw lat/lon space, which is accurate enough for the few-meter
/// proximity checks this is used for; the final distance is a great-circle one.
pub fn point_to_segment_distance(point: LatLon, start: LatLon, end: LatLon) -> f64 {
    let (px, py) = point;
    let (x1, y1) = start;
    let (x2, y2) = end;

    let dx = x2 - x1;
    let dy = y2 - y1;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return haversine_distance(px, py, x1, y1);
    }

    let t = (((px - x1) * dx + (py - y1) * dy) / len_sq).clamp(0.0, 1.0);
    haversine_distance(px, py, x1 + t * dx, y1 + t * dy)
}
