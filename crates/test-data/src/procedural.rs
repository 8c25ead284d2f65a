//! Random-walk rides over Perlin terrain.

use rand::Rng;
use rand_distr::StandardNormal;
use time::{Duration, OffsetDateTime, macros::datetime};

use routes::geometry::haversine_distance;

use crate::{
    TrackPoint,
    region::{BoundingBox, Region},
    synthetic::METERS_PER_DEGREE,
    terrain::ElevationGenerator,
};

/// Riding speed as a function of grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclistPace {
    /// Speed on flat ground, m/s.
    pub base_speed_mps: f64,
}

impl Default for CyclistPace {
    fn default() -> Self {
        Self { base_speed_mps: 8.0 }
    }
}

impl CyclistPace {
    /// Multiplier on the flat speed for a grade given as a fraction (0.05 = 5%).
    ///
    /// Each percent uphill costs 25% of the flat speed down to a floor of 15%; each percent
    /// downhill adds 15% up to 2.5x.
    pub fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 25.0).max(0.15)
        } else {
            (1.0 - grade * 15.0).min(2.5)
        }
    }

    pub fn speed_at(&self, grade: f64) -> f64 {
        self.base_speed_mps * self.grade_factor(grade)
    }
}

#[derive(Debug, Clone)]
pub struct RideConfig {
    pub distance_m: f64,
    /// Where the ride starts; a random point in `bounds` when unset.
    pub start: Option<(f64, f64)>,
    pub bounds: BoundingBox,
    pub point_spacing_m: f64,
    /// Largest heading change per step, radians.
    pub max_turn_rad: f64,
    /// Standard deviation of horizontal GPS noise, meters.
    pub gps_jitter_m: f64,
    /// Standard deviation of barometric/GPS elevation noise, meters.
    pub elevation_jitter_m: f64,
    pub start_time: OffsetDateTime,
    pub pace: CyclistPace,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            distance_m: 10_000.0,
            start: None,
            bounds: Region::BOULDER,
            point_spacing_m: 20.0,
            max_turn_rad: 0.25,
            gps_jitter_m: 2.0,
            elevation_jitter_m: 1.5,
            start_time: datetime!(2025-06-01 07:30:00 UTC),
            pace: CyclistPace::default(),
        }
    }
}

/// Generates rides as a wandering path inside a bounding box.
///
/// Positions are a heading random walk reflected off the box edges. Elevations come from
/// the terrain surface and timestamps from the pace model, both with Gaussian noise.
#[derive(Debug, Clone)]
pub struct ProceduralGenerator {
    config: RideConfig,
    terrain: ElevationGenerator,
}

impl ProceduralGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            config: RideConfig::default(),
            terrain: ElevationGenerator::foothills(seed),
        }
    }

    pub fn with_config(mut self, config: RideConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_m = meters;
        self
    }

    pub fn with_start(mut self, lat: f64, lon: f64) -> Self {
        self.config.start = Some((lat, lon));
        self
    }

    pub fn with_terrain(mut self, terrain: ElevationGenerator) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn config(&self) -> &RideConfig {
        &self.config
    }

    pub fn generate(&self, rng: &mut impl Rng) -> Vec<TrackPoint> {
        let path = self.wander(rng);
        self.ride(&path, rng)
    }

    /// Noise-free positions, `point_spacing_m` apart, covering `distance_m`.
    pub fn wander(&self, rng: &mut impl Rng) -> Vec<(f64, f64)> {
        let config = &self.config;
        let start = config.start.unwrap_or_else(|| config.bounds.random_point(rng));
        let steps = (config.distance_m / config.point_spacing_m).ceil() as usize;

        let mut path = Vec::with_capacity(steps + 1);
        path.push(start);
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);
        let mut current = start;

        for _ in 0..steps {
            heading += rng.gen_range(-config.max_turn_rad..=config.max_turn_rad);
            let (next, reflected) = self.step(current, heading);
            heading = reflected;
            current = next;
            path.push(current);
        }
        path
    }

    /// Moves one spacing along `heading`, turning away from any box edge it would cross.
    fn step(&self, (lat, lon): (f64, f64), heading: f64) -> ((f64, f64), f64) {
        let bounds = &self.config.bounds;
        let spacing = self.config.point_spacing_m;
        let advance = |heading: f64| {
            let dlat = spacing * heading.cos() / METERS_PER_DEGREE;
            let dlon = spacing * heading.sin() / (METERS_PER_DEGREE * lat.to_radians().cos());
            (lat + dlat, lon + dlon)
        };

        let mut heading = heading;
        let (next_lat, next_lon) = advance(heading);
        if !(bounds.min_lat..=bounds.max_lat).contains(&next_lat) {
            heading = std::f64::consts::PI - heading;
        }
        if !(bounds.min_lon..=bounds.max_lon).contains(&next_lon) {
            heading = -heading;
        }
        (advance(heading), heading)
    }

    /// Attaches noisy positions, terrain elevations and pace-driven timestamps to a path.
    fn ride(&self, path: &[(f64, f64)], rng: &mut impl Rng) -> Vec<TrackPoint> {
        let config = &self.config;
        let mut clock = config.start_time;
        let mut points = Vec::with_capacity(path.len());
        let mut previous: Option<(f64, f64, f64)> = None;

        for &(lat, lon) in path {
            let ground = self.terrain.elevation_at(lat, lon);

            if let Some((prev_lat, prev_lon, prev_ground)) = previous {
                let distance_m = haversine_distance(prev_lat, prev_lon, lat, lon) * 1000.0;
                let grade = if distance_m > 0.0 {
                    (ground - prev_ground) / distance_m
                } else {
                    0.0
                };
                clock += Duration::seconds_f64((distance_m / config.pace.speed_at(grade)).max(0.1));
            }
            previous = Some((lat, lon, ground));

            let north_m = gaussian(rng, config.gps_jitter_m);
            let east_m = gaussian(rng, config.gps_jitter_m);
            let elevation = ground + gaussian(rng, config.elevation_jitter_m);
            points.push(
                TrackPoint::new(
                    lat + north_m / METERS_PER_DEGREE,
                    lon + east_m / (METERS_PER_DEGREE * lat.to_radians().cos()),
                    Some(elevation),
                )
                .with_timestamp(clock),
            );
        }
        points
    }
}

fn gaussian(rng: &mut impl Rng, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * std_dev
}
