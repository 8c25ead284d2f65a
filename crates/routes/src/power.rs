//! Physics-based power and energy estimate.
//!
//! Each segment is ridden at a fixed reference speed chosen from its gradient bucket. The
//! speeds are not a prediction of how fast anyone rides; they only make the estimate
//! deterministic and comparable across routes.

use crate::models::{PowerAnalysis, PowerZones, Segment};

/// Rider, bike and environment constants for the standard power model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    pub rider_mass_kg: f64,
    pub bike_mass_kg: f64,
    /// Drag coefficient times frontal area (m²).
    pub cda: f64,
    pub crr: f64,
    /// kg/m³
    pub air_density: f64,
    pub drivetrain_efficiency: f64,
    pub gravity: f64,
    /// Floor applied to every segment's power (W).
    pub min_power_watts: f64,
}

impl PowerModel {
    pub const STANDARD: PowerModel = PowerModel {
        rider_mass_kg: 70.0,
        bike_mass_kg: 10.0,
        cda: 0.32,
        crr: 0.005,
        air_density: 1.225,
        drivetrain_efficiency: 0.95,
        gravity: 9.81,
        min_power_watts: 100.0,
    };

    pub fn total_mass_kg(&self) -> f64 {
        self.rider_mass_kg + self.bike_mass_kg
    }

    /// Power in watts to hold `speed_kmh` on a slope of `gradient_percent`.
    pub fn power_at(&self, speed_kmh: f64, gradient_percent: f64) -> f64 {
        let v = speed_kmh / 3.6;
        let weight = self.total_mass_kg() * self.gravity;
        let grade = gradient_percent / 100.0;

        let gravity_power = weight * v * grade;
        let rolling_power = weight * self.crr * v;
        let aero_power = 0.5 * self.cda * self.air_density * v.powi(3);

        let power = (gravity_power + rolling_power + aero_power) / self.drivetrain_efficiency;
        power.max(self.min_power_watts)
    }
}

impl Default for PowerModel {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Reference speed in km/h for a gradient bucket.
pub fn reference_speed_kmh(gradient_percent: f64) -> f64 {
    if gradient_percent > 8.0 {
        15.0
    } else if gradient_percent > 4.0 {
        20.0
    } else if gradient_percent > 2.0 {
        25.0
    } else {
        30.0
    }
}

/// Power and energy for one segment at its reference speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPower {
    pub reference_speed_kmh: f64,
    pub power_watts: f64,
    pub energy_kj: f64,
}

pub fn segment_power(model: &PowerModel, segment: &Segment) -> SegmentPower {
    let speed_kmh = reference_speed_kmh(segment.gradient_percent);
    let power_watts = model.power_at(speed_kmh, segment.gradient_percent);
    let seconds = segment.distance_m / (speed_kmh / 3.6);

    SegmentPower {
        reference_speed_kmh: speed_kmh,
        power_watts,
        energy_kj: power_watts * seconds / 1000.0,
    }
}

/// Aggregates per-segment power over the route. `total_distance_km` is the full route
/// distance, including stretches without elevation.
pub fn estimate_power_requirements(
    model: &PowerModel,
    segments: &[Segment],
    total_distance_km: f64,
) -> PowerAnalysis {
    if segments.is_empty() {
        return PowerAnalysis::default();
    }

    let estimates: Vec<SegmentPower> = segments.iter().map(|s| segment_power(model, s)).collect();
    let powers: Vec<f64> = estimates.iter().map(|e| e.power_watts).collect();
    let n = powers.len() as f64;

    let total_energy_kj: f64 = estimates.iter().map(|e| e.energy_kj).sum();
    let share = |lo: f64, hi: f64| {
        powers.iter().filter(|p| **p >= lo && **p < hi).count() as f64 / n * 100.0
    };

    PowerAnalysis {
        average_power_watts: powers.iter().sum::<f64>() / n,
        max_power_watts: powers.iter().copied().fold(0.0, f64::max),
        normalized_power_watts: (powers.iter().map(|p| p.powi(4)).sum::<f64>() / n).powf(0.25),
        total_energy_kj,
        energy_per_km_kj: if total_distance_km > 0.0 {
            total_energy_kj / total_distance_km
        } else {
            0.0
        },
        power_zones: PowerZones {
            endurance_percent: share(f64::NEG_INFINITY, 200.0),
            tempo_percent: share(200.0, 300.0),
            threshold_percent: share(300.0, f64::INFINITY),
        },
    }
}
