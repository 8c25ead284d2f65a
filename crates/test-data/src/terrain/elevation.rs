//! Perlin noise elevation fields.

use noise::{NoiseFn, Perlin};

/// Deterministic elevation surface built from fractal Perlin noise.
///
/// The same seed and coordinates always give the same height, so a ride
/// that crosses its own path sees consistent terrain.
#[derive(Debug, Clone)]
pub struct ElevationGenerator {
    perlin: Perlin,
    base_elevation: f64,
    height_scale: f64,
    /// Cycles per degree for the first octave.
    frequency: f64,
    octaves: u32,
}

impl ElevationGenerator {
    /// Foothill terrain around 1650 m with ±400 m of relief.
    pub fn foothills(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 1650.0,
            height_scale: 400.0,
            frequency: 12.0,
            octaves: 4,
        }
    }

    /// Low rolling terrain with ±30 m of relief.
    pub fn lowland(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 80.0,
            height_scale: 30.0,
            frequency: 20.0,
            octaves: 2,
        }
    }

    pub fn with_height_scale(mut self, scale: f64) -> Self {
        self.height_scale = scale;
        self
    }

    pub fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    pub fn height_scale(&self) -> f64 {
        self.height_scale
    }

    /// Height in meters at a coordinate, summing octaves of halving amplitude.
    pub fn elevation_at(&self, lat: f64, lon: f64) -> f64 {
        let (total, max_amplitude, _, _) = (0..self.octaves).fold(
            (0.0, 0.0, 1.0, self.frequency),
            |(total, max, amplitude, frequency), _| {
                let sample = self.perlin.get([lat * frequency, lon * frequency]);
                (total + sample * amplitude, max + amplitude, amplitude * 0.5, frequency * 2.0)
            },
        );

        if max_amplitude == 0.0 {
            return self.base_elevation;
        }
        self.base_elevation + (total / max_amplitude) * self.height_scale
    }
}
