//! Terrain for procedural rides.

mod elevation;

pub use elevation::ElevationGenerator;
