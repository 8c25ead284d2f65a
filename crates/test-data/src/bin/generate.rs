//! Writes a procedural ride to a GPX file and logs what the analyzer makes of it.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin generate -- ride.gpx 25 42
//! ```
//!
//! Arguments are the output path, the distance in km and the seed, all optional.

use anyhow::Context;
use rand::{SeedableRng, rngs::StdRng};
use routes::statistics::calculate_route_statistics;
use test_data::{gpx::generate_gpx, procedural::ProceduralGenerator};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "ride.gpx".to_string());
    let distance_km: f64 = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("invalid distance: {arg}"))?,
        None => 20.0,
    };
    let seed: u64 = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("invalid seed: {arg}"))?,
        None => 12345,
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let ride = ProceduralGenerator::new(seed as u32)
        .with_distance(distance_km * 1000.0)
        .generate(&mut rng);

    std::fs::write(&output, generate_gpx(&ride, &format!("Procedural ride {seed}")))
        .with_context(|| format!("failed to write {output}"))?;
    tracing::info!("Wrote {} points to {}", ride.len(), output);

    let stats = calculate_route_statistics(&ride, None);
    tracing::info!("  Distance: {:.2} km", stats.total_distance_km);
    tracing::info!(
        "  Elevation: +{:.0} m / -{:.0} m",
        stats.total_elevation_gain_m,
        stats.total_elevation_loss_m
    );
    tracing::info!("  Climbs: {}", stats.climb_analysis.climb_count);
    tracing::info!("  Complexity: {:.2}", stats.route_complexity_score);
    tracing::info!("  Difficulty: {}", stats.difficulty_rating.as_str());

    Ok(())
}
