//! Track generation for exercising the route analysis pipeline.
//!
//! Two kinds of tracks are available:
//!
//! - [`synthetic`]: exact geometric shapes (straight lines, zig-zags, gradient profiles,
//!   rectangles) whose statistics can be worked out by hand
//! - [`procedural`]: random-walk rides over Perlin-noise terrain with GPS noise, for
//!   properties that should hold on any realistic input
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let ride = ProceduralGenerator::new(7).with_distance(20_000.0).generate(&mut rng);
//! std::fs::write("ride.gpx", generate_gpx(&ride, "Morning Ride"))?;
//! ```

pub mod gpx;
pub mod procedural;
pub mod region;
pub mod synthetic;
pub mod terrain;

pub use routes::models::TrackPoint;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::TrackPoint;
    pub use crate::gpx::generate_gpx;
    pub use crate::procedural::{CyclistPace, ProceduralGenerator, RideConfig};
    pub use crate::region::{BoundingBox, Region};
    pub use crate::synthetic::{gradient_profile, rectangle_loop, straight_line, zigzag};
    pub use crate::terrain::ElevationGenerator;
    pub use rand::{SeedableRng, rngs::StdRng};
}
