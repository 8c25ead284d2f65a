use crate::models::{GradientAnalysis, TerrainAnalysis, TerrainDistribution, TerrainType};

/// Labels the route from its gradient distribution.
pub fn classify_terrain(gradients: &GradientAnalysis) -> TerrainAnalysis {
    let steep = gradients.steep_climbs_percent;
    let moderate = gradients.moderate_climbs_percent;

    TerrainAnalysis {
        terrain_type: terrain_type(steep, moderate),
        terrain_distribution: TerrainDistribution {
            flat_percent: gradients.flat_sections_percent,
            moderate_climbs_percent: moderate,
            steep_climbs_percent: steep,
            descents_percent: gradients.descents_percent,
        },
    }
}

pub fn terrain_type(steep_percent: f64, moderate_percent: f64) -> TerrainType {
    let climbing = moderate_percent + steep_percent;
    if steep_percent > 20.0 {
        TerrainType::Mountainous
    } else if climbing > 30.0 {
        TerrainType::Hilly
    } else if climbing > 10.0 {
        TerrainType::Rolling
    } else {
        TerrainType::Flat
    }
}
