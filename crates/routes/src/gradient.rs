//! Per-segment gradients and climb detection.
//!
//! Climbs are found with a small hysteresis automaton: a climb opens on a steep segment and
//! stays open through shallower ones until the gradient flattens out, so a single dip does not
//! split one physical climb in two.

use crate::{
    geometry::{gradient, haversine_distance},
    models::{Climb, ClimbAnalysis, GradientAnalysis, Segment, TrackPoint},
};

/// Gradient and gain thresholds driving the climb automaton.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimbThresholds {
    /// Gradient (percent) a segment must exceed to open a climb.
    pub start_gradient: f64,
    /// Gradient (percent) a segment must exceed to keep a climb open.
    pub continue_gradient: f64,
    /// Climbs gaining this much or less are dropped as noise.
    pub min_elevation_gain_m: f64,
}

impl Default for ClimbThresholds {
    fn default() -> Self {
        Self {
            start_gradient: 3.0,
            continue_gradient: 1.0,
            min_elevation_gain_m: 10.0,
        }
    }
}

/// A segment together with the elevations at both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationStep {
    pub segment: Segment,
    pub start_elevation: f64,
    pub end_elevation: f64,
}

/// Running totals of a climb that has not been closed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimbAccumulator {
    pub start_elevation: f64,
    pub end_elevation: f64,
    pub distance_m: f64,
    pub elevation_gain_m: f64,
    pub max_gradient: f64,
    pub segment_count: usize,
}

impl ClimbAccumulator {
    fn open(step: &ElevationStep) -> Self {
        Self {
            start_elevation: step.start_elevation,
            end_elevation: step.end_elevation,
            distance_m: step.segment.distance_m,
            elevation_gain_m: step.segment.elevation_change_m.max(0.0),
            max_gradient: step.segment.gradient_percent,
            segment_count: 1,
        }
    }

    fn extend(&mut self, step: &ElevationStep) {
        self.end_elevation = step.end_elevation;
        self.distance_m += step.segment.distance_m;
        self.elevation_gain_m += step.segment.elevation_change_m.max(0.0);
        self.max_gradient = self.max_gradient.max(step.segment.gradient_percent);
        self.segment_count += 1;
    }

    /// Closes the climb, or drops it when it gained too little.
    fn close(self, thresholds: &ClimbThresholds) -> Option<Climb> {
        if self.elevation_gain_m <= thresholds.min_elevation_gain_m {
            return None;
        }

        let average_gradient = gradient(self.distance_m, self.elevation_gain_m);
        Some(Climb {
            start_elevation: self.start_elevation,
            end_elevation: self.end_elevation,
            distance_m: self.distance_m,
            elevation_gain_m: self.elevation_gain_m,
            max_gradient: self.max_gradient,
            average_gradient,
            difficulty_score: climb_difficulty(self.distance_m, average_gradient),
            segment_count: self.segment_count,
        })
    }
}

/// Distance in km times the squared average gradient, scaled down by 100.
pub fn climb_difficulty(distance_m: f64, average_gradient: f64) -> f64 {
    distance_m / 1000.0 * average_gradient.powi(2) / 100.0
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ClimbState {
    #[default]
    Idle,
    Climbing(ClimbAccumulator),
}

impl ClimbState {
    /// Feeds one segment through the automaton, returning the next state and any climb that
    /// was closed by this segment.
    pub fn step(self, step: &ElevationStep, thresholds: &ClimbThresholds) -> (Self, Option<Climb>) {
        let g = step.segment.gradient_percent;
        match self {
            ClimbState::Idle if g > thresholds.start_gradient => {
                (ClimbState::Climbing(ClimbAccumulator::open(step)), None)
            }
            ClimbState::Idle => (ClimbState::Idle, None),
            ClimbState::Climbing(mut acc) if g > thresholds.continue_gradient => {
                acc.extend(step);
                (ClimbState::Climbing(acc), None)
            }
            ClimbState::Climbing(acc) => (ClimbState::Idle, acc.close(thresholds)),
        }
    }

    /// Closes any open climb at the end of the track.
    pub fn finish(self, thresholds: &ClimbThresholds) -> Option<Climb> {
        match self {
            ClimbState::Idle => None,
            ClimbState::Climbing(acc) => acc.close(thresholds),
        }
    }
}

/// Yields a step for every consecutive pair where both points carry an elevation.
pub fn elevation_steps(points: &[TrackPoint]) -> impl Iterator<Item = ElevationStep> + '_ {
    points.windows(2).filter_map(|pair| {
        let (prev, curr) = (&pair[0], &pair[1]);
        let (start_elevation, end_elevation) = (prev.elevation?, curr.elevation?);

        let distance_m = haversine_distance(prev.lat, prev.lon, curr.lat, curr.lon) * 1000.0;
        let elevation_change_m = end_elevation - start_elevation;

        Some(ElevationStep {
            segment: Segment {
                distance_m,
                elevation_change_m,
                gradient_percent: gradient(distance_m, elevation_change_m),
            },
            start_elevation,
            end_elevation,
        })
    })
}

/// Runs gradient statistics and climb detection in a single pass over the track.
pub fn analyze_gradients_and_climbs(
    points: &[TrackPoint],
    thresholds: &ClimbThresholds,
) -> (GradientAnalysis, ClimbAnalysis) {
    let mut segments = Vec::new();
    let mut climbs = Vec::new();
    let mut state = ClimbState::Idle;

    // Pairs without elevation never reach the automaton, so they leave an open climb open
    for step in elevation_steps(points) {
        segments.push(step.segment);
        let (next, closed) = state.step(&step, thresholds);
        climbs.extend(closed);
        state = next;
    }
    climbs.extend(state.finish(thresholds));

    (summarize_gradients(segments), summarize_climbs(climbs))
}

/// Aggregates segment gradients. Bucket percentages are shares of segment count.
pub fn summarize_gradients(segments: Vec<Segment>) -> GradientAnalysis {
    if segments.is_empty() {
        return GradientAnalysis::default();
    }

    let n = segments.len() as f64;
    let gradients: Vec<f64> = segments.iter().map(|s| s.gradient_percent).collect();

    let mean = gradients.iter().sum::<f64>() / n;
    let variance = gradients.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n;
    let share = |pred: fn(f64) -> bool| {
        gradients.iter().filter(|g| pred(**g)).count() as f64 / n * 100.0
    };

    GradientAnalysis {
        average_gradient_percent: mean,
        max_gradient_percent: gradients.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_gradient_percent: gradients.iter().copied().fold(f64::INFINITY, f64::min),
        gradient_std_dev: variance.sqrt(),
        steep_climbs_percent: share(|g: f64| g > 8.0),
        moderate_climbs_percent: share(|g: f64| g > 3.0 && g <= 8.0),
        // Flat also absorbs gentle descents down to -3%
        flat_sections_percent: share(|g: f64| g.abs() <= 3.0),
        descents_percent: share(|g: f64| g < -3.0),
        segments,
    }
}

pub fn summarize_climbs(climbs: Vec<Climb>) -> ClimbAnalysis {
    if climbs.is_empty() {
        return ClimbAnalysis::default();
    }

    let count = climbs.len() as f64;
    let total_distance: f64 = climbs.iter().map(|c| c.distance_m).sum();
    let total_elevation: f64 = climbs.iter().map(|c| c.elevation_gain_m).sum();

    ClimbAnalysis {
        climb_count: climbs.len(),
        total_climb_distance_km: total_distance / 1000.0,
        total_climb_elevation_m: total_elevation,
        average_climb_length_m: total_distance / count,
        average_climb_gradient: climbs.iter().map(|c| c.average_gradient).sum::<f64>() / count,
        max_climb_gradient: climbs
            .iter()
            .map(|c| c.max_gradient)
            .fold(f64::NEG_INFINITY, f64::max),
        climb_difficulty_score: climbs.iter().map(|c| c.difficulty_score).sum(),
        climbs,
    }
}
