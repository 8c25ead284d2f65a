use bytes::Bytes;
use gpx::{Gpx, Waypoint, read};
use time::OffsetDateTime;

use crate::{errors::AppError, models::TrackPoint};

pub struct GpxProcessor;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRoute {
    pub name: Option<String>,
    pub points: Vec<TrackPoint>,
}

impl GpxProcessor {
    /// Reads every track point (all tracks, all segments) followed by every route point.
    pub fn parse(content: &Bytes) -> Result<ParsedRoute, AppError> {
        let gpx: Gpx = read(content.as_ref())
            .map_err(|e| AppError::GpxParsing(format!("Failed to parse GPX: {}", e)))?;

        let track_points = gpx
            .tracks
            .iter()
            .flat_map(|track| &track.segments)
            .flat_map(|segment| &segment.points);
        let route_points = gpx.routes.iter().flat_map(|route| &route.points);

        let points: Vec<TrackPoint> = track_points.chain(route_points).map(to_track_point).collect();

        if points.is_empty() {
            return Err(AppError::InvalidInput(
                "No track or route points found in GPX file".to_string(),
            ));
        }

        tracing::debug!("Parsed {} points from GPX", points.len());

        Ok(ParsedRoute {
            name: route_name(&gpx),
            points,
        })
    }
}

fn route_name(gpx: &Gpx) -> Option<String> {
    gpx.metadata
        .as_ref()
        .and_then(|m| m.name.clone())
        .or_else(|| gpx.tracks.iter().find_map(|t| t.name.clone()))
        .or_else(|| gpx.routes.iter().find_map(|r| r.name.clone()))
}

fn to_track_point(wpt: &Waypoint) -> TrackPoint {
    let point = wpt.point();
    TrackPoint {
        lat: point.y(),
        lon: point.x(),
        elevation: wpt.elevation,
        timestamp: wpt.time.map(OffsetDateTime::from),
    }
}
