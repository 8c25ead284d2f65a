//! GPX 1.1 output for generated rides, in the shape the `/routes/analyze/gpx` endpoint accepts.

use std::fmt::Write;

use time::format_description::well_known::Rfc3339;

use crate::TrackPoint;

const HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "\n",
    r#"<gpx version="1.1" creator="routes-test-data" xmlns="http://www.topografix.com/GPX/1/1">"#,
    "\n",
);

/// Renders the points as a single-segment track named `name`.
///
/// Elevation and time elements are emitted only for points that carry them.
pub fn generate_gpx(points: &[TrackPoint], name: &str) -> String {
    let name = escape_xml(name);
    let mut gpx = String::with_capacity(HEADER.len() + points.len() * 96);

    gpx.push_str(HEADER);
    let _ = writeln!(gpx, "  <metadata><name>{name}</name></metadata>");
    let _ = writeln!(gpx, "  <trk>\n    <name>{name}</name>\n    <trkseg>");

    for point in points {
        let _ = write!(gpx, r#"      <trkpt lat="{:.7}" lon="{:.7}">"#, point.lat, point.lon);
        if let Some(ele) = point.elevation {
            let _ = write!(gpx, "<ele>{ele:.2}</ele>");
        }
        if let Some(ts) = point.timestamp.and_then(|ts| ts.format(&Rfc3339).ok()) {
            let _ = write!(gpx, "<time>{ts}</time>");
        }
        gpx.push_str("</trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    gpx
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
