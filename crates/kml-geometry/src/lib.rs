//! Polygon ring recovery from plume KML documents.
//!
//! The dispersion converter writes KML whose layout varies between versions:
//! polygons may sit directly in a Placemark, inside nested Folders, inside a
//! MultiGeometry, or under the legacy 2.0 namespace. Extraction runs two
//! strategies, first success wins:
//!
//! 1. [`document`]: parse the feature tree and walk it breadth-first, taking
//!    the exterior ring of the first feature whose geometry has one.
//! 2. [`fallback`]: scan the raw text for the first `LinearRing/coordinates`
//!    node. Tolerates documents the structured parser rejects.
//!
//! A document with no ring is not an error; [`extract`] returns `Ok(None)`.

pub mod document;
pub mod error;
pub mod fallback;

pub use document::{KmlDocument, KmlFeature, KmlGeometry, KmlPolygon};
pub use error::{GeometryError, Result};

use firesmoke_common::{Position, Ring};
use std::path::Path;
use tracing::debug;

/// Read a plume artifact and return its outer ring as `[lon, lat]` pairs.
///
/// Only failing to read the file is an error.
pub fn extract(path: &Path) -> Result<Option<Ring>> {
    let text = std::fs::read_to_string(path)?;
    let ring = extract_str(&text);
    if ring.is_none() {
        debug!(path = %path.display(), "No polygon ring in KML document");
    }
    Ok(ring)
}

/// Outer ring of an in-memory KML document.
pub fn extract_str(xml: &str) -> Option<Ring> {
    match KmlDocument::parse(xml) {
        Ok(doc) => {
            if let Some(ring) = doc.first_ring() {
                return Some(ring.clone());
            }
        }
        Err(e) => {
            debug!(error = %e, "Structured KML parse failed, scanning raw text");
        }
    }
    fallback::first_linear_ring(xml)
}

/// Parse a KML `coordinates` text into positions.
///
/// Tokens are whitespace separated `x,y[,z]`; only the first two components
/// are kept and tokens that do not parse are skipped.
pub fn parse_coordinates(text: &str) -> Vec<Position> {
    text.split_whitespace()
        .filter_map(|token| {
            let mut parts = token.split(',');
            let x = parts.next()?.trim().parse::<f64>().ok()?;
            let y = parts.next()?.trim().parse::<f64>().ok()?;
            Some([x, y])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates_drops_altitude() {
        let coords = parse_coordinates("\n  -97.7,30.3,0  -97.6,30.4,12.5\n");
        assert_eq!(coords, vec![[-97.7, 30.3], [-97.6, 30.4]]);
    }

    #[test]
    fn test_parse_coordinates_skips_bad_tokens() {
        let coords = parse_coordinates("1,2 nope 3 4,x 5,6");
        assert_eq!(coords, vec![[1.0, 2.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_extract_str_prefers_structured_ring() {
        let ring = extract_str(test_utils::fixtures::kml::NESTED_POLYGON).unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], [-97.73, 30.30]);
    }

    #[test]
    fn test_extract_str_none_for_point_only() {
        assert_eq!(extract_str(test_utils::fixtures::kml::POINT_ONLY), None);
        assert_eq!(extract_str("not xml at all"), None);
    }
}
