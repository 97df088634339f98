//! Structured KML feature tree.
//!
//! The document is read into a small element tree first, then interpreted:
//! containers (`Document`, `Folder`) and `Placemark`s become [`KmlFeature`]s,
//! and the geometry of a feature becomes a [`KmlGeometry`]. Element names are
//! matched on their local part, so KML 2.0 and 2.2 namespaces read the same.

use firesmoke_common::{Position, Ring};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;

use crate::error::{GeometryError, Result};
use crate::parse_coordinates;

const FEATURE_TAGS: [&str; 3] = ["Document", "Folder", "Placemark"];

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct KmlPolygon {
    pub exterior: Ring,
    pub interiors: Vec<Ring>,
}

/// Geometry carried by a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum KmlGeometry {
    Point(Position),
    Polygon(KmlPolygon),
    /// A MultiGeometry whose members are all polygons.
    MultiPolygon(Vec<KmlPolygon>),
    /// Any other MultiGeometry, members in document order.
    Collection(Vec<KmlGeometry>),
}

impl KmlGeometry {
    /// Exterior ring: Polygon → its own, MultiPolygon → first member's,
    /// Collection → first member that has one.
    pub fn outer_ring(&self) -> Option<&Ring> {
        match self {
            KmlGeometry::Point(_) => None,
            KmlGeometry::Polygon(polygon) => non_empty(&polygon.exterior),
            KmlGeometry::MultiPolygon(polygons) => {
                polygons.first().and_then(|p| non_empty(&p.exterior))
            }
            KmlGeometry::Collection(members) => members.iter().find_map(KmlGeometry::outer_ring),
        }
    }

    fn from_element(el: &XmlElement) -> Option<Self> {
        match el.name.as_str() {
            "Point" => {
                let coords = parse_coordinates(&el.child("coordinates")?.text);
                coords.first().copied().map(KmlGeometry::Point)
            }
            "Polygon" => Some(KmlGeometry::Polygon(KmlPolygon::from_element(el))),
            "MultiGeometry" => {
                let members: Vec<KmlGeometry> =
                    el.children.iter().filter_map(KmlGeometry::from_element).collect();

                if !members.is_empty() && members.iter().all(|m| matches!(m, KmlGeometry::Polygon(_))) {
                    let polygons = members
                        .into_iter()
                        .filter_map(|m| match m {
                            KmlGeometry::Polygon(p) => Some(p),
                            _ => None,
                        })
                        .collect();
                    Some(KmlGeometry::MultiPolygon(polygons))
                } else {
                    Some(KmlGeometry::Collection(members))
                }
            }
            _ => None,
        }
    }
}

impl KmlPolygon {
    fn from_element(el: &XmlElement) -> Self {
        let ring_of = |boundary: &XmlElement| -> Ring {
            boundary
                .child("LinearRing")
                .and_then(|ring| ring.child("coordinates"))
                .map(|coords| parse_coordinates(&coords.text))
                .unwrap_or_default()
        };

        Self {
            exterior: el.child("outerBoundaryIs").map(ring_of).unwrap_or_default(),
            interiors: el
                .children
                .iter()
                .filter(|c| c.name == "innerBoundaryIs")
                .map(ring_of)
                .collect(),
        }
    }
}

fn non_empty(ring: &Ring) -> Option<&Ring> {
    if ring.is_empty() {
        None
    } else {
        Some(ring)
    }
}

// ============================================================================
// Features
// ============================================================================

/// A Document, Folder or Placemark.
#[derive(Debug, Clone, PartialEq)]
pub struct KmlFeature {
    pub kind: String,
    pub name: Option<String>,
    pub geometry: Option<KmlGeometry>,
    pub children: Vec<KmlFeature>,
}

impl KmlFeature {
    fn from_element(el: &XmlElement) -> Self {
        Self {
            kind: el.name.clone(),
            name: el.child("name").map(|n| n.text.trim().to_string()),
            geometry: el.children.iter().find_map(KmlGeometry::from_element),
            children: features_of(el),
        }
    }
}

fn features_of(el: &XmlElement) -> Vec<KmlFeature> {
    el.children
        .iter()
        .filter(|c| FEATURE_TAGS.contains(&c.name.as_str()))
        .map(KmlFeature::from_element)
        .collect()
}

/// Parsed KML document.
#[derive(Debug, Clone, PartialEq)]
pub struct KmlDocument {
    pub features: Vec<KmlFeature>,
}

impl KmlDocument {
    /// Parse a KML document. Fails on XML that is not well formed.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = parse_tree(xml)?;

        // Top-level features sit under <kml>; tolerate a bare feature root.
        let features = root
            .children
            .iter()
            .flat_map(|top| {
                if top.name == "kml" {
                    features_of(top)
                } else if FEATURE_TAGS.contains(&top.name.as_str()) {
                    vec![KmlFeature::from_element(top)]
                } else {
                    Vec::new()
                }
            })
            .collect();

        Ok(Self { features })
    }

    /// Exterior ring of the first feature, breadth-first, whose geometry has one.
    pub fn first_ring(&self) -> Option<&Ring> {
        let mut queue: VecDeque<&KmlFeature> = self.features.iter().collect();
        while let Some(feature) = queue.pop_front() {
            if let Some(ring) = feature.geometry.as_ref().and_then(KmlGeometry::outer_ring) {
                return Some(ring);
            }
            queue.extend(feature.children.iter());
        }
        None
    }
}

// ============================================================================
// XML element tree
// ============================================================================

#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn named(start: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn parse_tree(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack = vec![XmlElement::default()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(XmlElement::named(&e)),
            Event::Empty(e) => {
                let el = XmlElement::named(&e);
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(el);
                }
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(GeometryError::Malformed(format!(
                        "unexpected closing tag at byte {}",
                        reader.buffer_position()
                    )));
                }
                if let Some(el) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(el);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(GeometryError::Malformed("unclosed element at end of document".into()));
    }
    stack
        .pop()
        .ok_or_else(|| GeometryError::Malformed("empty document".into()))
}
