//! GeoJSON model of the fused fire/smoke map.
//!
//! The fused output is one flat `FeatureCollection`; every feature carries a
//! `layer` property so clients can filter and symbolise each logical layer
//! separately:
//!
//! - `incidents`: point per incident
//! - `plumes`: polygon per (incident, horizon)
//! - `meta`: point per (incident, horizon) carrying the emission and wind inputs

use serde::{Deserialize, Serialize};

/// A `[x, y]` coordinate pair; `[lon, lat]` in GeoJSON.
pub type Position = [f64; 2];

/// An ordered list of positions forming a closed boundary.
pub type Ring = Vec<Position>;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Collection title, e.g. `FireSmokeMap_2025-05-11`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            title: title.into(),
            features: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features.extend(features);
        self
    }

    /// Features belonging to one layer, in collection order.
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(move |f| f.properties.layer() == layer)
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: Geometry,

    pub properties: FeatureProperties,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: FeatureProperties) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry,
            properties,
        }
    }
}

/// Geometry types produced or consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: Position,
    },

    Polygon {
        /// Linear rings; the first is the exterior.
        coordinates: Vec<Ring>,
    },

    MultiPolygon {
        coordinates: Vec<Vec<Ring>>,
    },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }

    /// Polygon with a single exterior ring.
    pub fn polygon(exterior: Ring) -> Self {
        Geometry::Polygon {
            coordinates: vec![exterior],
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }
}

/// Logical layer of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Incidents,
    Plumes,
    Meta,
}

/// Layer-tagged feature properties; serialised with a `layer` discriminator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "layer", rename_all = "lowercase")]
pub enum FeatureProperties {
    Incidents(IncidentProperties),
    Plumes(PlumeProperties),
    Meta(MetaProperties),
}

impl FeatureProperties {
    pub fn layer(&self) -> Layer {
        match self {
            FeatureProperties::Incidents(_) => Layer::Incidents,
            FeatureProperties::Plumes(_) => Layer::Plumes,
            FeatureProperties::Meta(_) => Layer::Meta,
        }
    }

    /// Guid of the incident this feature belongs to.
    pub fn guid(&self) -> &str {
        match self {
            FeatureProperties::Incidents(p) => &p.guid,
            FeatureProperties::Plumes(p) => &p.guid,
            FeatureProperties::Meta(p) => &p.guid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentProperties {
    pub guid: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlumeProperties {
    pub guid: String,
    pub title: String,
    pub horizon_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetaProperties {
    pub guid: String,
    pub title: String,
    pub horizon_type: String,
    pub acres: f64,
    pub mix: f64,
    pub stclass: u8,
    pub frise: f64,
    pub horizon_min: u32,
    pub erate: f64,
    pub hrate: f64,
    pub wspd: u32,
    pub wdir: u32,
    #[serde(default)]
    pub wind_degraded: bool,
}
