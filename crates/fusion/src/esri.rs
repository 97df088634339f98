//! EsriJSON ring projection.
//!
//! EsriJSON polygons are a flat list of `rings` in latitude-first order.
//! A MultiPolygon loses its grouping: every ring of every member polygon
//! lands in the same list.

use firesmoke_common::{Geometry, Ring};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FusionError, Result};

/// WGS-84
pub const WGS84_WKID: u32 = 4326;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsriPolygon {
    pub rings: Vec<Ring>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsriFeature {
    pub geometry: EsriPolygon,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsriFeatureSet {
    #[serde(rename = "geometryType")]
    pub geometry_type: String,
    #[serde(rename = "spatialReference")]
    pub spatial_reference: SpatialReference,
    pub features: Vec<EsriFeature>,
}

impl EsriFeatureSet {
    pub fn new(features: Vec<EsriFeature>) -> Self {
        Self {
            geometry_type: "esriGeometryPolygon".to_string(),
            spatial_reference: SpatialReference { wkid: WGS84_WKID },
            features,
        }
    }

    /// One feature per geometry, in order.
    pub fn from_geometries<'a>(geometries: impl IntoIterator<Item = &'a Geometry>) -> Result<Self> {
        let features = geometries
            .into_iter()
            .map(|g| {
                Ok(EsriFeature {
                    geometry: EsriPolygon { rings: rings(g)? },
                    attributes: Map::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(features))
    }
}

/// `(x, y)` → `(y, x)` for every position.
pub fn swap_axes(ring: &Ring) -> Ring {
    ring.iter().map(|[x, y]| [*y, *x]).collect()
}

/// Axis-swapped rings of a Polygon or MultiPolygon.
pub fn rings(geometry: &Geometry) -> Result<Vec<Ring>> {
    match geometry {
        Geometry::Polygon { coordinates } => Ok(coordinates.iter().map(swap_axes).collect()),
        Geometry::MultiPolygon { coordinates } => Ok(coordinates
            .iter()
            .flat_map(|polygon| polygon.iter().map(swap_axes))
            .collect()),
        other => Err(FusionError::UnsupportedGeometry(other.type_name())),
    }
}

/// Single-feature EsriJSON document for one polygon geometry.
pub fn project(geometry: &Geometry) -> Result<EsriFeatureSet> {
    EsriFeatureSet::from_geometries(std::iter::once(geometry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_polygon_scenario() {
        let polygon = Geometry::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]],
        };
        let set = project(&polygon).unwrap();
        assert_eq!(
            set.features[0].geometry.rings,
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        );
    }

    #[test]
    fn test_document_shape() {
        let set = project(&Geometry::polygon(vec![[-97.7, 30.3], [-97.6, 30.4], [-97.7, 30.3]])).unwrap();
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({
                "geometryType": "esriGeometryPolygon",
                "spatialReference": {"wkid": 4326},
                "features": [{
                    "geometry": {"rings": [[[30.3, -97.7], [30.4, -97.6], [30.3, -97.7]]]},
                    "attributes": {}
                }]
            })
        );
    }

    #[test]
    fn test_multipolygon_rings_are_flattened() {
        let multi = Geometry::MultiPolygon {
            coordinates: vec![
                vec![
                    vec![[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [0.0, 0.0]],
                    vec![[1.0, 1.0], [1.0, 2.0], [2.0, 2.0], [1.0, 1.0]],
                ],
                vec![vec![[10.0, 20.0], [10.0, 21.0], [11.0, 21.0], [10.0, 20.0]]],
            ],
        };
        let rings = rings(&multi).unwrap();
        assert_eq!(rings.len(), 3);
        assert_eq!(rings[2][0], [20.0, 10.0]);
    }

    #[test]
    fn test_double_swap_is_identity() {
        let ring: Ring = vec![[-97.73, 30.30], [-97.72, 30.31], [-97.71, 30.30], [-97.73, 30.30]];
        let twice = swap_axes(&swap_axes(&ring));
        assert_eq!(twice.len(), ring.len());
        assert_eq!(twice, ring);
    }

    #[test]
    fn test_point_is_rejected() {
        let err = project(&Geometry::point(1.0, 2.0)).unwrap_err();
        assert!(matches!(err, FusionError::UnsupportedGeometry("Point")));
        assert_eq!(err.http_status_code(), 400);
    }
}
