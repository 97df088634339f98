//! Query parameter values accepted by `/layer`.

use std::str::FromStr;

use crate::error::ApiError;

/// Which logical layer to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Fires,
    Plume,
    Meta,
    /// All layers fused into one collection
    Map,
}

impl FromStr for LayerKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fires" => Ok(LayerKind::Fires),
            "plume" => Ok(LayerKind::Plume),
            "meta" => Ok(LayerKind::Meta),
            "map" => Ok(LayerKind::Map),
            _ => Err(ApiError::BadRequest(format!("Unknown layer type '{}'", s))),
        }
    }
}

/// Output dialect for polygon layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    GeoJson,
    EsriJson,
}

impl FromStr for OutputFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "geojson" | "geo+json" => Ok(OutputFormat::GeoJson),
            "esrijson" | "esri" => Ok(OutputFormat::EsriJson),
            _ => Err(ApiError::BadRequest(
                "fmt must be geojson or esrijson".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_kind() {
        assert_eq!("Fires".parse::<LayerKind>().unwrap(), LayerKind::Fires);
        assert_eq!("map".parse::<LayerKind>().unwrap(), LayerKind::Map);
        assert!("smoke".parse::<LayerKind>().is_err());
    }

    #[test]
    fn test_output_format() {
        assert_eq!("".parse::<OutputFormat>().unwrap(), OutputFormat::GeoJson);
        assert_eq!("ESRIJSON".parse::<OutputFormat>().unwrap(), OutputFormat::EsriJson);
        assert!("kml".parse::<OutputFormat>().is_err());
    }
}
