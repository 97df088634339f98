//! Wind resolution into the engine's discretised units.
//!
//! Speed: first whitespace token if it is all digits, else 0; anything below
//! 1 mph is raised to 1 since the solver rejects sub-threshold wind.
//! Direction: one of 16 compass labels mapped onto fixed angles; unknown
//! labels read as `N`; 0 degrees is reported as 360.

use async_trait::async_trait;
use firesmoke_common::WindObservation;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;

/// Compass labels in clockwise order, paired index-wise with [`COMPASS_ANGLES`].
pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub const COMPASS_ANGLES: [u32; 16] = [
    0, 25, 45, 65, 90, 115, 135, 155, 180, 205, 225, 245, 270, 295, 315, 335,
];

/// Wind as reported by the forecast service, e.g. `"4 mph"` / `"S"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWind {
    pub speed: String,
    pub direction: String,
}

impl RawWind {
    pub fn new(speed: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            speed: speed.into(),
            direction: direction.into(),
        }
    }
}

/// Point-forecast lookup.
#[async_trait]
pub trait WindLookup: Send + Sync {
    /// Current wind at a location.
    ///
    /// `Ok(None)` means the service does not cover the location; transport
    /// and payload failures are errors.
    async fn lookup(&self, lat: f64, lon: f64) -> Result<Option<RawWind>>;
}

pub fn normalize_speed(text: &str) -> u32 {
    let speed = text
        .split_whitespace()
        .next()
        .filter(|token| token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse::<u32>().ok())
        .unwrap_or(0);
    speed.max(1)
}

pub fn compass_to_degrees(label: &str) -> u32 {
    let index = COMPASS_POINTS
        .iter()
        .position(|p| *p == label.trim())
        .unwrap_or(0);
    match COMPASS_ANGLES[index] {
        0 => 360,
        angle => angle,
    }
}

pub fn normalize(raw: &RawWind) -> WindObservation {
    WindObservation {
        wspd: normalize_speed(&raw.speed),
        wdir: compass_to_degrees(&raw.direction),
        degraded: false,
    }
}

/// Calm wind substituted when the location cannot be resolved.
pub fn calm() -> WindObservation {
    WindObservation {
        wspd: normalize_speed("0 mph"),
        wdir: compass_to_degrees("N"),
        degraded: true,
    }
}

#[derive(Clone)]
pub struct WindResolver {
    lookup: Arc<dyn WindLookup>,
}

impl WindResolver {
    pub fn new(lookup: Arc<dyn WindLookup>) -> Self {
        Self { lookup }
    }

    pub async fn resolve(&self, lat: f64, lon: f64) -> Result<WindObservation> {
        match self.lookup.lookup(lat, lon).await? {
            Some(raw) => {
                let wind = normalize(&raw);
                debug!(
                    lat, lon,
                    speed = %raw.speed,
                    direction = %raw.direction,
                    wspd = wind.wspd,
                    wdir = wind.wdir,
                    "Resolved wind"
                );
                Ok(wind)
            }
            None => {
                warn!(lat, lon, "Location outside forecast coverage, using calm wind");
                Ok(calm())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispersionError;

    struct Fixed(Option<RawWind>);

    #[async_trait]
    impl WindLookup for Fixed {
        async fn lookup(&self, _lat: f64, _lon: f64) -> Result<Option<RawWind>> {
            Ok(self.0.clone())
        }
    }

    struct Down;

    #[async_trait]
    impl WindLookup for Down {
        async fn lookup(&self, _lat: f64, _lon: f64) -> Result<Option<RawWind>> {
            Err(DispersionError::UpstreamStatus {
                status: 500,
                url: "https://weather.invalid".into(),
            })
        }
    }

    #[test]
    fn test_speed_normalisation() {
        assert_eq!(normalize_speed("4 mph"), 4);
        assert_eq!(normalize_speed("10 to 15 mph"), 10);
        assert_eq!(normalize_speed("0 mph"), 1);
        assert_eq!(normalize_speed("Calm"), 1);
        assert_eq!(normalize_speed("2.5 mph"), 1);
        assert_eq!(normalize_speed(""), 1);
        for text in ["1 mph", "7 mph", "25 mph", "  3", "x", "-4 mph"] {
            assert!(normalize_speed(text) >= 1, "{:?}", text);
        }
    }

    #[test]
    fn test_every_label_maps_into_fixed_set() {
        for label in COMPASS_POINTS {
            let deg = compass_to_degrees(label);
            assert_ne!(deg, 0);
            assert!(deg == 360 || COMPASS_ANGLES.contains(&deg), "{} -> {}", label, deg);
        }
        assert_eq!(compass_to_degrees("S"), 180);
        assert_eq!(compass_to_degrees("N"), 360);
        assert_eq!(compass_to_degrees("WSW"), 245);
        assert_eq!(compass_to_degrees("Calm"), 360);
        assert_eq!(compass_to_degrees("Variable"), 360);
    }

    #[tokio::test]
    async fn test_resolver_scenario() {
        let resolver = WindResolver::new(Arc::new(Fixed(Some(RawWind::new("4 mph", "S")))));
        let wind = resolver.resolve(30.30, -97.73).await.unwrap();
        assert_eq!(wind, WindObservation { wspd: 4, wdir: 180, degraded: false });
    }

    #[tokio::test]
    async fn test_unresolved_location_degrades_to_calm() {
        let resolver = WindResolver::new(Arc::new(Fixed(None)));
        let wind = resolver.resolve(10.0, 10.0).await.unwrap();
        assert_eq!(wind, WindObservation { wspd: 1, wdir: 360, degraded: true });
    }

    #[tokio::test]
    async fn test_upstream_failure_is_an_error() {
        let resolver = WindResolver::new(Arc::new(Down));
        assert!(resolver.resolve(30.0, -97.0).await.is_err());
    }
}
