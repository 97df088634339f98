//! Domain types: incidents, horizons and per-incident bundles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::EmissionConfig;
use crate::error::{FireSmokeError, FireSmokeResult};

// ============================================================================
// Incidents
// ============================================================================

/// A single reported fire incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub guid: String,
    pub lat: f64,
    pub lon: f64,
    pub title: String,
    pub description: String,
    pub pub_date: String,
}

/// All incidents reported on a given day, in feed order.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentSnapshot {
    pub day: NaiveDate,
    pub incidents: Vec<Incident>,
}

/// Raw item of the normalised feed document.
#[derive(Debug, Deserialize)]
struct FeedItem {
    guid: FeedGuid,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    link: String,
}

/// `guid` is `{"@isPermaLink": .., "#text": ..}` when the element carried
/// attributes, a bare string otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedGuid {
    Plain(String),
    Tagged {
        #[serde(rename = "#text")]
        text: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

#[derive(Debug, Deserialize)]
struct FeedChannel {
    #[serde(default)]
    item: Option<OneOrMany<FeedItem>>,
}

#[derive(Debug, Deserialize)]
struct FeedRss {
    channel: FeedChannel,
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    rss: FeedRss,
}

impl IncidentSnapshot {
    /// Build a snapshot from the normalised feed document (`rss.channel.item`).
    pub fn from_feed(day: NaiveDate, feed: &serde_json::Value) -> FireSmokeResult<Self> {
        let doc = FeedDocument::deserialize(feed)
            .map_err(|e| FireSmokeError::MalformedFeed(e.to_string()))?;

        let items = match doc.rss.channel.item {
            None => Vec::new(),
            Some(OneOrMany::One(item)) => vec![item],
            Some(OneOrMany::Many(items)) => items,
        };

        let incidents = items
            .into_iter()
            .map(Incident::from_feed_item)
            .collect::<FireSmokeResult<Vec<_>>>()?;

        Ok(Self { day, incidents })
    }

    /// Load a persisted snapshot file.
    pub fn load(path: &Path, day: NaiveDate) -> FireSmokeResult<Self> {
        if !path.exists() {
            return Err(FireSmokeError::NotFound(format!(
                "no incident snapshot for {}",
                day
            )));
        }
        let text = std::fs::read_to_string(path)?;
        let feed: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| FireSmokeError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::from_feed(day, &feed)
    }

    pub fn find(&self, guid: &str) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.guid == guid)
    }

    /// Position of an incident in feed order.
    pub fn position(&self, guid: &str) -> Option<usize> {
        self.incidents.iter().position(|i| i.guid == guid)
    }
}

impl Incident {
    fn from_feed_item(item: FeedItem) -> FireSmokeResult<Self> {
        let guid = match item.guid {
            FeedGuid::Plain(text) | FeedGuid::Tagged { text } => text,
        };
        let (lat, lon) = parse_link_coordinates(&item.link)?;

        Ok(Self {
            guid,
            lat,
            lon,
            title: item.title.unwrap_or_default(),
            description: item.description.unwrap_or_default(),
            pub_date: item.pub_date.unwrap_or_default(),
        })
    }
}

/// Extract `(lat, lon)` from a map link of the form `...?q=<lat>,<lon>`.
pub fn parse_link_coordinates(link: &str) -> FireSmokeResult<(f64, f64)> {
    let malformed = || FireSmokeError::MalformedLink(link.to_string());

    let (_, query) = link.split_once("q=").ok_or_else(malformed)?;
    let query = query.split('&').next().unwrap_or(query);
    let (lat, lon) = query.split_once(',').ok_or_else(malformed)?;

    let lat: f64 = lat.trim().parse().map_err(|_| malformed())?;
    let lon: f64 = lon.trim().parse().map_err(|_| malformed())?;
    Ok((lat, lon))
}

// ============================================================================
// Wind
// ============================================================================

/// Wind in the engine's discretised units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindObservation {
    /// Speed in mph, always >= 1
    pub wspd: u32,
    /// Direction in degrees, always in 1..=360
    pub wdir: u32,
    /// True when the lookup could not resolve the location and calm wind was substituted
    #[serde(default)]
    pub degraded: bool,
}

// ============================================================================
// Horizons
// ============================================================================

/// Emission parameters handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionParams {
    pub acres: f64,
    pub mix: f64,
    pub stclass: u8,
    pub frise: f64,
    pub erate: f64,
    pub hrate: f64,
}

impl From<&EmissionConfig> for EmissionParams {
    fn from(cfg: &EmissionConfig) -> Self {
        Self {
            acres: cfg.acres_default,
            mix: cfg.mix_height_ft,
            stclass: cfg.stability_class,
            frise: cfg.plume_rise_fraction,
            erate: cfg.emission_rate,
            hrate: cfg.heat_rate,
        }
    }
}

/// One entry of the fixed horizon catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonSpec {
    /// Tag used as the bundle key and the `horizon_type` property ("0.5h")
    pub tag: &'static str,
    /// 1-based ordinal used in artifact stems
    pub ordinal: u8,
    /// Lookahead in minutes
    pub minutes: u32,
    pub emission: EmissionParams,
}

const HORIZONS: [(&str, u8, u32); 3] = [("0.5h", 1, 30), ("1.5h", 2, 90), ("2.5h", 3, 150)];

/// The three horizons every incident is simulated at, in catalog order.
pub fn horizon_catalog(emission: &EmissionConfig) -> [HorizonSpec; 3] {
    let params = EmissionParams::from(emission);
    HORIZONS.map(|(tag, ordinal, minutes)| HorizonSpec {
        tag,
        ordinal,
        minutes,
        emission: params,
    })
}

/// Tags of the horizon catalog, in order.
pub fn horizon_tags() -> [&'static str; 3] {
    HORIZONS.map(|(tag, _, _)| tag)
}

/// Deterministic artifact stem `<day>_<guid>_<ordinal>`.
pub fn horizon_stem(day: NaiveDate, guid: &str, ordinal: u8) -> String {
    format!("{}_{}_{}", day, file_safe(guid), ordinal)
}

/// Escape a guid for use in a file name.
///
/// ASCII alphanumerics and `-`, `.`, `_` pass through; every other byte
/// becomes `~XX` (uppercase hex), so distinct guids never share a name.
pub fn file_safe(guid: &str) -> String {
    let mut out = String::with_capacity(guid.len());
    for byte in guid.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("~{:02X}", byte));
        }
    }
    out
}

/// Outcome of one resolved horizon, as persisted in the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonResult {
    #[serde(default)]
    pub stem: String,
    /// Plume artifact path relative to the data root
    pub kml: String,
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

impl HorizonResult {
    pub fn new(spec: &HorizonSpec, stem: String, wind: WindObservation, kml: String) -> Self {
        Self {
            stem,
            kml,
            acres: spec.emission.acres,
            mix: spec.emission.mix,
            stclass: spec.emission.stclass,
            frise: spec.emission.frise,
            horizon_min: spec.minutes,
            erate: spec.emission.erate,
            hrate: spec.emission.hrate,
            wspd: wind.wspd,
            wdir: wind.wdir,
            wind_degraded: wind.degraded,
        }
    }

    pub fn wind(&self) -> WindObservation {
        WindObservation {
            wspd: self.wspd,
            wdir: self.wdir,
            degraded: self.wind_degraded,
        }
    }
}

/// Authoritative per-incident record of all horizon results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentBundle {
    pub guid: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub horizons: BTreeMap<String, HorizonResult>,
}

impl IncidentBundle {
    pub fn horizon(&self, tag: &str) -> Option<&HorizonResult> {
        self.horizons.get(tag)
    }

    /// Catalog tags with no entry in this bundle.
    pub fn missing_horizons(&self) -> Vec<&'static str> {
        horizon_tags()
            .into_iter()
            .filter(|tag| !self.horizons.contains_key(*tag))
            .collect()
    }

    pub fn load(path: &Path) -> FireSmokeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| FireSmokeError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
