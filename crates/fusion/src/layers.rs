//! Fusion of the incidents, plumes and meta layers.
//!
//! Output order is fixed: every incident point first (snapshot order), then
//! every plume polygon, then every meta point. Plumes and meta follow
//! snapshot order by incident and catalog order by horizon; bundles whose
//! incident is missing from the snapshot come last, by file name.
//!
//! A bundle lacking a horizon is an error. A plume artifact that is missing
//! or has no ring only drops that one plume feature; its meta point is
//! still emitted.

use chrono::NaiveDate;
use firesmoke_common::fsutil::write_json_atomic;
use firesmoke_common::geojson::{IncidentProperties, MetaProperties, PlumeProperties};
use firesmoke_common::types::horizon_tags;
use firesmoke_common::{
    DataLayout, Feature, FeatureCollection, FeatureProperties, Geometry, HorizonResult,
    IncidentBundle, IncidentSnapshot,
};
use metrics::counter;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

use crate::error::{FusionError, Result};

/// Result of [`LayerFusion::fuse`].
#[derive(Debug, Clone, PartialEq)]
pub enum FusionOutput {
    Collection(FeatureCollection),
    Persisted(PathBuf),
}

/// One incident point per snapshot entry.
pub fn incident_features(snapshot: &IncidentSnapshot) -> Vec<Feature> {
    snapshot
        .incidents
        .iter()
        .map(|incident| {
            Feature::new(
                Geometry::point(incident.lon, incident.lat),
                FeatureProperties::Incidents(IncidentProperties {
                    guid: incident.guid.clone(),
                    title: incident.title.clone(),
                    description: incident.description.clone(),
                    pub_date: incident.pub_date.clone(),
                }),
            )
        })
        .collect()
}

pub struct LayerFusion {
    layout: DataLayout,
}

impl LayerFusion {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Build the fused collection and either return it or persist it to
    /// `FireSmokeMap_<day>.geojson`, as the caller chooses.
    pub fn fuse(&self, day: NaiveDate, persist: bool) -> Result<FusionOutput> {
        let collection = self.build(day)?;
        if !persist {
            return Ok(FusionOutput::Collection(collection));
        }

        let path = self.layout.fused_path(day);
        write_json_atomic(&path, &collection)?;
        info!(path = %path.display(), features = collection.features.len(), "Wrote fused collection");
        Ok(FusionOutput::Persisted(path))
    }

    #[instrument(skip(self), fields(day = %day))]
    pub fn build(&self, day: NaiveDate) -> Result<FeatureCollection> {
        let snapshot = IncidentSnapshot::load(&self.layout.snapshot_path(day), day)?;
        let bundles = self.ordered_bundles(day, &snapshot)?;

        let mut plumes = Vec::new();
        let mut meta = Vec::new();
        for bundle in &bundles {
            let title = feature_title(bundle, &snapshot);
            for tag in horizon_tags() {
                let Some(result) = bundle.horizon(tag) else {
                    continue;
                };
                if let Some(plume) = self.plume_feature(bundle, &title, tag, result) {
                    plumes.push(plume);
                }
                meta.push(meta_feature(bundle, &title, tag, result));
            }
        }

        let mut features = incident_features(&snapshot);
        let incidents = features.len();
        let plume_count = plumes.len();
        features.extend(plumes);
        features.extend(meta);

        info!(
            incidents,
            bundles = bundles.len(),
            plumes = plume_count,
            features = features.len(),
            "Fused layers"
        );
        Ok(FeatureCollection::new(format!("FireSmokeMap_{}", day)).with_features(features))
    }

    /// All complete bundles of the day in snapshot order.
    fn ordered_bundles(&self, day: NaiveDate, snapshot: &IncidentSnapshot) -> Result<Vec<IncidentBundle>> {
        let mut bundles = Vec::new();
        for path in self.layout.bundle_files(day)? {
            let bundle = IncidentBundle::load(&path)?;
            let missing = bundle.missing_horizons();
            if !missing.is_empty() {
                return Err(FusionError::IncompleteBundle { path, missing });
            }
            bundles.push(bundle);
        }

        // Stable: bundles for unknown incidents keep file-name order at the end.
        bundles.sort_by_key(|b| snapshot.position(&b.guid).unwrap_or(usize::MAX));
        for orphan in bundles.iter().filter(|b| snapshot.find(&b.guid).is_none()) {
            warn!(guid = %orphan.guid, "Bundle has no incident in the snapshot");
        }
        Ok(bundles)
    }

    fn plume_feature(
        &self,
        bundle: &IncidentBundle,
        title: &str,
        tag: &str,
        result: &HorizonResult,
    ) -> Option<Feature> {
        let path = self.layout.resolve(&result.kml);
        let skip = |reason: &str| {
            counter!("firesmoke_plumes_skipped_total").increment(1);
            warn!(guid = %bundle.guid, horizon = tag, path = %path.display(), reason, "Skipping plume feature");
        };

        if !path.exists() {
            skip("artifact missing");
            return None;
        }

        match kml_geometry::extract(&path) {
            Ok(Some(ring)) => {
                debug!(guid = %bundle.guid, horizon = tag, points = ring.len(), "Extracted plume ring");
                Some(Feature::new(
                    Geometry::polygon(ring),
                    FeatureProperties::Plumes(PlumeProperties {
                        guid: bundle.guid.clone(),
                        title: title.to_string(),
                        horizon_type: tag.to_string(),
                    }),
                ))
            }
            Ok(None) => {
                skip("no polygon ring");
                None
            }
            Err(e) => {
                skip(&e.to_string());
                None
            }
        }
    }
}

fn meta_feature(bundle: &IncidentBundle, title: &str, tag: &str, result: &HorizonResult) -> Feature {
    Feature::new(
        Geometry::point(bundle.lon, bundle.lat),
        FeatureProperties::Meta(MetaProperties {
            guid: bundle.guid.clone(),
            title: title.to_string(),
            horizon_type: tag.to_string(),
            acres: result.acres,
            mix: result.mix,
            stclass: result.stclass,
            frise: result.frise,
            horizon_min: result.horizon_min,
            erate: result.erate,
            hrate: result.hrate,
            wspd: result.wspd,
            wdir: result.wdir,
            wind_degraded: result.wind_degraded,
        }),
    )
}

/// Bundle title, else the snapshot's incident title, else the guid.
fn feature_title(bundle: &IncidentBundle, snapshot: &IncidentSnapshot) -> String {
    bundle
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| {
            snapshot
                .find(&bundle.guid)
                .map(|i| i.title.clone())
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| bundle.guid.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use firesmoke_common::{Incident, Layer};
    use std::collections::BTreeMap;

    fn snapshot(titles: &[(&str, &str)]) -> IncidentSnapshot {
        IncidentSnapshot {
            day: NaiveDate::from_ymd_opt(2025, 5, 11).unwrap(),
            incidents: titles
                .iter()
                .map(|(guid, title)| Incident {
                    guid: guid.to_string(),
                    lat: 30.0,
                    lon: -97.0,
                    title: title.to_string(),
                    description: String::new(),
                    pub_date: String::new(),
                })
                .collect(),
        }
    }

    fn bundle(guid: &str, title: Option<&str>) -> IncidentBundle {
        IncidentBundle {
            guid: guid.into(),
            lat: 30.0,
            lon: -97.0,
            title: title.map(str::to_string),
            horizons: BTreeMap::new(),
        }
    }

    #[test]
    fn test_title_fallbacks() {
        let snap = snapshot(&[("A1", "From feed"), ("B2", "")]);
        assert_eq!(feature_title(&bundle("A1", Some("Stored")), &snap), "Stored");
        assert_eq!(feature_title(&bundle("A1", None), &snap), "From feed");
        assert_eq!(feature_title(&bundle("B2", None), &snap), "B2");
        assert_eq!(feature_title(&bundle("Z9", Some("")), &snap), "Z9");
    }

    #[test]
    fn test_incident_features() {
        let features = incident_features(&snapshot(&[("A1", "a"), ("B2", "b")]));
        assert_eq!(features.len(), 2);
        assert_eq!(features[1].properties.guid(), "B2");
        assert_eq!(features[0].properties.layer(), Layer::Incidents);
        assert_eq!(features[0].geometry, Geometry::point(-97.0, 30.0));
    }
}
