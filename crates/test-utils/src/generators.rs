//! Generators that populate a data root with pipeline artifacts.
//!
//! These write the same files the pipeline stages would, so downstream
//! stages can be tested without running upstream ones.

use chrono::NaiveDate;
use firesmoke_common::config::EmissionConfig;
use firesmoke_common::fsutil::write_json_atomic;
use firesmoke_common::{
    horizon_catalog, horizon_stem, DataLayout, HorizonResult, IncidentBundle, Ring,
    WindObservation,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::fixtures;

/// Minimal incident description for generators.
#[derive(Debug, Clone)]
pub struct TestIncident {
    pub guid: String,
    pub title: String,
    pub lat: f64,
    pub lon: f64,
}

impl TestIncident {
    pub fn new(guid: &str, lat: f64, lon: f64) -> Self {
        Self {
            guid: guid.to_string(),
            title: format!("Fire {}", guid),
            lat,
            lon,
        }
    }

    /// A small closed square around the incident, in `[lon, lat]` order.
    pub fn plume_ring(&self, ordinal: u8) -> Ring {
        let d = 0.01 * ordinal as f64;
        vec![
            [self.lon, self.lat],
            [self.lon + d, self.lat],
            [self.lon + d, self.lat + d],
            [self.lon, self.lat],
        ]
    }
}

/// Write the normalised snapshot `FireMap_<day>.json` for `incidents`.
pub fn write_snapshot(layout: &DataLayout, day: NaiveDate, incidents: &[TestIncident]) -> PathBuf {
    let items = incidents
        .iter()
        .map(|i| fixtures::feed::item(&i.guid, &i.title, i.lat, i.lon))
        .collect();
    let path = layout.snapshot_path(day);
    write_json_atomic(&path, &fixtures::feed::document(items)).expect("write snapshot");
    path
}

/// Write the three plume artifacts and the bundle of one incident.
pub fn write_bundle(
    layout: &DataLayout,
    day: NaiveDate,
    incident: &TestIncident,
    wind: WindObservation,
) -> IncidentBundle {
    let mut horizons = BTreeMap::new();
    for spec in horizon_catalog(&EmissionConfig::default()) {
        let stem = horizon_stem(day, &incident.guid, spec.ordinal);
        let kml_path = layout.plume_path(&stem);
        std::fs::create_dir_all(layout.plumes_dir()).expect("create plumes dir");
        std::fs::write(&kml_path, fixtures::kml::polygon_kml(&incident.plume_ring(spec.ordinal)))
            .expect("write plume");

        let kml = layout.relative(&kml_path);
        horizons.insert(
            spec.tag.to_string(),
            HorizonResult::new(&spec, stem, wind, kml),
        );
    }

    let bundle = IncidentBundle {
        guid: incident.guid.clone(),
        lat: incident.lat,
        lon: incident.lon,
        title: Some(incident.title.clone()),
        horizons,
    };
    write_json_atomic(&layout.bundle_path(day, &incident.guid), &bundle).expect("write bundle");
    bundle
}

/// Create a layout under `root` with every directory present.
pub fn prepared_layout(root: &std::path::Path) -> DataLayout {
    let layout = DataLayout::with_root(root);
    layout.ensure_dirs().expect("create layout dirs");
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bundle_populates_all_horizons() {
        let dir = crate::temp_test_dir();
        let layout = prepared_layout(dir.path());
        let day = fixtures::scenario::day();
        let incident = TestIncident::new("A1", 30.3, -97.7);

        write_snapshot(&layout, day, &[incident.clone()]);
        let bundle = write_bundle(
            &layout,
            day,
            &incident,
            WindObservation { wspd: 4, wdir: 180, degraded: false },
        );

        assert!(bundle.missing_horizons().is_empty());
        assert!(layout.plume_path("2025-05-11_A1_3").exists());
        assert_eq!(layout.bundle_files(day).unwrap().len(), 1);
    }
}
