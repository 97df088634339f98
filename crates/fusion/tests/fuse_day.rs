//! End-to-end fusion over a populated data root.

use firesmoke_common::{FeatureProperties, Geometry, Layer, WindObservation};
use fusion::error::FusionError;
use fusion::{FusionOutput, LayerFusion};
use test_utils::fixtures::scenario;
use test_utils::{prepared_layout, temp_test_dir, write_bundle, write_snapshot, TestIncident};

const WIND: WindObservation = WindObservation { wspd: 4, wdir: 180, degraded: false };

#[test]
fn test_feature_counts_and_order() {
    let dir = temp_test_dir();
    let layout = prepared_layout(dir.path());
    let day = scenario::day();
    let a = TestIncident::new("A1", 30.30, -97.73);
    let b = TestIncident::new("B2", 30.10, -97.90);

    write_snapshot(&layout, day, &[a.clone(), b.clone()]);
    write_bundle(&layout, day, &b, WIND);
    write_bundle(&layout, day, &a, WIND);

    let fc = LayerFusion::new(layout).build(day).unwrap();
    assert_eq!(fc.title, "FireSmokeMap_2025-05-11");
    assert_eq!(fc.features.len(), 2 + 6 + 6);

    let layers: Vec<Layer> = fc.features.iter().map(|f| f.properties.layer()).collect();
    assert!(layers[..2].iter().all(|l| *l == Layer::Incidents));
    assert!(layers[2..8].iter().all(|l| *l == Layer::Plumes));
    assert!(layers[8..].iter().all(|l| *l == Layer::Meta));

    // Snapshot order by incident, catalog order by horizon.
    let plumes: Vec<(String, String)> = fc
        .layer(Layer::Plumes)
        .map(|f| match &f.properties {
            FeatureProperties::Plumes(p) => (p.guid.clone(), p.horizon_type.clone()),
            other => panic!("unexpected properties {:?}", other),
        })
        .collect();
    assert_eq!(plumes[0], ("A1".to_string(), "0.5h".to_string()));
    assert_eq!(plumes[2].0, "A1");
    assert_eq!(plumes[3].0, "B2");

    let first_plume = fc.layer(Layer::Plumes).next().unwrap();
    assert_eq!(first_plume.geometry, Geometry::polygon(a.plume_ring(1)));
}

#[test]
fn test_missing_artifact_skips_only_that_plume() {
    let dir = temp_test_dir();
    let layout = prepared_layout(dir.path());
    let day = scenario::day();
    let a = TestIncident::new("A1", 30.30, -97.73);

    write_snapshot(&layout, day, &[a.clone()]);
    write_bundle(&layout, day, &a, WIND);
    std::fs::remove_file(layout.plume_path("2025-05-11_A1_2")).unwrap();

    let fc = LayerFusion::new(layout).build(day).unwrap();
    assert_eq!(fc.layer(Layer::Plumes).count(), 2);
    assert_eq!(fc.layer(Layer::Meta).count(), 3);
}

#[test]
fn test_incomplete_bundle_is_an_error() {
    let dir = temp_test_dir();
    let layout = prepared_layout(dir.path());
    let day = scenario::day();
    let a = TestIncident::new("A1", 30.30, -97.73);

    write_snapshot(&layout, day, &[a.clone()]);
    let mut bundle = write_bundle(&layout, day, &a, WIND);
    bundle.horizons.remove("2.5h");
    let path = layout.bundle_path(day, "A1");
    std::fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();

    match LayerFusion::new(layout).build(day) {
        Err(FusionError::IncompleteBundle { missing, .. }) => assert_eq!(missing, vec!["2.5h"]),
        other => panic!("expected incomplete bundle, got {:?}", other),
    }
}

#[test]
fn test_day_without_bundles_has_only_incidents() {
    let dir = temp_test_dir();
    let layout = prepared_layout(dir.path());
    let day = scenario::day();

    write_snapshot(&layout, day, &[TestIncident::new("A1", 30.30, -97.73)]);

    let fc = LayerFusion::new(layout).build(day).unwrap();
    assert_eq!(fc.features.len(), 1);
    assert_eq!(fc.features[0].properties.layer(), Layer::Incidents);
}

#[test]
fn test_persist_writes_collection() {
    let dir = temp_test_dir();
    let layout = prepared_layout(dir.path());
    let day = scenario::day();
    let a = TestIncident::new("A1", 30.30, -97.73);

    write_snapshot(&layout, day, &[a.clone()]);
    write_bundle(&layout, day, &a, WIND);

    let fusion = LayerFusion::new(layout.clone());
    let path = match fusion.fuse(day, true).unwrap() {
        FusionOutput::Persisted(path) => path,
        other => panic!("expected a persisted collection, got {:?}", other),
    };
    assert_eq!(path, layout.fused_path(day));

    let written: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(written["type"], "FeatureCollection");
    assert_eq!(written["features"].as_array().unwrap().len(), 7);

    assert!(matches!(fusion.fuse(day, false).unwrap(), FusionOutput::Collection(fc) if fc.features.len() == 7));
}

#[test]
fn test_missing_snapshot_is_not_found() {
    let dir = temp_test_dir();
    let layout = prepared_layout(dir.path());

    let err = LayerFusion::new(layout).build(scenario::day()).unwrap_err();
    assert_eq!(err.http_status_code(), 404);
}
