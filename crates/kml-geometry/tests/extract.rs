//! File-level extraction tests.

use kml_geometry::{extract, GeometryError};
use test_utils::fixtures::kml;
use test_utils::{assert_ring_approx_eq, temp_test_dir};

fn write(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_collection_only_document_returns_polygon_ring() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "collection.kml", kml::COLLECTION_ONLY);

    let ring = extract(&path).unwrap().unwrap();
    assert_eq!(ring, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]);
}

#[test]
fn test_legacy_namespace() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "legacy.kml", kml::KML20_POLYGON);

    let ring = extract(&path).unwrap().unwrap();
    assert_ring_approx_eq!(
        ring,
        vec![[-97.7, 30.3], [-97.6, 30.4], [-97.5, 30.3], [-97.7, 30.3]],
        1e-9
    );
}

#[test]
fn test_broken_document_uses_raw_scan() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "broken.kml", kml::BROKEN_WITH_RING);

    let ring = extract(&path).unwrap().unwrap();
    assert_eq!(ring.len(), 4);
    assert_eq!(ring[0], [1.0, 2.0]);
}

#[test]
fn test_extraction_is_idempotent() {
    let dir = temp_test_dir();
    for (name, body) in [
        ("nested.kml", kml::NESTED_POLYGON),
        ("multi.kml", kml::MULTI_POLYGON),
        ("point.kml", kml::POINT_ONLY),
        ("broken.kml", kml::BROKEN_WITH_RING),
    ] {
        let path = write(dir.path(), name, body);
        let first = extract(&path).unwrap();
        let second = extract(&path).unwrap();
        assert_eq!(first, second, "{} changed between runs", name);
    }
}

#[test]
fn test_no_ring_is_not_an_error() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "point.kml", kml::POINT_ONLY);
    assert_eq!(extract(&path).unwrap(), None);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = temp_test_dir();
    let err = extract(&dir.path().join("absent.kml")).unwrap_err();
    assert!(matches!(err, GeometryError::Io(_)));
}
