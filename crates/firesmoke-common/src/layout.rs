//! On-disk layout of the artifact store.
//!
//! ```text
//! <root>/<ingest>/FireMap_<day>.json          incident snapshot
//! <root>/<inputs>/<stem>.json                 engine input descriptor
//! <root>/<plumes>/<stem>.kml                  plume artifact
//! <root>/<meta>/FireMap_<day>_<guid>.json     incident bundle
//! <root>/<geojson>/FireSmokeMap_<day>.geojson fused collection
//! ```
//!
//! where `<stem>` is `<day>_<guid>_<ordinal>`.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DataConfig;
use crate::error::FireSmokeResult;
use crate::fsutil::absolute;
use crate::types::file_safe;

const SNAPSHOT_PREFIX: &str = "FireMap_";
const FUSED_PREFIX: &str = "FireSmokeMap_";

#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
    ingest: PathBuf,
    plumes: PathBuf,
    meta: PathBuf,
    inputs: PathBuf,
    geojson: PathBuf,
}

impl DataLayout {
    pub fn new(config: &DataConfig) -> Self {
        let root = config.root.clone();
        Self {
            ingest: root.join(&config.ingest_subdir),
            plumes: root.join(&config.plumes_subdir),
            meta: root.join(&config.meta_subdir),
            inputs: root.join(&config.inputs_subdir),
            geojson: root.join(&config.geojson_subdir),
            root,
        }
    }

    /// Layout with default subdirectory names under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(&DataConfig {
            root: root.into(),
            ..DataConfig::default()
        })
    }

    /// Create every directory of the layout.
    pub fn ensure_dirs(&self) -> FireSmokeResult<()> {
        for dir in [
            &self.root,
            &self.ingest,
            &self.plumes,
            &self.meta,
            &self.inputs,
            &self.geojson,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ingest_dir(&self) -> &Path {
        &self.ingest
    }

    pub fn plumes_dir(&self) -> &Path {
        &self.plumes
    }

    pub fn meta_dir(&self) -> &Path {
        &self.meta
    }

    pub fn inputs_dir(&self) -> &Path {
        &self.inputs
    }

    pub fn geojson_dir(&self) -> &Path {
        &self.geojson
    }

    pub fn snapshot_path(&self, day: NaiveDate) -> PathBuf {
        self.ingest.join(format!("{}{}.json", SNAPSHOT_PREFIX, day))
    }

    pub fn bundle_path(&self, day: NaiveDate, guid: &str) -> PathBuf {
        self.meta
            .join(format!("{}{}_{}.json", SNAPSHOT_PREFIX, day, file_safe(guid)))
    }

    pub fn input_path(&self, stem: &str) -> PathBuf {
        self.inputs.join(format!("{}.json", stem))
    }

    pub fn plume_path(&self, stem: &str) -> PathBuf {
        self.plumes.join(format!("{}.kml", stem))
    }

    pub fn fused_path(&self, day: NaiveDate) -> PathBuf {
        self.geojson.join(format!("{}{}.geojson", FUSED_PREFIX, day))
    }

    /// Path relative to the data root, with `/` separators.
    ///
    /// A relative root and an absolute path (or the reverse) are compared
    /// against the current directory.
    pub fn relative(&self, path: &Path) -> String {
        let rel = match path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => match (absolute(path), absolute(&self.root)) {
                (Ok(path), Ok(root)) => match path.strip_prefix(&root) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => path,
                },
                _ => path.to_path_buf(),
            },
        };
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Resolve a path stored relative to the data root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let rel = Path::new(relative);
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            relative
                .split('/')
                .filter(|part| !part.is_empty())
                .fold(self.root.clone(), |acc, part| acc.join(part))
        }
    }

    /// Bundle files of one day, sorted by file name.
    pub fn bundle_files(&self, day: NaiveDate) -> FireSmokeResult<Vec<PathBuf>> {
        let prefix = format!("{}{}_", SNAPSHOT_PREFIX, day);
        list_files(&self.meta, |name| {
            name.starts_with(&prefix) && name.ends_with(".json")
        })
    }

    /// Plume artifacts of one day, sorted by file name.
    pub fn plume_files(&self, day: NaiveDate) -> FireSmokeResult<Vec<PathBuf>> {
        let prefix = format!("{}_", day);
        list_files(&self.plumes, |name| {
            name.starts_with(&prefix) && name.ends_with(".kml")
        })
    }

    /// Plume artifacts of one incident, sorted by horizon ordinal.
    ///
    /// Only `<day>_<guid>_<ordinal>.kml` matches, so a guid that extends
    /// another one (`A1` and `A1_2`) never picks up the other's files.
    pub fn incident_plume_files(&self, day: NaiveDate, guid: &str) -> FireSmokeResult<Vec<PathBuf>> {
        let prefix = format!("{}_{}_", day, file_safe(guid));
        list_files(&self.plumes, |name| {
            name.strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".kml"))
                .is_some_and(|ordinal| {
                    !ordinal.is_empty() && ordinal.bytes().all(|b| b.is_ascii_digit())
                })
        })
    }

    /// Days with an incident snapshot on disk, ascending.
    pub fn available_days(&self) -> FireSmokeResult<Vec<NaiveDate>> {
        let files = list_files(&self.ingest, |name| {
            name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(".json")
        })?;

        let mut days: Vec<NaiveDate> = files
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()))
            .filter_map(|stem| stem.strip_prefix(SNAPSHOT_PREFIX))
            .filter_map(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .collect();
        days.sort();
        days.dedup();
        Ok(days)
    }

    /// Most recent day with a snapshot on disk.
    pub fn latest_day(&self) -> FireSmokeResult<Option<NaiveDate>> {
        Ok(self.available_days()?.pop())
    }
}

fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> FireSmokeResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if keep(name) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_file_names() {
        let layout = DataLayout::with_root("/data");
        assert_eq!(
            layout.snapshot_path(day(11)),
            PathBuf::from("/data/ingested_fire_incident_maps/FireMap_2025-05-11.json")
        );
        assert_eq!(
            layout.bundle_path(day(11), "A1"),
            PathBuf::from("/data/meta/FireMap_2025-05-11_A1.json")
        );
        assert_eq!(
            layout.plume_path("2025-05-11_A1_2"),
            PathBuf::from("/data/plumes/2025-05-11_A1_2.kml")
        );
        assert_eq!(
            layout.fused_path(day(11)),
            PathBuf::from("/data/geojson/FireSmokeMap_2025-05-11.geojson")
        );
    }

    #[test]
    fn test_relative_and_resolve_roundtrip() {
        let layout = DataLayout::with_root("/data");
        let path = layout.plume_path("2025-05-11_A1_1");
        let rel = layout.relative(&path);
        assert_eq!(rel, "plumes/2025-05-11_A1_1.kml");
        assert_eq!(layout.resolve(&rel), path);
    }

    #[test]
    fn test_relative_with_relative_root() {
        let layout = DataLayout::with_root("data");
        let cwd = std::env::current_dir().unwrap();

        let absolute = cwd.join("data").join("plumes").join("2025-05-11_A1_1.kml");
        assert_eq!(layout.relative(&absolute), "plumes/2025-05-11_A1_1.kml");
        assert_eq!(
            layout.relative(&layout.plume_path("2025-05-11_A1_1")),
            "plumes/2025-05-11_A1_1.kml"
        );
    }

    #[test]
    fn test_incident_plumes_ignore_longer_guid() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::with_root(dir.path());
        layout.ensure_dirs().unwrap();

        for stem in ["2025-05-11_A1_2_1", "2025-05-11_A1_2_2", "2025-05-11_A1_3"] {
            fs::write(layout.plume_path(stem), "<kml/>").unwrap();
        }

        let a1 = layout.incident_plume_files(day(11), "A1").unwrap();
        assert_eq!(a1, vec![layout.plume_path("2025-05-11_A1_3")]);

        let a1_2 = layout.incident_plume_files(day(11), "A1_2").unwrap();
        assert_eq!(a1_2.len(), 2);
        assert!(layout.incident_plume_files(day(11), "A").unwrap().is_empty());
    }

    #[test]
    fn test_available_days_and_bundle_listing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::with_root(dir.path());
        layout.ensure_dirs().unwrap();

        for d in [11, 9, 10] {
            fs::write(layout.snapshot_path(day(d)), "{}").unwrap();
        }
        fs::write(layout.ingest_dir().join("notes.txt"), "x").unwrap();
        fs::write(layout.bundle_path(day(11), "B2"), "{}").unwrap();
        fs::write(layout.bundle_path(day(11), "A1"), "{}").unwrap();
        fs::write(layout.bundle_path(day(10), "A1"), "{}").unwrap();

        assert_eq!(layout.available_days().unwrap(), vec![day(9), day(10), day(11)]);
        assert_eq!(layout.latest_day().unwrap(), Some(day(11)));

        let bundles = layout.bundle_files(day(11)).unwrap();
        assert_eq!(bundles.len(), 2);
        assert!(bundles[0].ends_with("FireMap_2025-05-11_A1.json"));
    }

    #[test]
    fn test_missing_dirs_list_empty() {
        let layout = DataLayout::with_root("/nonexistent/firesmoke");
        assert!(layout.available_days().unwrap().is_empty());
        assert_eq!(layout.latest_day().unwrap(), None);
        assert!(layout.plume_files(day(11)).unwrap().is_empty());
    }
}
