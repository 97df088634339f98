//! Per-day incident snapshot cache.
//!
//! A snapshot for today is always refetched and replaced. A snapshot for any
//! other day is fetched only when absent and never touched again. The feed
//! document is validated as a snapshot before it is written, and the write is
//! atomic, so a bad response never lands on disk.

use chrono::{Local, NaiveDate};
use firesmoke_common::fsutil::write_json_atomic;
use firesmoke_common::{DataLayout, IncidentSnapshot};
use metrics::counter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::feed::FeedSource;

/// Where a day's snapshot lives and whether this call fetched it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub day: NaiveDate,
    pub path: PathBuf,
    pub fetched: bool,
}

pub struct IngestionCache {
    layout: DataLayout,
    source: Arc<dyn FeedSource>,
}

impl IngestionCache {
    pub fn new(layout: DataLayout, source: Arc<dyn FeedSource>) -> Self {
        Self { layout, source }
    }

    /// Resolve `day` (today when `None`) against the local calendar date.
    pub async fn resolve(&self, day: Option<NaiveDate>) -> Result<Resolution> {
        let today = Local::now().date_naive();
        self.resolve_at(day.unwrap_or(today), today).await
    }

    /// Resolve `day` given what "today" is.
    #[instrument(skip(self), fields(day = %day))]
    pub async fn resolve_at(&self, day: NaiveDate, today: NaiveDate) -> Result<Resolution> {
        let path = self.layout.snapshot_path(day);

        if day != today && path.exists() {
            debug!(path = %path.display(), "Reusing archived snapshot");
            counter!("firesmoke_feed_fetches_total", "outcome" => "reused").increment(1);
            return Ok(Resolution {
                day,
                path,
                fetched: false,
            });
        }

        let document = match self.source.fetch().await {
            Ok(document) => document,
            Err(e) => {
                counter!("firesmoke_feed_fetches_total", "outcome" => "failed").increment(1);
                warn!(error = %e, "Incident feed fetch failed");
                return Err(e);
            }
        };

        // Validate fully before anything touches the target path.
        let snapshot = IncidentSnapshot::from_feed(day, &document)?;
        write_json_atomic(&path, &document)?;

        counter!("firesmoke_feed_fetches_total", "outcome" => "fetched").increment(1);
        info!(
            path = %path.display(),
            incidents = snapshot.incidents.len(),
            "Wrote incident snapshot"
        );

        Ok(Resolution {
            day,
            path,
            fetched: true,
        })
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_utils::fixtures::feed;
    use test_utils::{prepared_layout, temp_test_dir};

    use crate::error::IngestionError;

    struct CountingSource {
        calls: AtomicUsize,
        document: Value,
    }

    impl CountingSource {
        fn new(document: Value) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                document,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedSource for CountingSource {
        async fn fetch(&self) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.document.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl FeedSource for FailingSource {
        async fn fetch(&self) -> Result<Value> {
            Err(IngestionError::UpstreamStatus {
                status: 503,
                url: "http://feed.invalid".into(),
            })
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn one_incident() -> Value {
        feed::document(vec![feed::item("A1", "Grass fire", 30.30, -97.73)])
    }

    #[tokio::test]
    async fn test_past_day_is_fetched_once() {
        let dir = temp_test_dir();
        let source = CountingSource::new(one_incident());
        let cache = IngestionCache::new(prepared_layout(dir.path()), source.clone());

        let first = cache.resolve_at(day(10), day(11)).await.unwrap();
        let second = cache.resolve_at(day(10), day(11)).await.unwrap();

        assert!(first.fetched);
        assert!(!second.fetched);
        assert_eq!(first.path, second.path);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_today_is_always_refetched() {
        let dir = temp_test_dir();
        let source = CountingSource::new(one_incident());
        let cache = IngestionCache::new(prepared_layout(dir.path()), source.clone());

        cache.resolve_at(day(11), day(11)).await.unwrap();
        let again = cache.resolve_at(day(11), day(11)).await.unwrap();

        assert!(again.fetched);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_document_is_not_written() {
        let dir = temp_test_dir();
        let layout = prepared_layout(dir.path());
        let source = CountingSource::new(json!({"html": {"body": "maintenance"}}));
        let cache = IngestionCache::new(layout.clone(), source);

        let err = cache.resolve_at(day(10), day(11)).await.unwrap_err();
        assert!(matches!(err, IngestionError::Data(_)));
        assert!(!layout.snapshot_path(day(10)).exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_snapshot() {
        let dir = temp_test_dir();
        let layout = prepared_layout(dir.path());
        std::fs::write(layout.snapshot_path(day(11)), one_incident().to_string()).unwrap();

        let cache = IngestionCache::new(layout.clone(), Arc::new(FailingSource));
        let err = cache.resolve_at(day(11), day(11)).await.unwrap_err();

        assert!(matches!(err, IngestionError::UpstreamStatus { status: 503, .. }));
        let kept = IncidentSnapshot::load(&layout.snapshot_path(day(11)), day(11)).unwrap();
        assert_eq!(kept.incidents.len(), 1);
    }
}
