//! Stage wiring for the daily pipeline.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use dispersion::{HorizonOrchestrator, NwsClient, RunReport, SimulationEngine, VsmokeEngine, WindResolver};
use firesmoke_common::{DataLayout, DaySelector, FireSmokeConfig, IncidentSnapshot};
use fusion::{FusionOutput, LayerFusion};
use ingestion::{FeedSource, IngestionCache, Resolution, RssFeedSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one `run` produced.
#[derive(Debug)]
pub struct RunSummary {
    pub snapshot: Resolution,
    pub report: RunReport,
    pub fused: FusionOutput,
}

impl RunSummary {
    /// Paths written or reused by this run, in stage order.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.snapshot.path.clone()];
        paths.extend(self.report.bundle_paths().into_iter().cloned());
        if let FusionOutput::Persisted(path) = &self.fused {
            paths.push(path.clone());
        }
        paths
    }
}

/// Ingestion, simulation and fusion over one data root.
pub struct Pipeline {
    layout: DataLayout,
    cache: IngestionCache,
    orchestrator: HorizonOrchestrator,
    fusion: LayerFusion,
}

impl Pipeline {
    /// Wire the production components: RSS feed, NWS wind and VSmoke.
    pub fn from_config(config: &FireSmokeConfig) -> Result<Self> {
        let layout = DataLayout::new(&config.data);
        let source = RssFeedSource::new(&config.ingest).context("Failed to create incident feed source")?;
        let lookup = NwsClient::new(&config.weather).context("Failed to create NWS client")?;
        let engine = VsmokeEngine::new(&config.vsmoke, layout.clone())
            .context("Failed to configure VSmoke engine")?;

        Ok(Self::with_components(
            config,
            layout,
            Arc::new(source),
            WindResolver::new(Arc::new(lookup)),
            Arc::new(engine),
        ))
    }

    pub fn with_components(
        config: &FireSmokeConfig,
        layout: DataLayout,
        source: Arc<dyn FeedSource>,
        wind: WindResolver,
        engine: Arc<dyn SimulationEngine>,
    ) -> Self {
        Self {
            cache: IngestionCache::new(layout.clone(), source),
            orchestrator: HorizonOrchestrator::new(config, layout.clone(), wind, engine),
            fusion: LayerFusion::new(layout.clone()),
            layout,
        }
    }

    /// Fetch or reuse the snapshot of `day` (today when `None`).
    pub async fn ingest(&self, day: Option<NaiveDate>) -> Result<Resolution> {
        self.layout.ensure_dirs()?;
        let resolution = self.cache.resolve(day).await.context("Incident ingestion failed")?;
        info!(
            day = %resolution.day,
            path = %resolution.path.display(),
            fetched = resolution.fetched,
            "Snapshot ready"
        );
        Ok(resolution)
    }

    /// Resolve the snapshot once, then simulate every incident in it.
    pub async fn simulate(&self, day: Option<NaiveDate>) -> Result<(Resolution, RunReport)> {
        let resolution = self.ingest(day).await?;
        let snapshot = IncidentSnapshot::load(&resolution.path, resolution.day)
            .with_context(|| format!("Failed to load snapshot {}", resolution.path.display()))?;
        let report = self.orchestrator.run_snapshot(&snapshot).await;

        for incident in report.incidents.iter().filter(|i| !i.is_complete()) {
            for horizon in incident.failed_horizons() {
                warn!(guid = %incident.guid, horizon = horizon.tag, outcome = ?horizon.outcome, "Horizon failed");
            }
        }
        Ok((resolution, report))
    }

    pub fn fuse(&self, day: DaySelector, save: bool) -> Result<FusionOutput> {
        fuse(&self.layout, day, save)
    }

    /// Ingest, simulate and fuse one day. Fusion runs even when some
    /// incidents failed; their features are simply absent.
    pub async fn run(&self, day: Option<NaiveDate>, save: bool) -> Result<RunSummary> {
        let (snapshot, report) = self.simulate(day).await?;
        let fused = self
            .fusion
            .fuse(snapshot.day, save)
            .with_context(|| format!("Fusion failed for {}", snapshot.day))?;
        Ok(RunSummary { snapshot, report, fused })
    }
}

/// Fuse one day without wiring the upstream stages.
pub fn fuse(layout: &DataLayout, day: DaySelector, save: bool) -> Result<FusionOutput> {
    let day = day.resolve(layout)?;
    LayerFusion::new(layout.clone())
        .fuse(day, save)
        .with_context(|| format!("Fusion failed for {}", day))
}
