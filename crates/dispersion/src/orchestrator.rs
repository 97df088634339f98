//! Per-incident horizon orchestration.
//!
//! Each incident is simulated at every horizon of the catalog, in catalog
//! order. A horizon moves through `BuildInput → EngineRun → Convert` and ends
//! either resolved or failed; one horizon failing does not stop the others.
//! The incident bundle is written (atomically) only when all horizons
//! resolved, so a bundle on disk is always complete.

use chrono::NaiveDate;
use firesmoke_common::fsutil::write_json_atomic;
use firesmoke_common::{
    horizon_catalog, horizon_stem, DataLayout, FireSmokeConfig, HorizonResult, HorizonSpec,
    Incident, IncidentBundle, IncidentSnapshot,
};
use futures::stream::{self, StreamExt};
use metrics::counter;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::engine::{HorizonInput, SimulationEngine};
use crate::error::{EngineError, EngineStep};
use crate::wind::WindResolver;

/// Where a failed horizon stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizonStage {
    BuildInput,
    EngineRun,
    Convert,
}

impl HorizonStage {
    fn of(error: &EngineError) -> Self {
        match error.step() {
            Some(EngineStep::Solver) => HorizonStage::EngineRun,
            Some(EngineStep::Converter) => HorizonStage::Convert,
            None => HorizonStage::BuildInput,
        }
    }
}

impl fmt::Display for HorizonStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HorizonStage::BuildInput => write!(f, "build_input"),
            HorizonStage::EngineRun => write!(f, "engine_run"),
            HorizonStage::Convert => write!(f, "convert"),
        }
    }
}

/// Terminal state of one horizon.
#[derive(Debug, Clone, PartialEq)]
pub enum HorizonOutcome {
    Resolved(HorizonResult),
    Failed { stage: HorizonStage, error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizonReport {
    pub tag: &'static str,
    pub stem: String,
    pub outcome: HorizonOutcome,
}

impl HorizonReport {
    pub fn is_resolved(&self) -> bool {
        matches!(self.outcome, HorizonOutcome::Resolved(_))
    }
}

/// What happened to an incident's bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum BundleStatus {
    Written(PathBuf),
    /// At least one horizon failed; nothing was written
    Incomplete,
    WriteFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentReport {
    pub guid: String,
    pub horizons: Vec<HorizonReport>,
    pub bundle: BundleStatus,
}

impl IncidentReport {
    pub fn is_complete(&self) -> bool {
        matches!(self.bundle, BundleStatus::Written(_))
    }

    pub fn failed_horizons(&self) -> impl Iterator<Item = &HorizonReport> {
        self.horizons.iter().filter(|h| !h.is_resolved())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub day: NaiveDate,
    pub incidents: Vec<IncidentReport>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.incidents.iter().filter(|i| i.is_complete()).count()
    }

    pub fn failed(&self) -> usize {
        self.incidents.len() - self.completed()
    }

    pub fn bundle_paths(&self) -> Vec<&PathBuf> {
        self.incidents
            .iter()
            .filter_map(|i| match &i.bundle {
                BundleStatus::Written(path) => Some(path),
                _ => None,
            })
            .collect()
    }
}

pub struct HorizonOrchestrator {
    layout: DataLayout,
    catalog: [HorizonSpec; 3],
    wind: WindResolver,
    engine: Arc<dyn SimulationEngine>,
    parallel_incidents: usize,
}

impl HorizonOrchestrator {
    pub fn new(
        config: &FireSmokeConfig,
        layout: DataLayout,
        wind: WindResolver,
        engine: Arc<dyn SimulationEngine>,
    ) -> Self {
        Self {
            layout,
            catalog: horizon_catalog(&config.vsmoke.emission),
            wind,
            engine,
            parallel_incidents: config.vsmoke.parallel_incidents.max(1),
        }
    }

    /// Simulate every incident of a snapshot.
    ///
    /// Up to `parallel_incidents` incidents run at once; the report keeps
    /// snapshot order.
    #[instrument(skip(self, snapshot), fields(day = %snapshot.day, incidents = snapshot.incidents.len()))]
    pub async fn run_snapshot(&self, snapshot: &IncidentSnapshot) -> RunReport {
        if let Err(e) = self.layout.ensure_dirs() {
            warn!(error = %e, "Failed to create data directories");
        }

        let day = snapshot.day;
        let incidents = stream::iter(snapshot.incidents.iter())
            .map(|incident| self.run_incident(day, incident))
            .buffered(self.parallel_incidents)
            .collect::<Vec<_>>()
            .await;

        let report = RunReport { day, incidents };
        info!(
            completed = report.completed(),
            failed = report.failed(),
            "Simulation run finished"
        );
        report
    }

    /// Simulate all horizons of one incident and write its bundle if every
    /// horizon resolved.
    #[instrument(skip(self, incident), fields(guid = %incident.guid))]
    pub async fn run_incident(&self, day: NaiveDate, incident: &Incident) -> IncidentReport {
        let mut horizons = Vec::with_capacity(self.catalog.len());
        for spec in &self.catalog {
            horizons.push(self.run_horizon(day, incident, spec).await);
        }

        let failed: Vec<&'static str> = horizons
            .iter()
            .filter(|h| !h.is_resolved())
            .map(|h| h.tag)
            .collect();

        let bundle = if failed.is_empty() {
            self.write_bundle(day, incident, &horizons)
        } else {
            error!(failed = ?failed, "Incident incomplete, bundle not written");
            BundleStatus::Incomplete
        };

        IncidentReport {
            guid: incident.guid.clone(),
            horizons,
            bundle,
        }
    }

    async fn run_horizon(&self, day: NaiveDate, incident: &Incident, spec: &HorizonSpec) -> HorizonReport {
        let stem = horizon_stem(day, &incident.guid, spec.ordinal);
        let outcome = self.horizon_outcome(day, incident, spec).await;

        match &outcome {
            HorizonOutcome::Resolved(result) => {
                counter!("firesmoke_horizons_total", "outcome" => "resolved").increment(1);
                info!(
                    horizon = spec.tag,
                    stem = %stem,
                    wspd = result.wspd,
                    wdir = result.wdir,
                    wind_degraded = result.wind_degraded,
                    "Horizon resolved"
                );
            }
            HorizonOutcome::Failed { stage, error } => {
                counter!("firesmoke_horizons_total", "outcome" => "failed").increment(1);
                error!(horizon = spec.tag, stem = %stem, stage = %stage, error = %error, "Horizon failed");
            }
        }

        HorizonReport {
            tag: spec.tag,
            stem,
            outcome,
        }
    }

    async fn horizon_outcome(&self, day: NaiveDate, incident: &Incident, spec: &HorizonSpec) -> HorizonOutcome {
        let wind = match self.wind.resolve(incident.lat, incident.lon).await {
            Ok(wind) => wind,
            Err(e) => {
                return HorizonOutcome::Failed {
                    stage: HorizonStage::BuildInput,
                    error: e.to_string(),
                }
            }
        };

        let input = HorizonInput::new(day, incident, spec, wind);
        match self.engine.run(&input).await {
            Ok(artifact) => HorizonOutcome::Resolved(HorizonResult::new(
                spec,
                input.stem.clone(),
                wind,
                self.layout.relative(&artifact),
            )),
            Err(e) => HorizonOutcome::Failed {
                stage: HorizonStage::of(&e),
                error: e.to_string(),
            },
        }
    }

    fn write_bundle(&self, day: NaiveDate, incident: &Incident, horizons: &[HorizonReport]) -> BundleStatus {
        let results: BTreeMap<String, HorizonResult> = horizons
            .iter()
            .filter_map(|h| match &h.outcome {
                HorizonOutcome::Resolved(result) => Some((h.tag.to_string(), result.clone())),
                HorizonOutcome::Failed { .. } => None,
            })
            .collect();

        let bundle = IncidentBundle {
            guid: incident.guid.clone(),
            lat: incident.lat,
            lon: incident.lon,
            title: Some(incident.title.clone()).filter(|t| !t.is_empty()),
            horizons: results,
        };

        let path = self.layout.bundle_path(day, &incident.guid);
        match write_json_atomic(&path, &bundle) {
            Ok(()) => {
                info!(path = %path.display(), "Wrote incident bundle");
                BundleStatus::Written(path)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write incident bundle");
                BundleStatus::WriteFailed(e.to_string())
            }
        }
    }
}
