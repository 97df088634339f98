//! Dispersion engine abstraction and the VSmoke adapter.

use async_trait::async_trait;
use chrono::NaiveDate;
use firesmoke_common::config::VsmokeConfig;
use firesmoke_common::fsutil::{absolute, write_json_atomic};
use firesmoke_common::{horizon_stem, DataLayout, EmissionParams, HorizonSpec, Incident, WindObservation};
use metrics::histogram;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{EngineError, EngineStep};

/// Everything the engine needs for one (incident, horizon) run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonInput {
    /// `<day>_<guid>_<ordinal>`; also names the produced artifact
    pub stem: String,
    pub name: String,
    pub guid: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(flatten)]
    pub emission: EmissionParams,
    pub horizon_min: u32,
    #[serde(flatten)]
    pub wind: WindObservation,
}

impl HorizonInput {
    pub fn new(day: NaiveDate, incident: &Incident, spec: &HorizonSpec, wind: WindObservation) -> Self {
        let stem = horizon_stem(day, &incident.guid, spec.ordinal);
        Self {
            name: stem.clone(),
            stem,
            guid: incident.guid.clone(),
            lat: incident.lat,
            lon: incident.lon,
            emission: spec.emission,
            horizon_min: spec.minutes,
            wind,
        }
    }
}

/// A dispersion model run: input descriptor in, polygon artifact out.
#[async_trait]
pub trait SimulationEngine: Send + Sync {
    /// Run the model for one horizon and return the path of the produced artifact.
    async fn run(&self, input: &HorizonInput) -> Result<PathBuf, EngineError>;
}

/// Runs the VSmoke solver, then the KML converter, as local processes.
///
/// The descriptor is written to `inputs/<stem>.json`. The converter writes
/// `plumes/<stem>.kml.part`, which is renamed to `plumes/<stem>.kml` only
/// after both steps succeed.
///
/// The solver keeps fixed scratch files in its working directory, so runs
/// of one engine hold `workdir_lock` across both steps. Concurrent callers
/// still overlap on weather lookups and descriptor writes.
pub struct VsmokeEngine {
    layout: DataLayout,
    exe: PathBuf,
    launcher: Option<String>,
    solver_args: Vec<String>,
    converter: Vec<String>,
    converter_env: HashMap<String, String>,
    workdir: PathBuf,
    workdir_lock: Mutex<()>,
    timeout: Duration,
}

impl VsmokeEngine {
    pub fn new(config: &VsmokeConfig, layout: DataLayout) -> Result<Self, EngineError> {
        Ok(Self {
            layout,
            exe: absolute(&config.exe)?,
            launcher: config.launcher.clone(),
            solver_args: config.solver_args.clone(),
            converter: config.converter.clone(),
            converter_env: config.converter_env.clone(),
            workdir: absolute(&config.working_dir())?,
            workdir_lock: Mutex::new(()),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn solver_command(&self, vars: &Placeholders) -> Command {
        let exe = self.exe.to_string_lossy().into_owned();
        let mut cmd = match &self.launcher {
            Some(launcher) => {
                let mut cmd = Command::new(launcher);
                cmd.arg(&exe);
                cmd
            }
            None => Command::new(&exe),
        };
        cmd.args(self.solver_args.iter().map(|a| vars.apply(a)));
        cmd
    }

    fn converter_command(&self, vars: &Placeholders) -> Result<Command, EngineError> {
        let Some((program, args)) = self.converter.split_first() else {
            return Err(EngineError::Spawn {
                step: EngineStep::Converter,
                program: "converter".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "converter command is empty",
                ),
            });
        };
        let mut cmd = Command::new(program);
        cmd.args(args.iter().map(|a| vars.apply(a)));
        cmd.envs(&self.converter_env);
        Ok(cmd)
    }

    async fn run_step(&self, step: EngineStep, mut cmd: Command) -> Result<Output, EngineError> {
        cmd.current_dir(&self.workdir)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);

        let program = format!("{:?}", cmd.as_std().get_program());
        debug!(step = %step, program = %program, "Starting engine step");

        let started = Instant::now();
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| EngineError::Spawn { step, program, source })?,
            Err(_) => {
                return Err(EngineError::Timeout {
                    step,
                    secs: self.timeout.as_secs(),
                })
            }
        };
        histogram!("firesmoke_engine_duration_seconds", "step" => step.to_string())
            .record(started.elapsed().as_secs_f64());

        if output.status.success() {
            return Ok(output);
        }

        let code = output.status.code();
        let text = combined_output(&output);
        Err(match step {
            EngineStep::Solver => EngineError::SolverFailed { code, output: text },
            EngineStep::Converter => EngineError::ConverterFailed { code, output: text },
        })
    }
}

#[async_trait]
impl SimulationEngine for VsmokeEngine {
    #[instrument(skip(self, input), fields(stem = %input.stem))]
    async fn run(&self, input: &HorizonInput) -> Result<PathBuf, EngineError> {
        let plume = self.layout.plume_path(&input.stem);
        let input_path = absolute(&self.layout.input_path(&input.stem))?;
        let artifact = absolute(&plume)?;
        let partial = partial_path(&artifact);

        write_json_atomic(&input_path, input)?;
        if let Some(dir) = artifact.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let vars = Placeholders {
            input: input_path.to_string_lossy().into_owned(),
            output: partial.to_string_lossy().into_owned(),
            stem: input.stem.clone(),
        };

        let result = async {
            let _workdir = self.workdir_lock.lock().await;
            self.run_step(EngineStep::Solver, self.solver_command(&vars)).await?;
            self.run_step(EngineStep::Converter, self.converter_command(&vars)?)
                .await?;

            if !tokio::fs::try_exists(&partial).await? {
                return Err(EngineError::MissingArtifact(partial.clone()));
            }
            tokio::fs::rename(&partial, &artifact).await?;
            Ok::<(), EngineError>(())
        }
        .await;

        match result {
            Ok(()) => {
                info!(artifact = %plume.display(), "Engine produced plume artifact");
                Ok(plume)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial artifact");
                    }
                }
                debug!(error = %e, "Engine run failed");
                Err(e)
            }
        }
    }
}

struct Placeholders {
    input: String,
    output: String,
    stem: String,
}

impl Placeholders {
    fn apply(&self, arg: &str) -> String {
        arg.replace("{input}", &self.input)
            .replace("{output}", &self.output)
            .replace("{stem}", &self.stem)
    }
}

fn partial_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    [stdout.trim(), stderr.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use firesmoke_common::config::EmissionConfig;
    use firesmoke_common::horizon_catalog;

    fn incident() -> Incident {
        Incident {
            guid: "A1".into(),
            lat: 30.30,
            lon: -97.73,
            title: "Grass fire".into(),
            description: String::new(),
            pub_date: String::new(),
        }
    }

    #[test]
    fn test_input_descriptor_shape() {
        let day = NaiveDate::from_ymd_opt(2025, 5, 11).unwrap();
        let spec = &horizon_catalog(&EmissionConfig::default())[1];
        let wind = WindObservation { wspd: 4, wdir: 180, degraded: false };

        let input = HorizonInput::new(day, &incident(), spec, wind);
        assert_eq!(input.stem, "2025-05-11_A1_2");
        assert_eq!(input.name, input.stem);

        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["horizon_min"], 90);
        assert_eq!(value["erate"], 4.77);
        assert_eq!(value["wspd"], 4);
        assert_eq!(value["wdir"], 180);
        assert_eq!(value["stclass"], 4);
    }

    #[test]
    fn test_placeholders() {
        let vars = Placeholders {
            input: "/d/in.json".into(),
            output: "/d/out.kml.part".into(),
            stem: "s".into(),
        };
        assert_eq!(vars.apply("--input={input}"), "--input=/d/in.json");
        assert_eq!(vars.apply("{output}"), "/d/out.kml.part");
        assert_eq!(vars.apply("{stem}.log"), "s.log");
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/data/plumes/x_1.kml")),
            PathBuf::from("/data/plumes/x_1.kml.part")
        );
    }
}
