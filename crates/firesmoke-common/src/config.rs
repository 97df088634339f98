//! Configuration loader for firesmoke.
//!
//! One YAML file (`config.yaml`) holds every tunable of the pipeline. It is
//! parsed once at process start into a [`FireSmokeConfig`] value which is then
//! passed by reference into each component constructor.
//!
//! Supports environment variable substitution using ${VAR} syntax.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FireSmokeConfig {
    pub data: DataConfig,
    pub ingest: IngestConfig,
    pub weather: WeatherConfig,
    pub vsmoke: VsmokeConfig,
    pub geojson: GeoJsonConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Locations of the file-backed artifact store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root data directory; relative artifact paths are resolved against it
    pub root: PathBuf,
    pub ingest_subdir: String,
    pub plumes_subdir: String,
    pub meta_subdir: String,
    pub inputs_subdir: String,
    pub geojson_subdir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            ingest_subdir: "ingested_fire_incident_maps".to_string(),
            plumes_subdir: "plumes".to_string(),
            meta_subdir: "meta".to_string(),
            inputs_subdir: "vsmoke_inputs".to_string(),
            geojson_subdir: "geojson".to_string(),
        }
    }
}

/// Incident feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub rss_url: String,
    pub timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            rss_url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Point-forecast (NWS) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Points endpoint template with `{lat}` and `{lon}` placeholders
    pub points_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            points_url: "https://api.weather.gov/points/{lat},{lon}".to_string(),
            user_agent: "firesmoke-digital-twin".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Dispersion engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VsmokeConfig {
    /// Solver executable
    pub exe: PathBuf,
    /// Optional launcher the solver is run through (e.g. `wine`)
    pub launcher: Option<String>,
    /// Extra solver arguments; `{input}`, `{output}` and `{stem}` are substituted
    pub solver_args: Vec<String>,
    /// Working directory for both steps; defaults to the solver's directory
    pub workdir: Option<PathBuf>,
    /// Converter command line; first element is the program
    pub converter: Vec<String>,
    /// Extra environment for the converter
    pub converter_env: HashMap<String, String>,
    /// Per-step timeout in seconds
    pub timeout_secs: u64,
    /// Incidents simulated concurrently
    pub parallel_incidents: usize,
    pub emission: EmissionConfig,
}

impl Default for VsmokeConfig {
    fn default() -> Self {
        Self {
            exe: PathBuf::from("vsmoke_bin/VSMKARC.EXE"),
            launcher: None,
            solver_args: Vec::new(),
            workdir: None,
            converter: vec![
                "python3".to_string(),
                "-m".to_string(),
                "runvsmoke".to_string(),
                "--input".to_string(),
                "{input}".to_string(),
                "--output".to_string(),
                "{output}".to_string(),
            ],
            converter_env: HashMap::new(),
            timeout_secs: 300,
            parallel_incidents: 1,
            emission: EmissionConfig::default(),
        }
    }
}

impl VsmokeConfig {
    /// Directory both engine steps run in.
    pub fn working_dir(&self) -> PathBuf {
        match &self.workdir {
            Some(dir) => dir.clone(),
            None => self
                .exe
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Emission parameters shared by every horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionConfig {
    pub acres_default: f64,
    pub mix_height_ft: f64,
    pub stability_class: u8,
    pub plume_rise_fraction: f64,
    pub emission_rate: f64,
    pub heat_rate: f64,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            acres_default: 10.0,
            mix_height_ft: 1500.0,
            stability_class: 4,
            plume_rise_fraction: 0.6,
            emission_rate: 4.77,
            heat_rate: 5.18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoJsonConfig {
    /// Default for the pipeline's `--save` flag
    pub save_to_disk: bool,
}

impl Default for GeoJsonConfig {
    fn default() -> Self {
        Self { save_to_disk: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl FireSmokeConfig {
    /// Load and validate configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from YAML text (after env expansion).
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: FireSmokeConfig = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.data.root.as_os_str().is_empty(),
            "data.root cannot be empty"
        );
        anyhow::ensure!(
            !self.vsmoke.converter.is_empty(),
            "vsmoke.converter must name a program"
        );
        anyhow::ensure!(
            self.vsmoke.timeout_secs > 0,
            "vsmoke.timeout_secs must be greater than 0"
        );
        anyhow::ensure!(
            self.vsmoke.parallel_incidents > 0,
            "vsmoke.parallel_incidents must be greater than 0"
        );
        anyhow::ensure!(
            (1..=7).contains(&self.vsmoke.emission.stability_class),
            "vsmoke.emission.stability_class must be between 1 and 7"
        );
        anyhow::ensure!(
            self.weather.points_url.contains("{lat}") && self.weather.points_url.contains("{lon}"),
            "weather.points_url must contain {{lat}} and {{lon}} placeholders"
        );
        Ok(())
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("FIRESMOKE_TEST_ROOT", "/srv/firesmoke");
        let result = expand_env_vars("root: ${FIRESMOKE_TEST_ROOT}/data").unwrap();
        assert_eq!(result, "root: /srv/firesmoke/data");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let result = expand_env_vars("value_${FIRESMOKE_UNSET_VAR:-fallback}_end").unwrap();
        assert_eq!(result, "value_fallback_end");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        assert!(expand_env_vars("${FIRESMOKE_REQUIRED_BUT_UNSET}").is_err());
    }

    #[test]
    fn test_expand_env_vars_unclosed() {
        assert!(expand_env_vars("${OPEN").is_err());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = FireSmokeConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.data.root, PathBuf::from("data"));
        assert_eq!(config.vsmoke.timeout_secs, 300);
        assert_eq!(config.vsmoke.emission.emission_rate, 4.77);
        assert_eq!(config.vsmoke.emission.heat_rate, 5.18);
        assert!(config.geojson.save_to_disk);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let yaml = r#"
data:
  root: /var/lib/firesmoke
vsmoke:
  launcher: wine
  emission:
    acres_default: 25.0
"#;
        let config = FireSmokeConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.data.root, PathBuf::from("/var/lib/firesmoke"));
        assert_eq!(config.data.plumes_subdir, "plumes");
        assert_eq!(config.vsmoke.launcher.as_deref(), Some("wine"));
        assert_eq!(config.vsmoke.emission.acres_default, 25.0);
        assert_eq!(config.vsmoke.emission.stability_class, 4);
    }

    #[test]
    fn test_shipped_config_parses() {
        let yaml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../config.yaml"));
        let config = FireSmokeConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.vsmoke.converter[0], "python3");
        assert_eq!(config.vsmoke.parallel_incidents, 1);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_validation_rejects_bad_stability_class() {
        let yaml = "vsmoke:\n  emission:\n    stability_class: 9\n";
        assert!(FireSmokeConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_working_dir_defaults_to_exe_parent() {
        let mut vsmoke = VsmokeConfig::default();
        assert_eq!(vsmoke.working_dir(), PathBuf::from("vsmoke_bin"));

        vsmoke.workdir = Some(PathBuf::from("/opt/vsmoke"));
        assert_eq!(vsmoke.working_dir(), PathBuf::from("/opt/vsmoke"));
    }
}
