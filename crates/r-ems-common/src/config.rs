//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the core runtime."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::{debug, warn};

use crate::logging::LogFormat;
use crate::time::Timestamp;

fn default_repair_time_h() -> f64 {
    24.0
}

fn default_wind_speed_name() -> String {
    "wind_speed".to_owned()
}

fn default_wind_dir_name() -> String {
    "wind_dir".to_owned()
}

fn default_wind_gust_name() -> String {
    "wind_gust".to_owned()
}

fn default_simulation_start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_577_836_800, 0).unwrap_or_default()
}

fn default_simulation_stop() -> DateTime<Utc> {
    DateTime::from_timestamp(1_577_923_200, 0).unwrap_or_default()
}

fn default_timestep() -> Duration {
    Duration::from_secs(3600)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_file_logging() -> bool {
    true
}

/// Primary configuration object for the structures simulation runtime.
///
/// Built once at process start and handed by reference to every pole, so
/// none of these knobs can change while a run is in progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub structures: StructuresConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "R_EMS_CONFIG";

    /// Load configuration from disk, respecting the `R_EMS_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.structures.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Process-wide knobs for the pole structures model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuresConfig {
    /// Repair delay in hours used when neither the pole nor its configuration supply one.
    #[serde(default = "default_repair_time_h")]
    pub default_repair_time_h: f64,
    /// Weather field bound to the pole wind speed.
    #[serde(default = "default_wind_speed_name")]
    pub wind_speed_name: String,
    /// Weather field bound to the pole wind direction.
    #[serde(default = "default_wind_dir_name")]
    pub wind_dir_name: String,
    /// Weather field bound to the pole wind gusts.
    #[serde(default = "default_wind_gust_name")]
    pub wind_gust_name: String,
    /// Halt the whole simulation as soon as any pole fails.
    #[serde(default)]
    pub stop_on_pole_failure: bool,
}

impl Default for StructuresConfig {
    fn default() -> Self {
        Self {
            default_repair_time_h: default_repair_time_h(),
            wind_speed_name: default_wind_speed_name(),
            wind_dir_name: default_wind_dir_name(),
            wind_gust_name: default_wind_gust_name(),
            stop_on_pole_failure: false,
        }
    }
}

impl StructuresConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.default_repair_time_h.is_finite() {
            return Err(anyhow!("structures.default_repair_time_h must be finite"));
        }
        if self.default_repair_time_h <= 0.0 {
            // Poles that carry their own repair time still initialise.
            warn!(
                default_repair_time_h = self.default_repair_time_h,
                "non-positive default repair time; poles without their own repair time will fail to initialise"
            );
        }
        for (key, value) in [
            ("wind_speed_name", &self.wind_speed_name),
            ("wind_dir_name", &self.wind_dir_name),
            ("wind_gust_name", &self.wind_gust_name),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("structures.{} cannot be empty", key));
            }
        }
        Ok(())
    }
}

/// Time window and step for a simulation run.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_simulation_start")]
    pub start: DateTime<Utc>,
    #[serde(default = "default_simulation_stop")]
    pub stop: DateTime<Utc>,
    #[serde(default = "default_timestep")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timestep: Duration,
    /// Seed for shuffling the random-order passes; declaration order when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: default_simulation_start(),
            stop: default_simulation_stop(),
            timestep: default_timestep(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stop < self.start {
            return Err(anyhow!(
                "simulation stop {} precedes start {}",
                self.stop,
                self.start
            ));
        }
        if self.timestep.is_zero() {
            return Err(anyhow!("simulation timestep must be positive"));
        }
        Ok(())
    }

    pub fn start_timestamp(&self) -> Timestamp {
        self.start.timestamp()
    }

    pub fn stop_timestamp(&self) -> Timestamp {
        self.stop.timestamp()
    }

    pub fn timestep_secs(&self) -> i64 {
        i64::try_from(self.timestep.as_secs()).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    #[serde(default = "default_file_logging")]
    pub file_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            file_logging: default_file_logging(),
        }
    }
}
