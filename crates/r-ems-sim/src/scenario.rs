//! ---
//! ems_section: "11-simulation-test-harness"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Simulation runtime helpers and scenario engines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use r_ems_common::AppConfig;
use r_ems_structures::{
    Catalog, MountSpec, Pole, PoleAssembly, PoleConfiguration, PoleProperties, WeatherStation,
};
use serde::Deserialize;
use tracing::{debug, error};

use crate::errors::SimError;
use crate::scheduler::{PhaseScheduler, WeatherReplay};
use crate::weather_tape::{RawWeatherSample, WeatherTape};

/// Weather object declared by a scenario, fed from a tape file or inline samples.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherSpec {
    /// Tape path, relative to the scenario file.
    #[serde(default)]
    pub tape: Option<PathBuf>,
    #[serde(default)]
    pub samples: Vec<RawWeatherSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoleSpec {
    #[serde(flatten)]
    pub properties: PoleProperties,
    #[serde(default)]
    pub mounts: Vec<MountSpec>,
}

/// Scenario file: pole configurations, weather objects and poles.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub configurations: IndexMap<String, PoleConfiguration>,
    #[serde(default)]
    pub weather: IndexMap<String, WeatherSpec>,
    #[serde(default)]
    pub poles: Vec<PoleSpec>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Everything built from a scenario, including the poles that failed to initialise.
#[derive(Debug)]
pub struct ScenarioBuild {
    pub catalog: Catalog,
    pub assemblies: Vec<PoleAssembly>,
    pub weather: Vec<WeatherReplay>,
    pub failures: Vec<SimError>,
}

impl ScenarioBuild {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_scheduler(self, config: &AppConfig) -> PhaseScheduler {
        PhaseScheduler::new(
            self.assemblies,
            self.weather,
            config.structures.clone(),
            config.simulation.clone(),
        )
    }
}

impl std::str::FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        toml::from_str(content).with_context(|| "failed to parse scenario")
    }
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(scenario = %path.display(), "loading scenario");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read scenario file {}", path.display()))?;
        let mut scenario: Scenario = toml::from_str(&contents)
            .with_context(|| format!("failed to parse scenario file {}", path.display()))?;
        scenario.base_dir = path.parent().map(Path::to_path_buf);
        Ok(scenario)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn load_tape(&self, name: &str, spec: &WeatherSpec) -> Result<Option<WeatherTape>> {
        if let Some(path) = &spec.tape {
            let tape = WeatherTape::from_path(&self.resolve_path(path))
                .with_context(|| format!("weather object '{}'", name))?;
            return Ok(Some(tape));
        }
        if spec.samples.is_empty() {
            return Ok(None);
        }
        let tape = WeatherTape::from_raw(spec.samples.clone())
            .with_context(|| format!("weather object '{}' has invalid samples", name))?;
        Ok(Some(tape))
    }

    /// Build the catalog and initialise every pole.
    ///
    /// Catalog and weather errors abort the build; pole initialisation errors
    /// are collected so all of them can be reported at once.
    pub fn build(&self, config: &AppConfig) -> Result<ScenarioBuild> {
        let names = &config.structures;
        let mut catalog = Catalog::new();
        for (name, configuration) in &self.configurations {
            catalog
                .insert_configuration(name.clone(), configuration.clone())
                .with_context(|| format!("pole configuration '{}'", name))?;
        }

        let mut weather = Vec::new();
        for (name, spec) in &self.weather {
            let tape = self.load_tape(name, spec)?;
            let first = tape.as_ref().and_then(|tape| tape.first().copied());
            let station = Arc::new(WeatherStation::new(
                name.clone(),
                [
                    (names.wind_speed_name.clone(), first.map_or(0.0, |s| s.wind_speed)),
                    (names.wind_dir_name.clone(), first.map_or(0.0, |s| s.wind_dir)),
                    (names.wind_gust_name.clone(), first.map_or(0.0, |s| s.wind_gust)),
                ],
            ));
            catalog
                .insert_weather(name.clone(), station.clone())
                .with_context(|| format!("weather object '{}'", name))?;
            if let Some(tape) = tape {
                weather.push(WeatherReplay::new(station, tape));
            }
        }

        let now = config.simulation.start_timestamp();
        let mut seen = HashSet::new();
        let mut assemblies = Vec::with_capacity(self.poles.len());
        let mut failures = Vec::new();
        for spec in &self.poles {
            let name = spec.properties.name.clone();
            if !seen.insert(name.clone()) {
                error!(pole = %name, "duplicate pole name");
                failures.push(SimError::DuplicatePole(name));
                continue;
            }
            match build_assembly(spec, &catalog, config, now) {
                Ok(assembly) => assemblies.push(assembly),
                Err(source) => {
                    error!(pole = %name, error = %source, "pole failed to initialise");
                    failures.push(SimError::PoleInit { pole: name, source });
                }
            }
        }

        Ok(ScenarioBuild {
            catalog,
            assemblies,
            weather,
            failures,
        })
    }
}

fn build_assembly(
    spec: &PoleSpec,
    catalog: &Catalog,
    config: &AppConfig,
    now: r_ems_common::Timestamp,
) -> r_ems_structures::Result<PoleAssembly> {
    let pole = Pole::initialize(spec.properties.clone(), catalog, &config.structures, now)?;
    let mut assembly = PoleAssembly::new(pole);
    for mount in &spec.mounts {
        assembly.push_mount(mount.clone().into_mount()?);
    }
    Ok(assembly)
}
