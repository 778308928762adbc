//! ---
//! ems_section: "11-simulation-test-harness"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Simulation runtime helpers and scenario engines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use csv::ReaderBuilder;
use r_ems_common::{StructuresConfig, Timestamp};
use r_ems_structures::WeatherStation;
use serde::{Deserialize, Serialize};

use crate::errors::SimError;

/// Raw sample as it appears in tape files and inline scenario weather.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWeatherSample {
    /// RFC 3339 or integer seconds since the Unix epoch.
    pub timestamp: String,
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_dir: f64,
    #[serde(default)]
    pub wind_gust: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherSample {
    pub timestamp: Timestamp,
    pub wind_speed: f64,
    pub wind_dir: f64,
    pub wind_gust: f64,
}

impl TryFrom<RawWeatherSample> for WeatherSample {
    type Error = SimError;

    fn try_from(raw: RawWeatherSample) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            timestamp: parse_timestamp(&raw.timestamp)?,
            wind_speed: raw.wind_speed,
            wind_dir: raw.wind_dir,
            wind_gust: raw.wind_gust,
        })
    }
}

pub fn parse_timestamp(value: &str) -> std::result::Result<Timestamp, SimError> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<Timestamp>() {
        return Ok(seconds);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|_| SimError::InvalidTimestamp(value.to_owned()))
}

/// Time-ordered weather samples replayed into a [`WeatherStation`].
#[derive(Debug, Clone, Default)]
pub struct WeatherTape {
    samples: Vec<WeatherSample>,
}

impl WeatherTape {
    pub fn from_samples(mut samples: Vec<WeatherSample>) -> std::result::Result<Self, SimError> {
        if samples.is_empty() {
            return Err(SimError::EmptyTape);
        }
        samples.sort_by_key(|sample| sample.timestamp);
        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[0].timestamp == pair[1].timestamp)
        {
            return Err(SimError::DuplicateSample(pair[0].timestamp));
        }
        Ok(Self { samples })
    }

    pub fn from_raw(raw: Vec<RawWeatherSample>) -> std::result::Result<Self, SimError> {
        let samples = raw
            .into_iter()
            .map(WeatherSample::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_samples(samples)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::read_json(path)?,
            Some("csv") => Self::read_csv(path)?,
            _ => anyhow::bail!("unsupported weather tape format: {}", path.display()),
        };
        Self::from_raw(raw).with_context(|| format!("invalid weather tape {}", path.display()))
    }

    fn read_json(path: &Path) -> Result<Vec<RawWeatherSample>> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read weather tape {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid weather tape JSON {}", path.display()))
    }

    fn read_csv(path: &Path) -> Result<Vec<RawWeatherSample>> {
        let file = fs::File::open(path)
            .with_context(|| format!("unable to open weather tape csv {}", path.display()))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let mut samples = Vec::new();
        for row in reader.deserialize::<RawWeatherSample>() {
            samples.push(
                row.with_context(|| format!("invalid weather row in {}", path.display()))?,
            );
        }
        Ok(samples)
    }

    /// Latest sample at or before `t`.
    pub fn sample_at(&self, t: Timestamp) -> Option<&WeatherSample> {
        let idx = self.samples.partition_point(|sample| sample.timestamp <= t);
        idx.checked_sub(1).map(|i| &self.samples[i])
    }

    pub fn first(&self) -> Option<&WeatherSample> {
        self.samples.first()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Publish the sample in effect at `t`; returns false before the first sample.
    pub fn publish_at(&self, station: &WeatherStation, t: Timestamp, names: &StructuresConfig) -> bool {
        match self.sample_at(t) {
            Some(sample) => {
                publish_sample(station, sample, names);
                true
            }
            None => false,
        }
    }
}

pub fn publish_sample(station: &WeatherStation, sample: &WeatherSample, names: &StructuresConfig) {
    station.publish([
        (names.wind_speed_name.as_str(), sample.wind_speed),
        (names.wind_dir_name.as_str(), sample.wind_dir),
        (names.wind_gust_name.as_str(), sample.wind_gust),
    ]);
}
