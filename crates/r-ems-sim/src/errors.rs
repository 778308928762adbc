//! ---
//! ems_section: "11-simulation-test-harness"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Simulation runtime helpers and scenario engines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use r_ems_common::Timestamp;
use r_ems_structures::StructuresError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("weather tape has no samples")]
    EmptyTape,
    #[error("weather tape contains two samples at t={0}")]
    DuplicateSample(Timestamp),
    #[error("invalid weather timestamp '{0}': expected RFC 3339 or epoch seconds")]
    InvalidTimestamp(String),
    #[error("pole '{0}' is defined more than once")]
    DuplicatePole(String),
    #[error("pole '{pole}' failed to initialise: {source}")]
    PoleInit {
        pole: String,
        #[source]
        source: StructuresError,
    },
    #[error("simulation window is empty: stop {stop} precedes start {start}")]
    EmptyWindow { start: Timestamp, stop: Timestamp },
    #[error(transparent)]
    Structures(#[from] StructuresError),
}
