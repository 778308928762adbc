//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "01-bootstrap"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Simulation runtime module exports and shared types."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Host-side drivers for the pole structures model: phase scheduling,
//! weather tape replay and scenario loading.

pub mod errors;
pub mod report;
pub mod scenario;
pub mod scheduler;
pub mod weather_tape;

pub use errors::{Result, SimError};
pub use report::{PoleEvent, PoleEventKind, PoleSummary, SimulationReport};
pub use scenario::{PoleSpec, Scenario, ScenarioBuild, WeatherSpec};
pub use scheduler::{PhaseScheduler, StepOutcome, WeatherReplay};
pub use weather_tape::{parse_timestamp, RawWeatherSample, WeatherSample, WeatherTape};
