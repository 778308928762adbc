//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the core runtime."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Core shared primitives for the R-EMS structures workspace.
//! This crate exposes configuration loading, tracing setup and the
//! simulation clock helpers consumed by the pole core and the scheduler.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{AppConfig, LoadedAppConfig, LoggingConfig, SimulationConfig, StructuresConfig};
pub use logging::{init_tracing, LogFormat};
pub use time::{Timestamp, SECONDS_PER_HOUR};
