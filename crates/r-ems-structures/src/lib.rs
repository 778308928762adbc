//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Utility pole wind-loading, degradation and failure/repair model.

pub mod accumulators;
pub mod assembly;
pub mod catalog;
pub mod configuration;
pub mod errors;
pub mod mount;
pub mod physics;
pub mod pole;
pub mod weather;

pub use accumulators::{LoadAccumulators, MountLoad, NoWindAccumulators};
pub use assembly::PoleAssembly;
pub use catalog::{Catalog, CatalogEntry};
pub use configuration::PoleConfiguration;
pub use errors::{Result, SimulationHalt, StructuresError};
pub use mount::{EquipmentMount, Mount, MountSpec, MountStatus, WindExposure, WireMount};
pub use pole::{
    NextEvent, Phase, Pole, PoleProperties, PoleSnapshot, PoleStatus, StressPolynomial,
};
pub use weather::{
    BindingOutcome, InputSource, ResolvedInput, WeatherFeed, WeatherHandle, WeatherStation,
};
