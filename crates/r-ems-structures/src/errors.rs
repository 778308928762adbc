//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use r_ems_common::Timestamp;
use serde::Serialize;
use thiserror::Error;

use crate::pole::Phase;

pub type Result<T> = std::result::Result<T, StructuresError>;

#[derive(Debug, Error)]
pub enum StructuresError {
    #[error("pole {pole}: configuration is not set to a pole_configuration object")]
    MissingConfiguration { pole: String },
    #[error("object '{name}' not found in catalog")]
    UnknownObject { name: String },
    #[error("object '{name}' is a {found}, expected a {expected}")]
    WrongObjectKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("object '{0}' is already registered in the catalog")]
    DuplicateObject(String),
    #[error("pole configuration '{name}' is invalid: {reason}")]
    InvalidConfiguration { name: String, reason: String },
    #[error("pole {pole}: repair time resolved to {hours} h; structures.default_repair_time_h must be positive")]
    InvalidRepairTime { pole: String, hours: f64 },
    #[error("pole {pole}: tilt angle {degrees} deg is not between 0 and 90 degrees")]
    TiltAngleOutOfRange { pole: String, degrees: f64 },
    #[error("pole {pole}: tilt direction {degrees} deg is not between 0 and 360 degrees")]
    TiltDirectionOutOfRange { pole: String, degrees: f64 },
    #[error("pole {pole}: guy height {guy_height} ft leaves no effective height above ground")]
    GuyHeightOutOfRange { pole: String, guy_height: f64 },
    #[error("mount '{name}' is invalid: {reason}")]
    InvalidMount { name: String, reason: String },
    #[error("pole {pole}: accumulator write during {actual} (only allowed during {expected})")]
    OutOfPhase {
        pole: String,
        expected: Phase,
        actual: Phase,
    },
    #[error(transparent)]
    Halt(#[from] SimulationHalt),
}

impl StructuresError {
    /// Initialisation errors that keep the object from coming online.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            StructuresError::OutOfPhase { .. } | StructuresError::Halt(_)
        )
    }

    pub fn as_halt(&self) -> Option<&SimulationHalt> {
        match self {
            StructuresError::Halt(halt) => Some(halt),
            _ => None,
        }
    }
}

/// Stop request raised by a pole when the stop-on-failure policy is active.
///
/// Carried through the error channel so it cannot be dropped silently, but the
/// host treats it as an orderly end of run rather than a fault.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("simulation halted: pole {pole} failed at {stress:.3} pu stress (t={at})")]
pub struct SimulationHalt {
    pub pole: String,
    pub at: Timestamp,
    pub stress: f64,
}
