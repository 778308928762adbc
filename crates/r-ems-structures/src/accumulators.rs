//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// Wind-loaded totals written by mounts during the bottom-up pass.
///
/// Zeroed by the pole's top-down reset whenever a recalculation is pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAccumulators {
    pub equipment_moment: f64,
    pub wire_moment: f64,
    pub wire_tension: f64,
    pub wire_load: f64,
}

impl LoadAccumulators {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Moment components that scale with wind pressure.
    pub fn wind_loaded_moment(&self) -> f64 {
        self.equipment_moment + self.wire_moment
    }
}

/// Per-unit-pressure totals used for critical wind speed and the stress polynomial.
///
/// Zeroed at the start of every settle pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoWindAccumulators {
    pub equipment_moment_nowind: f64,
    pub wire_moment_nowind: f64,
    pub wire_load_nowind: f64,
}

impl NoWindAccumulators {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn moment(&self) -> f64 {
        self.equipment_moment_nowind + self.wire_moment_nowind
    }
}

/// One mount's contribution for the current cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MountLoad {
    pub equipment_moment: f64,
    pub equipment_moment_nowind: f64,
    pub wire_moment: f64,
    pub wire_moment_nowind: f64,
    pub wire_tension: f64,
    pub wire_load: f64,
    pub wire_load_nowind: f64,
}

impl MountLoad {
    pub(crate) fn apply(&self, loads: &mut LoadAccumulators, nowind: &mut NoWindAccumulators) {
        loads.equipment_moment += self.equipment_moment;
        loads.wire_moment += self.wire_moment;
        loads.wire_tension += self.wire_tension;
        loads.wire_load += self.wire_load;
        nowind.equipment_moment_nowind += self.equipment_moment_nowind;
        nowind.wire_moment_nowind += self.wire_moment_nowind;
        nowind.wire_load_nowind += self.wire_load_nowind;
    }
}
