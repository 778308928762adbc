//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Equipment and wire peers that load a pole during the bottom-up pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::accumulators::MountLoad;
use crate::errors::{Result, StructuresError};
use crate::physics::INCHES_PER_FOOT;
use crate::pole::{Pole, PoleStatus};

/// Operating state of a mounted peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountStatus {
    #[default]
    Online,
    /// The host pole is recalculating this cycle.
    Pending,
    /// The host pole is down.
    Faulted,
}

/// Wind state a pole exposes to its peers for the current cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WindExposure {
    /// Wind pressure at the pole, psf.
    pub pressure: f64,
    /// Wind speed, m/s.
    pub speed: f64,
    /// Wind direction, degrees.
    pub direction: f64,
    pub overload_factor: f64,
}

/// A peer attached to a pole.
///
/// The default phase hooks derive the peer status from the pole; only the
/// load calculation is mount-specific.
pub trait Mount: fmt::Debug + Send {
    fn name(&self) -> &str;
    fn class(&self) -> &'static str;
    fn status(&self) -> MountStatus;
    fn set_status(&mut self, status: MountStatus);

    /// Contribution to the host pole's accumulators under `exposure`.
    fn load(&self, exposure: &WindExposure) -> MountLoad;

    fn settle(&mut self, pole: &Pole) {
        let status = match pole.status() {
            PoleStatus::Ok => MountStatus::Online,
            PoleStatus::Failed => MountStatus::Faulted,
        };
        self.set_status(status);
    }

    fn top_down(&mut self, pole: &Pole) {
        if pole.recalc_pending() {
            self.set_status(MountStatus::Pending);
        }
    }

    fn resolve(&mut self, pole: &Pole) {
        self.settle(pole);
    }

    fn commit(&mut self, _pole: &Pole) {}
}

fn check_non_negative(name: &str, fields: &[(&str, f64)]) -> Result<()> {
    for (field, value) in fields {
        if !(value.is_finite() && *value >= 0.0) {
            return Err(StructuresError::InvalidMount {
                name: name.to_owned(),
                reason: format!("{} must be non-negative (got {})", field, value),
            });
        }
    }
    Ok(())
}

/// Pole-top equipment such as a transformer or switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentMount {
    pub name: String,
    /// Attachment height above ground, ft.
    pub height_ft: f64,
    /// Horizontal offset of the centre of mass from the pole axis, ft.
    #[serde(default)]
    pub offset_ft: f64,
    #[serde(default)]
    pub weight_lb: f64,
    /// Projected area facing the wind, ft².
    #[serde(default)]
    pub area_sqft: f64,
    #[serde(skip)]
    pub status: MountStatus,
}

impl EquipmentMount {
    pub fn validate(&self) -> Result<()> {
        check_non_negative(
            &self.name,
            &[
                ("height_ft", self.height_ft),
                ("offset_ft", self.offset_ft),
                ("weight_lb", self.weight_lb),
                ("area_sqft", self.area_sqft),
            ],
        )
    }
}

impl Mount for EquipmentMount {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> &'static str {
        "equipment_mount"
    }

    fn status(&self) -> MountStatus {
        self.status
    }

    fn set_status(&mut self, status: MountStatus) {
        self.status = status;
    }

    fn load(&self, exposure: &WindExposure) -> MountLoad {
        let moment_nowind = self.area_sqft * self.height_ft * exposure.overload_factor;
        MountLoad {
            equipment_moment: self.weight_lb * self.offset_ft + exposure.pressure * moment_nowind,
            equipment_moment_nowind: moment_nowind,
            ..MountLoad::default()
        }
    }
}

/// A conductor span terminating on the pole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMount {
    pub name: String,
    pub height_ft: f64,
    pub span_ft: f64,
    pub diameter_in: f64,
    /// Unbalanced horizontal tension, lb.
    #[serde(default)]
    pub tension_lb: f64,
    #[serde(skip)]
    pub status: MountStatus,
}

impl WireMount {
    pub fn validate(&self) -> Result<()> {
        check_non_negative(
            &self.name,
            &[
                ("height_ft", self.height_ft),
                ("span_ft", self.span_ft),
                ("diameter_in", self.diameter_in),
                ("tension_lb", self.tension_lb),
            ],
        )
    }
}

impl Mount for WireMount {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> &'static str {
        "wire_mount"
    }

    fn status(&self) -> MountStatus {
        self.status
    }

    fn set_status(&mut self, status: MountStatus) {
        self.status = status;
    }

    fn load(&self, exposure: &WindExposure) -> MountLoad {
        let load_nowind = self.span_ft * self.diameter_in / INCHES_PER_FOOT;
        let moment_nowind = load_nowind * self.height_ft * exposure.overload_factor;
        let load = exposure.pressure * load_nowind;
        MountLoad {
            wire_moment: load * self.height_ft * exposure.overload_factor,
            wire_moment_nowind: moment_nowind,
            wire_tension: self.tension_lb * self.height_ft,
            wire_load: load,
            wire_load_nowind: load_nowind,
            ..MountLoad::default()
        }
    }
}

/// Mount description as it appears in scenario files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MountSpec {
    Equipment(EquipmentMount),
    Wire(WireMount),
}

impl MountSpec {
    pub fn name(&self) -> &str {
        match self {
            MountSpec::Equipment(mount) => &mount.name,
            MountSpec::Wire(mount) => &mount.name,
        }
    }

    /// Validate and box the mount for an assembly.
    pub fn into_mount(self) -> Result<Box<dyn Mount>> {
        match self {
            MountSpec::Equipment(mount) => {
                mount.validate()?;
                Ok(Box::new(mount))
            }
            MountSpec::Wire(mount) => {
                mount.validate()?;
                Ok(Box::new(mount))
            }
        }
    }
}
