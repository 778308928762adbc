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

use crate::errors::Result;
use crate::mount::Mount;
use crate::pole::{NextEvent, Pole};

/// A pole together with the peers that load it.
///
/// Each method runs one pass for the pole and its mounts in the order the
/// pass requires: the pole leads on settle and the top-down passes, the
/// mounts contribute after the pole opens its accumulation window.
#[derive(Debug)]
pub struct PoleAssembly {
    pole: Pole,
    mounts: Vec<Box<dyn Mount>>,
}

impl PoleAssembly {
    pub fn new(pole: Pole) -> Self {
        Self {
            pole,
            mounts: Vec::new(),
        }
    }

    pub fn with_mount(mut self, mount: Box<dyn Mount>) -> Self {
        self.mounts.push(mount);
        self
    }

    pub fn push_mount(&mut self, mount: Box<dyn Mount>) {
        self.mounts.push(mount);
    }

    pub fn pole(&self) -> &Pole {
        &self.pole
    }

    pub fn pole_mut(&mut self) -> &mut Pole {
        &mut self.pole
    }

    pub fn mounts(&self) -> &[Box<dyn Mount>] {
        &self.mounts
    }

    pub fn name(&self) -> &str {
        self.pole.name()
    }

    pub fn settle(&mut self, now: Timestamp) -> NextEvent {
        let next = self.pole.settle(now);
        for mount in &mut self.mounts {
            mount.settle(&self.pole);
        }
        next
    }

    pub fn top_down(&mut self, now: Timestamp) -> NextEvent {
        let next = self.pole.top_down(now);
        for mount in &mut self.mounts {
            mount.top_down(&self.pole);
        }
        next
    }

    /// Returns the number of contributions the pole accepted.
    pub fn bottom_up(&mut self, now: Timestamp) -> Result<usize> {
        self.pole.bottom_up(now);
        let exposure = self.pole.wind_exposure();
        let mut accepted = 0;
        for mount in &self.mounts {
            if self.pole.contribute(&mount.load(&exposure))? {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Mounts finalise from the pole status even when the pole requests a halt.
    pub fn resolve(&mut self, now: Timestamp) -> Result<NextEvent> {
        let outcome = self.pole.resolve(now);
        for mount in &mut self.mounts {
            mount.resolve(&self.pole);
        }
        outcome
    }

    pub fn commit(&mut self, now: Timestamp) -> NextEvent {
        let next = self.pole.commit(now);
        for mount in &mut self.mounts {
            mount.commit(&self.pole);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::configuration::PoleConfiguration;
    use crate::mount::{EquipmentMount, MountStatus, WireMount};
    use crate::pole::{PoleProperties, PoleStatus};
    use r_ems_common::StructuresConfig;

    const T0: Timestamp = 1_577_836_800;

    fn assembly() -> PoleAssembly {
        let mut catalog = Catalog::new();
        catalog
            .insert_configuration(
                "WOOD-40",
                PoleConfiguration {
                    pole_length: 40.0,
                    pole_depth: 6.0,
                    ground_diameter: 20.74,
                    top_diameter: 9.87,
                    fiber_strength: 8000.0,
                    strength_factor_250b_wood: 0.85,
                    material_density: 52.0,
                    degradation_rate: 0.0,
                    overload_factor_transverse_general: 2.0,
                    repair_time: None,
                },
            )
            .unwrap();
        let mut properties = PoleProperties::new("pole-1", "WOOD-40", 2010);
        properties.wind_speed = 15.0;
        let pole =
            Pole::initialize(properties, &catalog, &StructuresConfig::default(), T0).unwrap();
        PoleAssembly::new(pole)
            .with_mount(Box::new(EquipmentMount {
                name: "xfmr".into(),
                height_ft: 30.0,
                offset_ft: 1.0,
                weight_lb: 500.0,
                area_sqft: 3.0,
                status: MountStatus::Online,
            }))
            .with_mount(Box::new(WireMount {
                name: "span".into(),
                height_ft: 32.0,
                span_ft: 150.0,
                diameter_in: 0.6,
                tension_lb: 10.0,
                status: MountStatus::Online,
            }))
    }

    #[test]
    fn full_cycle_folds_mount_loads_into_totals() {
        let mut assembly = assembly();
        assembly.settle(T0);
        assembly.top_down(T0);
        assert!(assembly
            .mounts()
            .iter()
            .all(|m| m.status() == MountStatus::Pending));
        assert_eq!(assembly.bottom_up(T0).unwrap(), 2);
        assert_eq!(assembly.resolve(T0).unwrap(), NextEvent::Never);
        assembly.commit(T0);

        let pole = assembly.pole();
        let loads = pole.accumulators();
        assert!(loads.equipment_moment > 500.0);
        assert_eq!(loads.wire_tension, 320.0);
        let expected = pole.pole_moment() + loads.equipment_moment + loads.wire_moment + 320.0;
        assert!((pole.total_moment() - expected).abs() < 1e-9);
        assert_eq!(pole.status(), PoleStatus::Ok);
        assert!(assembly
            .mounts()
            .iter()
            .all(|m| m.status() == MountStatus::Online));
        assert_eq!(
            pole.last_committed().map(|s| s.total_moment),
            Some(pole.total_moment())
        );
    }

    #[test]
    fn quiet_cycle_accepts_no_contributions() {
        let mut assembly = assembly();
        for _ in 0..2 {
            assembly.settle(T0);
            assembly.top_down(T0);
            assembly.bottom_up(T0).unwrap();
            assembly.resolve(T0).unwrap();
            assembly.commit(T0);
        }
        let totals = assembly.pole().total_moment();
        assembly.settle(T0 + 3600);
        assembly.top_down(T0 + 3600);
        assert_eq!(assembly.bottom_up(T0 + 3600).unwrap(), 0);
        assembly.resolve(T0 + 3600).unwrap();
        assert_eq!(assembly.pole().total_moment(), totals);
    }
}
