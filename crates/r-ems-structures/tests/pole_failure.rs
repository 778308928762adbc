//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use r_ems_common::time::simulation_year;
use r_ems_common::{StructuresConfig, Timestamp};
use r_ems_structures::physics::{self, MPH_PER_MPS, WIND_PRESSURE_COEFFICIENT};
use r_ems_structures::{
    Catalog, EquipmentMount, MountStatus, NextEvent, Pole, PoleAssembly, PoleConfiguration,
    PoleProperties, PoleStatus, StructuresError,
};

const T0: Timestamp = 1_577_836_800; // 2020-01-01T00:00:00Z
const HOUR: Timestamp = 3600;

fn wood_40(degradation_rate: f64) -> PoleConfiguration {
    PoleConfiguration {
        pole_length: 40.0,
        pole_depth: 6.0,
        ground_diameter: 20.74,
        top_diameter: 9.87,
        fiber_strength: 8000.0,
        strength_factor_250b_wood: 0.85,
        material_density: 52.0,
        degradation_rate,
        overload_factor_transverse_general: 2.0,
        repair_time: None,
    }
}

fn catalog(degradation_rate: f64) -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .insert_configuration("WOOD-40", wood_40(degradation_rate))
        .unwrap();
    catalog
}

fn init(properties: PoleProperties, settings: &StructuresConfig) -> Pole {
    Pole::initialize(properties, &catalog(0.0), settings, T0).unwrap()
}

/// Run one full cycle and return the resolution outcome.
fn cycle(pole: &mut Pole, now: Timestamp) -> r_ems_structures::Result<NextEvent> {
    pole.settle(now);
    pole.top_down(now);
    pole.bottom_up(now);
    let next = pole.resolve(now);
    if next.is_ok() {
        pole.commit(now);
    }
    next
}

fn ground_line_resisting_moment() -> f64 {
    physics::resisting_moment(0.85, 8000.0, 20.74, 0.0)
}

/// Wind speed whose shaft moment alone exceeds the ground-line strength by `margin`.
fn failing_wind_speed(margin: f64) -> f64 {
    let per_pressure = physics::wind_moment(1.0, 34.0, 20.74, 9.87, 2.0);
    let failure_pressure = ground_line_resisting_moment() / per_pressure;
    margin * (failure_pressure / (WIND_PRESSURE_COEFFICIENT * MPH_PER_MPS)).sqrt()
}

#[test]
fn calm_pole_matches_closed_form_baseline() {
    let mut pole = init(
        PoleProperties::new("pole-1", "WOOD-40", 2015),
        &StructuresConfig::default(),
    );

    // Effective height equals the exposed length, so the section is the top diameter.
    let baseline = 0.008186 * 0.85 * 8000.0 * 9.87_f64.powi(3);
    assert!((pole.resisting_moment() - baseline).abs() < 1e-6);
    assert_eq!(pole.height(), 34.0);

    assert_eq!(cycle(&mut pole, T0).unwrap(), NextEvent::Never);
    assert_eq!(pole.pole_stress(), 0.0);
    assert_eq!(pole.status(), PoleStatus::Ok);
    assert!((pole.resisting_moment() - ground_line_resisting_moment()).abs() < 1e-6);
    assert_eq!(pole.last_committed().map(|s| s.status), Some(PoleStatus::Ok));
}

#[test]
fn strong_wind_fails_pole_and_schedules_repair() {
    let mut properties = PoleProperties::new("pole-1", "WOOD-40", 2015);
    properties.repair_time = Some(6.0);
    let mut pole = init(properties, &StructuresConfig::default());

    let speed = failing_wind_speed(1.05);
    pole.set_wind_speed(speed);
    let next = cycle(&mut pole, T0).unwrap();

    assert!(pole.pole_stress() >= 1.0);
    assert!((pole.pole_stress() - 1.05 * 1.05).abs() < 1e-6);
    assert_eq!(pole.status(), PoleStatus::Failed);
    assert_eq!(pole.down_time(), Some(T0));
    assert_eq!(next, NextEvent::At(T0 + 6 * HOUR));

    let just_below = failing_wind_speed(0.95);
    let mut healthy = init(
        PoleProperties::new("pole-2", "WOOD-40", 2015),
        &StructuresConfig::default(),
    );
    healthy.set_wind_speed(just_below);
    assert_eq!(cycle(&mut healthy, T0).unwrap(), NextEvent::Never);
    assert!(healthy.pole_stress() < 1.0);
    assert_eq!(healthy.status(), PoleStatus::Ok);
}

#[test]
fn default_repair_time_drives_the_wake_when_unset() {
    let settings = StructuresConfig {
        default_repair_time_h: 12.0,
        ..StructuresConfig::default()
    };
    let mut pole = init(PoleProperties::new("pole-1", "WOOD-40", 2015), &settings);
    assert_eq!(pole.repair_time_h(), 12.0);
    pole.set_wind_speed(failing_wind_speed(1.1));
    assert_eq!(cycle(&mut pole, T0).unwrap(), NextEvent::At(T0 + 12 * HOUR));
}

#[test]
fn stop_on_failure_signals_halt_instead_of_wake() {
    let settings = StructuresConfig {
        stop_on_pole_failure: true,
        ..StructuresConfig::default()
    };
    let mut pole = init(PoleProperties::new("pole-1", "WOOD-40", 2015), &settings);
    pole.set_wind_speed(failing_wind_speed(1.2));

    let err = cycle(&mut pole, T0).unwrap_err();
    let halt = err.as_halt().expect("halt signal");
    assert_eq!(halt.pole, "pole-1");
    assert_eq!(halt.at, T0);
    assert!(halt.stress >= 1.0);
    assert!(!err.is_configuration_error());
    assert!(matches!(err, StructuresError::Halt(_)));
    assert_eq!(pole.status(), PoleStatus::Failed);
    assert!(!pole.recalc_pending());
}

#[test]
fn failed_pole_repairs_only_after_delay_elapses() {
    let mut properties = PoleProperties::new("pole-1", "WOOD-40", 1990);
    properties.repair_time = Some(6.0);
    properties.tilt_angle = 10.0;
    properties.tilt_direction = 45.0;
    let mut pole = init(properties, &StructuresConfig::default());
    pole.set_wind_direction(45.0);
    pole.set_wind_speed(failing_wind_speed(1.05));
    cycle(&mut pole, T0).unwrap();
    assert_eq!(pole.status(), PoleStatus::Failed);

    // Frozen while down.
    let frozen_moment = pole.pole_moment();
    assert_eq!(cycle(&mut pole, T0 + 5 * HOUR).unwrap(), NextEvent::Never);
    assert_eq!(pole.status(), PoleStatus::Failed);
    assert_eq!(pole.tilt_angle(), 10.0);
    assert_eq!(pole.pole_moment(), frozen_moment);

    let repair_at = T0 + 6 * HOUR;
    pole.settle(repair_at);
    assert_eq!(pole.status(), PoleStatus::Ok);
    assert_eq!(pole.tilt_angle(), 0.0);
    assert_eq!(pole.tilt_direction(), 0.0);
    assert_eq!(pole.install_year(), simulation_year(repair_at));
    assert_eq!(pole.down_time(), None);
    assert!(pole.recalc_pending());

    pole.top_down(repair_at);
    pole.bottom_up(repair_at);
    assert_eq!(pole.resolve(repair_at).unwrap(), NextEvent::Never);
    assert_eq!(pole.status(), PoleStatus::Ok);
}

#[test]
fn accumulators_are_zero_after_top_down_reset() {
    let mut properties = PoleProperties::new("pole-1", "WOOD-40", 2015);
    properties.wind_speed = 10.0;
    let pole = init(properties, &StructuresConfig::default());
    let mut assembly = PoleAssembly::new(pole).with_mount(Box::new(EquipmentMount {
        name: "xfmr".into(),
        height_ft: 30.0,
        offset_ft: 2.0,
        weight_lb: 400.0,
        area_sqft: 5.0,
        status: MountStatus::Online,
    }));

    assembly.settle(T0);
    assembly.top_down(T0);
    assembly.bottom_up(T0).unwrap();
    assembly.resolve(T0).unwrap();
    assert!(assembly.pole().accumulators().equipment_moment > 0.0);

    assembly.pole_mut().set_wind_speed(12.0);
    assembly.settle(T0 + HOUR);
    assembly.top_down(T0 + HOUR);
    let loads = assembly.pole().accumulators();
    assert_eq!(loads.equipment_moment, 0.0);
    assert_eq!(loads.wire_moment, 0.0);
    assert_eq!(loads.wire_tension, 0.0);
    assert_eq!(loads.wire_load, 0.0);
    assert_eq!(assembly.pole().nowind_accumulators().moment(), 0.0);
}

#[test]
fn equipment_no_wind_load_lowers_critical_wind_speed() {
    let mut properties = PoleProperties::new("pole-1", "WOOD-40", 2015);
    properties.wind_speed = 10.0;
    let bare = {
        let mut pole = init(properties.clone(), &StructuresConfig::default());
        cycle(&mut pole, T0).unwrap();
        pole.critical_wind_speed()
    };

    let pole = init(properties, &StructuresConfig::default());
    let mut assembly = PoleAssembly::new(pole).with_mount(Box::new(EquipmentMount {
        name: "xfmr".into(),
        height_ft: 30.0,
        offset_ft: 0.0,
        weight_lb: 0.0,
        area_sqft: 40.0,
        status: MountStatus::Online,
    }));
    assembly.settle(T0);
    assembly.top_down(T0);
    assembly.bottom_up(T0).unwrap();
    assembly.resolve(T0).unwrap();

    let pole = assembly.pole();
    assert!(pole.critical_wind_speed() < bare);
    let poly = pole.stress_polynomial();
    assert!((poly.a - (pole.pole_moment_nowind() + 40.0 * 30.0 * 2.0)).abs() < 1e-9);
    assert_eq!(poly.b, 0.0);
}

#[test]
fn degradation_hollows_the_ground_line_section() {
    let mut pole = Pole::initialize(
        PoleProperties::new("pole-1", "WOOD-40", 2000),
        &catalog(0.1),
        &StructuresConfig::default(),
        T0,
    )
    .unwrap();
    pole.settle(T0);
    // 20 years at 0.1 in/yr on each side.
    assert!((pole.current_hollow_diameter() - 4.0).abs() < 1e-12);
    let expected = physics::resisting_moment(0.85, 8000.0, 20.74, 4.0);
    assert!((pole.resisting_moment() - expected).abs() < 1e-6);
}

#[test]
fn pole_degraded_past_static_strength_fails_unbounded() {
    let mut pole = Pole::initialize(
        PoleProperties::new("pole-1", "WOOD-40", 1990),
        &catalog(1.0),
        &StructuresConfig::default(),
        T0,
    )
    .unwrap();
    pole.set_wind_speed(1.0);
    let next = cycle(&mut pole, T0).unwrap();
    assert_eq!(pole.resisting_moment(), 0.0);
    assert_eq!(pole.pole_stress(), f64::INFINITY);
    assert_eq!(pole.status(), PoleStatus::Failed);
    assert!(matches!(next, NextEvent::At(_)));
}

#[test]
fn future_install_year_is_accepted() {
    let pole = init(
        PoleProperties::new("pole-1", "WOOD-40", 2050),
        &StructuresConfig::default(),
    );
    assert_eq!(pole.install_year(), 2050);
}

#[test]
fn quiet_cycle_snapshot_keeps_resolved_no_wind_loads() {
    let mut properties = PoleProperties::new("pole-1", "WOOD-40", 2015);
    properties.wind_speed = 10.0;
    let pole = init(properties, &StructuresConfig::default());
    let mut assembly = PoleAssembly::new(pole).with_mount(Box::new(EquipmentMount {
        name: "xfmr".into(),
        height_ft: 30.0,
        offset_ft: 1.0,
        weight_lb: 450.0,
        area_sqft: 40.0,
        status: MountStatus::Online,
    }));

    let mut snapshots = Vec::new();
    for now in [T0, T0 + HOUR] {
        assembly.settle(now);
        assembly.top_down(now);
        assembly.bottom_up(now).unwrap();
        assembly.resolve(now).unwrap();
        assembly.commit(now);
        snapshots.push(assembly.pole().last_committed().cloned().unwrap());
    }

    // Constant wind: the second cycle recalculates nothing.
    assert!(!assembly.pole().recalc_pending());
    let (first, second) = (&snapshots[0], &snapshots[1]);
    assert!(first.equipment_moment_nowind > 0.0);
    assert_eq!(second.equipment_moment_nowind, first.equipment_moment_nowind);
    assert_eq!(second.equipment_moment, first.equipment_moment);
    assert_eq!(second.stress_polynomial, first.stress_polynomial);
    assert_eq!(
        assembly.pole().resolved_nowind().equipment_moment_nowind,
        first.equipment_moment_nowind
    );
}

#[test]
fn fractional_repair_time_wake_performs_the_repair() {
    let mut properties = PoleProperties::new("pole-1", "WOOD-40", 2015);
    properties.repair_time = Some(1.0001);
    let mut pole = init(properties, &StructuresConfig::default());
    pole.set_wind_speed(failing_wind_speed(1.1));

    let wake = match cycle(&mut pole, T0).unwrap() {
        NextEvent::At(wake) => wake,
        NextEvent::Never => panic!("failed pole must schedule a repair wake"),
    };
    assert_eq!(wake, T0 + HOUR + 1);

    pole.settle(wake);
    assert_eq!(pole.status(), PoleStatus::Ok);
    assert_eq!(pole.down_time(), None);
}
