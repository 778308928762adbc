//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Pole entity and its per-timestep phase machine.
//!
//! Each cycle the host drives, in order: [`Pole::settle`] (inputs, degradation,
//! repair), [`Pole::top_down`] (accumulator reset), [`Pole::bottom_up`]
//! (peers call [`Pole::contribute`]), [`Pole::resolve`] (stress and failure)
//! and [`Pole::commit`]. Derived outputs are only recomputed on cycles where
//! settle raised the recalculation flag.

use std::fmt;
use std::sync::Arc;

use r_ems_common::time::{add_hours, hours_between, simulation_year};
use r_ems_common::{StructuresConfig, Timestamp};
use r_ems_logging::{ems_debug, ems_error, ems_info, ems_warn, LogContext};
use serde::{Deserialize, Serialize};

use crate::accumulators::{LoadAccumulators, MountLoad, NoWindAccumulators};
use crate::catalog::Catalog;
use crate::configuration::PoleConfiguration;
use crate::errors::{Result, SimulationHalt, StructuresError};
use crate::mount::WindExposure;
use crate::physics;
use crate::weather::{BindingOutcome, ResolvedInput, WeatherHandle};

const CLASS: &str = "pole";

/// Phase the pole was last driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Initialized,
    Settle,
    TopDown,
    BottomUp,
    Resolve,
    Commit,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initialized => "init",
            Phase::Settle => "settle",
            Phase::TopDown => "top_down",
            Phase::BottomUp => "bottom_up",
            Phase::Resolve => "resolve",
            Phase::Commit => "commit",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoleStatus {
    #[default]
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAILED")]
    Failed,
}

impl fmt::Display for PoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoleStatus::Ok => f.write_str("OK"),
            PoleStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Earliest simulation time a phase asks to be called again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum NextEvent {
    #[default]
    Never,
    At(Timestamp),
}

impl NextEvent {
    pub fn earliest(self, other: NextEvent) -> NextEvent {
        match (self, other) {
            (NextEvent::At(a), NextEvent::At(b)) => NextEvent::At(a.min(b)),
            (NextEvent::At(a), NextEvent::Never) | (NextEvent::Never, NextEvent::At(a)) => {
                NextEvent::At(a)
            }
            (NextEvent::Never, NextEvent::Never) => NextEvent::Never,
        }
    }

    pub fn timestamp(self) -> Option<Timestamp> {
        match self {
            NextEvent::At(t) => Some(t),
            NextEvent::Never => None,
        }
    }
}

/// User-supplied pole properties.
///
/// Angles are in degrees, wind speeds in m/s, heights in feet and the repair
/// time in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleProperties {
    pub name: String,
    #[serde(default)]
    pub configuration: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
    pub install_year: i32,
    #[serde(default)]
    pub repair_time: Option<f64>,
    #[serde(default)]
    pub tilt_angle: f64,
    #[serde(default)]
    pub tilt_direction: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_direction: f64,
    #[serde(default)]
    pub wind_gusts: f64,
    #[serde(default)]
    pub guy_height: f64,
    #[serde(default)]
    pub is_deadend: bool,
}

impl PoleProperties {
    pub fn new(name: impl Into<String>, configuration: impl Into<String>, install_year: i32) -> Self {
        Self {
            name: name.into(),
            configuration: Some(configuration.into()),
            weather: None,
            install_year,
            repair_time: None,
            tilt_angle: 0.0,
            tilt_direction: 0.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
            wind_gusts: 0.0,
            guy_height: 0.0,
            is_deadend: false,
        }
    }
}

/// Quadratic stress estimate `a·V² + b·V + c` published for fast consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StressPolynomial {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Committed state of a pole at the end of a timestep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoleSnapshot {
    pub name: String,
    pub timestamp: Timestamp,
    pub status: PoleStatus,
    pub pole_stress: f64,
    pub total_moment: f64,
    pub resisting_moment: f64,
    pub pole_moment: f64,
    pub pole_moment_nowind: f64,
    pub equipment_moment: f64,
    pub equipment_moment_nowind: f64,
    pub wire_moment: f64,
    pub wire_tension: f64,
    pub critical_wind_speed: f64,
    pub susceptibility: f64,
    pub wind_speed: f64,
    pub tilt_angle: f64,
    pub install_year: i32,
    pub down_time: Option<Timestamp>,
    pub stress_polynomial: StressPolynomial,
}

#[derive(Debug)]
pub struct Pole {
    name: String,
    configuration: Arc<PoleConfiguration>,
    weather: Option<WeatherHandle>,
    install_year: i32,
    repair_time_h: f64,
    stop_on_failure: bool,
    is_deadend: bool,
    guy_height: f64,
    height: f64,
    tilt_angle: f64,
    tilt_direction: f64,
    wind_speed: ResolvedInput,
    wind_direction: ResolvedInput,
    wind_gusts: ResolvedInput,
    current_hollow_diameter: f64,
    resisting_moment: f64,
    wind_pressure: f64,
    pole_moment: f64,
    pole_moment_nowind: f64,
    loads: LoadAccumulators,
    nowind: NoWindAccumulators,
    /// No-wind sums from the last resolution, published alongside `loads`.
    resolved_nowind: NoWindAccumulators,
    total_moment: f64,
    pole_stress: f64,
    susceptibility: f64,
    critical_wind_speed: f64,
    stress_polynomial: StressPolynomial,
    status: PoleStatus,
    down_time: Option<Timestamp>,
    last_wind_speed: Option<f64>,
    recalc: bool,
    phase: Phase,
    last_committed: Option<PoleSnapshot>,
}

impl Pole {
    /// Validate `properties` against the catalog and resolve every static parameter.
    pub fn initialize(
        properties: PoleProperties,
        catalog: &Catalog,
        settings: &StructuresConfig,
        now: Timestamp,
    ) -> Result<Pole> {
        let name = properties.name;
        let ctx = LogContext::new()
            .with_object(&name)
            .with_class(CLASS)
            .with_phase(Phase::Initialized.as_str())
            .with_timestamp(now);

        let configuration = match properties.configuration.as_deref() {
            None => {
                ems_error!(context = ctx, "configuration is not set to a pole_configuration object");
                return Err(StructuresError::MissingConfiguration { pole: name });
            }
            Some(config_name) => catalog.configuration(config_name).map_err(|err| {
                ems_error!(context = ctx, "{}", err);
                err
            })?,
        };
        ems_debug!(context = ctx, "configuration = {:?}", properties.configuration);

        let repair_time_h = resolve_repair_time(
            properties.repair_time,
            configuration.repair_time,
            settings.default_repair_time_h,
        )
        .ok_or_else(|| StructuresError::InvalidRepairTime {
            pole: name.clone(),
            hours: settings.default_repair_time_h,
        })?;
        ems_debug!(context = ctx, "repair_time = {} h", repair_time_h);

        let weather = match properties.weather.as_deref() {
            None => None,
            Some(weather_name) => match catalog.weather(weather_name) {
                Ok(feed) => Some(feed),
                Err(StructuresError::UnknownObject { .. }) => {
                    ems_warn!(
                        context = ctx,
                        "weather object '{}' not found, using local wind data only",
                        weather_name
                    );
                    None
                }
                Err(err) => return Err(err),
            },
        };

        let bind = |value: f64, field: &str, label: &str| {
            let (input, outcome) = ResolvedInput::resolve(value, weather.as_ref(), field);
            match outcome {
                BindingOutcome::Unbound => {}
                BindingOutcome::FieldMissing => ems_warn!(
                    context = ctx,
                    "weather data does not include {}, using local wind {} data only",
                    field,
                    label
                ),
                BindingOutcome::OverridesLocal => ems_warn!(
                    context = ctx,
                    "weather data will overwrite local wind {} data",
                    label
                ),
                BindingOutcome::Bound => {
                    ems_debug!(context = ctx, "wind {} bound to weather field '{}'", label, field)
                }
            }
            input
        };
        let wind_speed = bind(properties.wind_speed, settings.wind_speed_name.as_str(), "speed");
        let wind_direction = bind(
            properties.wind_direction,
            settings.wind_dir_name.as_str(),
            "direction",
        );
        let wind_gusts = bind(properties.wind_gusts, settings.wind_gust_name.as_str(), "gusts");

        if !(0.0..=90.0).contains(&properties.tilt_angle) {
            ems_error!(context = ctx, "pole tilt angle is not between 0 and 90 degrees");
            return Err(StructuresError::TiltAngleOutOfRange {
                pole: name,
                degrees: properties.tilt_angle,
            });
        }
        if !(0.0..360.0).contains(&properties.tilt_direction) {
            ems_error!(context = ctx, "pole tilt direction is not between 0 and 360 degrees");
            return Err(StructuresError::TiltDirectionOutOfRange {
                pole: name,
                degrees: properties.tilt_direction,
            });
        }

        let height = physics::effective_height(
            configuration.pole_length,
            configuration.pole_depth,
            properties.guy_height,
        );
        if height.is_nan() || height <= 0.0 {
            return Err(StructuresError::GuyHeightOutOfRange {
                pole: name,
                guy_height: properties.guy_height,
            });
        }
        ems_debug!(context = ctx, "height = {} ft", height);

        let diameter = physics::tapered_diameter(
            configuration.ground_diameter,
            configuration.top_diameter,
            height,
            configuration.above_ground_length(),
        );
        let resisting_moment = physics::resisting_moment(
            configuration.strength_factor_250b_wood,
            configuration.fiber_strength,
            diameter,
            0.0,
        );
        ems_debug!(context = ctx, "resisting_moment = {:.0} ft*lb", resisting_moment);

        let pole_moment_nowind = physics::pole_moment_nowind(
            height,
            configuration.ground_diameter,
            configuration.top_diameter,
            configuration.overload_factor_transverse_general,
        );
        ems_debug!(context = ctx, "pole_moment_nowind = {} ft*lb", pole_moment_nowind);

        if properties.install_year > simulation_year(now) {
            ems_warn!(
                context = ctx,
                "pole install year {} is in the future and is assumed to be the current time",
                properties.install_year
            );
        }

        Ok(Pole {
            configuration,
            weather,
            install_year: properties.install_year,
            repair_time_h,
            stop_on_failure: settings.stop_on_pole_failure,
            is_deadend: properties.is_deadend,
            guy_height: properties.guy_height,
            height,
            tilt_angle: properties.tilt_angle,
            tilt_direction: properties.tilt_direction,
            wind_speed,
            wind_direction,
            wind_gusts,
            current_hollow_diameter: 0.0,
            resisting_moment,
            wind_pressure: 0.0,
            pole_moment: 0.0,
            pole_moment_nowind,
            loads: LoadAccumulators::default(),
            nowind: NoWindAccumulators::default(),
            resolved_nowind: NoWindAccumulators::default(),
            total_moment: 0.0,
            pole_stress: 0.0,
            susceptibility: 0.0,
            critical_wind_speed: 0.0,
            stress_polynomial: StressPolynomial::default(),
            status: PoleStatus::Ok,
            down_time: None,
            last_wind_speed: Some(0.0),
            recalc: false,
            phase: Phase::Initialized,
            last_committed: None,
            name,
        })
    }

    fn context(&self, now: Timestamp) -> LogContext<'_> {
        LogContext::new()
            .with_object(&self.name)
            .with_class(CLASS)
            .with_phase(self.phase.as_str())
            .with_timestamp(now)
    }

    /// Refresh inputs, apply degradation, and either repair or re-evaluate wind load.
    pub fn settle(&mut self, now: Timestamp) -> NextEvent {
        self.phase = Phase::Settle;
        self.nowind.reset();

        let speed = self.wind_speed.refresh();
        self.wind_direction.refresh();
        self.wind_gusts.refresh();

        let age = f64::from(simulation_year(now) - self.install_year);
        let rate = self.configuration.degradation_rate;
        if age > 0.0 && rate > 0.0 {
            self.current_hollow_diameter = physics::hollow_diameter(age, rate);
            ems_debug!(
                context = self.context(now),
                "current_hollow_diameter = {} in",
                self.current_hollow_diameter
            );
        } else {
            ems_debug!(
                context = self.context(now),
                "pole degradation model disabled (age={}, degradation_rate={})",
                age,
                rate
            );
        }
        self.resisting_moment = self.ground_line_resisting_moment();

        match self.status {
            PoleStatus::Failed if self.repair_due(now) => self.repair(now),
            PoleStatus::Ok if self.last_wind_speed != Some(speed) => self.evaluate_wind(now, speed),
            _ => {}
        }
        NextEvent::Never
    }

    /// Zero the peer accumulators when a recalculation is pending.
    pub fn top_down(&mut self, now: Timestamp) -> NextEvent {
        self.phase = Phase::TopDown;
        if self.recalc {
            self.loads.reset();
            ems_debug!(context = self.context(now), "accumulators reset");
        }
        NextEvent::Never
    }

    /// Open the accumulation window; peers contribute through [`Pole::contribute`].
    pub fn bottom_up(&mut self, _now: Timestamp) -> NextEvent {
        self.phase = Phase::BottomUp;
        NextEvent::Never
    }

    /// Add one peer's loads. Returns `Ok(false)` when no recalculation is pending.
    pub fn contribute(&mut self, load: &MountLoad) -> Result<bool> {
        if self.phase != Phase::BottomUp {
            return Err(StructuresError::OutOfPhase {
                pole: self.name.clone(),
                expected: Phase::BottomUp,
                actual: self.phase,
            });
        }
        if !self.recalc {
            tracing::debug!(pole = %self.name, "ignoring contribution, no recalculation pending");
            return Ok(false);
        }
        load.apply(&mut self.loads, &mut self.nowind);
        Ok(true)
    }

    /// Compute totals, decide failure and schedule the repair wake.
    ///
    /// Returns [`StructuresError::Halt`] instead of a next event when the pole
    /// just failed and the stop-on-failure policy is set.
    pub fn resolve(&mut self, now: Timestamp) -> Result<NextEvent> {
        self.phase = Phase::Resolve;
        if !self.recalc {
            ems_debug!(context = self.context(now), "no pole recalculation flagged");
            return Ok(NextEvent::Never);
        }

        let wind_loaded = self.pole_moment + self.loads.wind_loaded_moment();
        self.total_moment = wind_loaded + self.loads.wire_tension;
        self.susceptibility =
            physics::susceptibility(wind_loaded, self.resisting_moment, self.wind_speed.value());
        self.pole_stress = physics::stress_ratio(self.total_moment, self.resisting_moment);

        self.resolved_nowind = self.nowind;
        let nowind_moment = self.pole_moment_nowind + self.resolved_nowind.moment();
        self.critical_wind_speed = physics::critical_wind_speed(
            self.resisting_moment,
            self.loads.wire_tension,
            nowind_moment,
        );
        self.stress_polynomial = StressPolynomial {
            a: nowind_moment,
            b: 0.0,
            c: self.loads.wire_tension,
        };
        ems_debug!(
            context = self.context(now),
            "total_moment = {} ft*lb, pole_stress = {}, critical_wind_speed = {} m/s",
            self.total_moment,
            self.pole_stress,
            self.critical_wind_speed
        );

        let previous = self.status;
        self.status = if self.pole_stress < 1.0 {
            PoleStatus::Ok
        } else {
            PoleStatus::Failed
        };
        self.recalc = false;

        if self.status == PoleStatus::Ok {
            return Ok(NextEvent::Never);
        }

        self.down_time = Some(now);
        ems_warn!(
            context = self.context(now),
            "pole failed at {:.0}% stress, time to repair is {} h",
            self.pole_stress * 100.0,
            self.repair_time_h
        );
        if self.stop_on_failure && previous == PoleStatus::Ok {
            return Err(SimulationHalt {
                pole: self.name.clone(),
                at: now,
                stress: self.pole_stress,
            }
            .into());
        }
        Ok(NextEvent::At(add_hours(now, self.repair_time_h)))
    }

    /// Record the committed state for the timestep.
    pub fn commit(&mut self, now: Timestamp) -> NextEvent {
        self.phase = Phase::Commit;
        self.last_committed = Some(self.snapshot(now));
        NextEvent::Never
    }

    fn ground_line_resisting_moment(&self) -> f64 {
        physics::resisting_moment(
            self.configuration.strength_factor_250b_wood,
            self.configuration.fiber_strength,
            self.configuration.ground_diameter,
            self.current_hollow_diameter,
        )
    }

    fn repair_due(&self, now: Timestamp) -> bool {
        self.down_time
            .is_some_and(|down| hours_between(down, now) >= self.repair_time_h)
    }

    fn repair(&mut self, now: Timestamp) {
        self.tilt_angle = 0.0;
        self.tilt_direction = 0.0;
        self.status = PoleStatus::Ok;
        self.install_year = simulation_year(now);
        self.current_hollow_diameter = 0.0;
        self.resisting_moment = self.ground_line_resisting_moment();
        self.pole_moment = 0.0;
        self.wind_pressure = 0.0;
        self.down_time = None;
        // Force a wind re-evaluation on the next settle.
        self.last_wind_speed = None;
        self.recalc = true;
        ems_info!(
            context = self.context(now),
            "pole repaired, install_year = {}",
            self.install_year
        );
    }

    fn evaluate_wind(&mut self, now: Timestamp, speed: f64) {
        if self.resisting_moment < 0.0 {
            ems_warn!(
                context = self.context(now),
                "pole has degraded past point of static failure"
            );
            self.resisting_moment = 0.0;
        }
        ems_debug!(
            context = self.context(now),
            "wind speed change to {} m/s requires update of pole analysis",
            speed
        );

        let config = Arc::clone(&self.configuration);
        let tilt_moment = if self.tilt_angle > 0.0 {
            physics::tilt_moment(
                config.material_density,
                self.height,
                config.ground_diameter,
                config.top_diameter,
                self.tilt_angle,
            )
        } else {
            0.0
        };

        self.wind_pressure = physics::wind_pressure(speed);
        self.pole_moment_nowind = physics::pole_moment_nowind(
            self.height,
            config.ground_diameter,
            config.top_diameter,
            config.overload_factor_transverse_general,
        );
        // Provisional: peer no-wind loads are folded in at resolution.
        self.critical_wind_speed = physics::critical_wind_speed(
            self.resisting_moment,
            self.loads.wire_tension,
            self.pole_moment_nowind + self.nowind.moment(),
        );
        self.last_wind_speed = Some(speed);

        let wind_moment = physics::wind_moment(
            self.wind_pressure,
            self.height,
            config.ground_diameter,
            config.top_diameter,
            config.overload_factor_transverse_general,
        );
        self.pole_moment = physics::compose_moment(
            tilt_moment,
            wind_moment,
            self.tilt_direction - self.wind_direction.value(),
        );
        ems_debug!(
            context = self.context(now),
            "wind_pressure = {} psf, pole_moment = {} ft*lb (with wind)",
            self.wind_pressure,
            self.pole_moment
        );
        self.recalc = true;
    }

    /// Wind state mounts use to compute their contribution this cycle.
    pub fn wind_exposure(&self) -> WindExposure {
        WindExposure {
            pressure: self.wind_pressure,
            speed: self.wind_speed.value(),
            direction: self.wind_direction.value(),
            overload_factor: self.configuration.overload_factor_transverse_general,
        }
    }

    pub fn snapshot(&self, now: Timestamp) -> PoleSnapshot {
        PoleSnapshot {
            name: self.name.clone(),
            timestamp: now,
            status: self.status,
            pole_stress: self.pole_stress,
            total_moment: self.total_moment,
            resisting_moment: self.resisting_moment,
            pole_moment: self.pole_moment,
            pole_moment_nowind: self.pole_moment_nowind,
            equipment_moment: self.loads.equipment_moment,
            equipment_moment_nowind: self.resolved_nowind.equipment_moment_nowind,
            wire_moment: self.loads.wire_moment,
            wire_tension: self.loads.wire_tension,
            critical_wind_speed: self.critical_wind_speed,
            susceptibility: self.susceptibility,
            wind_speed: self.wind_speed.value(),
            tilt_angle: self.tilt_angle,
            install_year: self.install_year,
            down_time: self.down_time,
            stress_polynomial: self.stress_polynomial,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &PoleConfiguration {
        &self.configuration
    }

    pub fn weather(&self) -> Option<&WeatherHandle> {
        self.weather.as_ref()
    }

    pub fn status(&self) -> PoleStatus {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn recalc_pending(&self) -> bool {
        self.recalc
    }

    pub fn install_year(&self) -> i32 {
        self.install_year
    }

    pub fn repair_time_h(&self) -> f64 {
        self.repair_time_h
    }

    pub fn is_deadend(&self) -> bool {
        self.is_deadend
    }

    pub fn guy_height(&self) -> f64 {
        self.guy_height
    }

    /// Effective height above the ground line, ft.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn tilt_angle(&self) -> f64 {
        self.tilt_angle
    }

    pub fn tilt_direction(&self) -> f64 {
        self.tilt_direction
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed.value()
    }

    pub fn wind_direction(&self) -> f64 {
        self.wind_direction.value()
    }

    pub fn wind_gusts(&self) -> f64 {
        self.wind_gusts.value()
    }

    /// Set the local wind speed. Overwritten on the next settle when bound to a feed.
    pub fn set_wind_speed(&mut self, speed: f64) {
        self.wind_speed = ResolvedInput::local(speed);
    }

    pub fn set_wind_direction(&mut self, direction: f64) {
        self.wind_direction = ResolvedInput::local(direction);
    }

    pub fn wind_speed_bound(&self) -> bool {
        self.wind_speed.is_bound()
    }

    pub fn current_hollow_diameter(&self) -> f64 {
        self.current_hollow_diameter
    }

    pub fn resisting_moment(&self) -> f64 {
        self.resisting_moment
    }

    pub fn wind_pressure(&self) -> f64 {
        self.wind_pressure
    }

    pub fn pole_moment(&self) -> f64 {
        self.pole_moment
    }

    pub fn pole_moment_nowind(&self) -> f64 {
        self.pole_moment_nowind
    }

    pub fn accumulators(&self) -> &LoadAccumulators {
        &self.loads
    }

    pub fn nowind_accumulators(&self) -> &NoWindAccumulators {
        &self.nowind
    }

    /// No-wind sums captured at the last resolution; stable across quiet cycles.
    pub fn resolved_nowind(&self) -> &NoWindAccumulators {
        &self.resolved_nowind
    }

    pub fn total_moment(&self) -> f64 {
        self.total_moment
    }

    pub fn pole_stress(&self) -> f64 {
        self.pole_stress
    }

    pub fn susceptibility(&self) -> f64 {
        self.susceptibility
    }

    pub fn critical_wind_speed(&self) -> f64 {
        self.critical_wind_speed
    }

    pub fn stress_polynomial(&self) -> StressPolynomial {
        self.stress_polynomial
    }

    pub fn down_time(&self) -> Option<Timestamp> {
        self.down_time
    }

    pub fn last_committed(&self) -> Option<&PoleSnapshot> {
        self.last_committed.as_ref()
    }
}

/// Pole value, then configuration value, then the process default; first positive wins.
fn resolve_repair_time(pole: Option<f64>, configuration: Option<f64>, default: f64) -> Option<f64> {
    [pole, configuration, Some(default)]
        .into_iter()
        .flatten()
        .find(|hours| *hours > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherStation;

    const T0: Timestamp = 1_577_836_800; // 2020-01-01

    fn configuration() -> PoleConfiguration {
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
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert_configuration("WOOD-40", configuration()).unwrap();
        catalog
    }

    fn pole(properties: PoleProperties) -> Result<Pole> {
        Pole::initialize(properties, &catalog(), &StructuresConfig::default(), T0)
    }

    #[test]
    fn repair_time_falls_back_in_order() {
        assert_eq!(resolve_repair_time(Some(4.0), Some(8.0), 24.0), Some(4.0));
        assert_eq!(resolve_repair_time(Some(0.0), Some(8.0), 24.0), Some(8.0));
        assert_eq!(resolve_repair_time(None, Some(-1.0), 24.0), Some(24.0));
        assert_eq!(resolve_repair_time(None, None, 0.0), None);
    }

    #[test]
    fn initialization_requires_a_configuration() {
        let mut properties = PoleProperties::new("p1", "WOOD-40", 2000);
        properties.configuration = None;
        assert!(matches!(
            pole(properties),
            Err(StructuresError::MissingConfiguration { .. })
        ));

        let properties = PoleProperties::new("p1", "nope", 2000);
        let err = pole(properties).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn initialization_rejects_bad_tilt() {
        let mut properties = PoleProperties::new("p1", "WOOD-40", 2000);
        properties.tilt_angle = 91.0;
        assert!(matches!(
            pole(properties.clone()),
            Err(StructuresError::TiltAngleOutOfRange { .. })
        ));
        properties.tilt_angle = 5.0;
        properties.tilt_direction = 360.0;
        assert!(matches!(
            pole(properties),
            Err(StructuresError::TiltDirectionOutOfRange { .. })
        ));
    }

    #[test]
    fn initialization_rejects_non_positive_repair_default() {
        let settings = StructuresConfig {
            default_repair_time_h: 0.0,
            ..StructuresConfig::default()
        };
        let err = Pole::initialize(
            PoleProperties::new("p1", "WOOD-40", 2000),
            &catalog(),
            &settings,
            T0,
        )
        .unwrap_err();
        assert!(matches!(err, StructuresError::InvalidRepairTime { .. }));
    }

    #[test]
    fn guy_height_must_leave_an_exposed_span() {
        let mut properties = PoleProperties::new("p1", "WOOD-40", 2000);
        properties.guy_height = 34.0;
        assert!(matches!(
            pole(properties),
            Err(StructuresError::GuyHeightOutOfRange { .. })
        ));
    }

    #[test]
    fn unknown_weather_object_falls_back_to_local_inputs() {
        let mut properties = PoleProperties::new("p1", "WOOD-40", 2000);
        properties.weather = Some("missing-station".into());
        properties.wind_speed = 3.0;
        let pole = pole(properties).unwrap();
        assert!(pole.weather().is_none());
        assert!(!pole.wind_speed_bound());
        assert_eq!(pole.wind_speed(), 3.0);
    }

    #[test]
    fn weather_binding_uses_configured_field_names() {
        let mut catalog = catalog();
        let station = Arc::new(WeatherStation::new("wx", [("ws", 7.0), ("wind_dir", 180.0)]));
        catalog.insert_weather("wx", station.clone()).unwrap();
        let settings = StructuresConfig {
            wind_speed_name: "ws".into(),
            ..StructuresConfig::default()
        };
        let mut properties = PoleProperties::new("p1", "WOOD-40", 2000);
        properties.weather = Some("wx".into());
        let mut pole = Pole::initialize(properties, &catalog, &settings, T0).unwrap();
        assert!(pole.wind_speed_bound());

        pole.settle(T0);
        assert_eq!(pole.wind_speed(), 7.0);
        assert_eq!(pole.wind_direction(), 180.0);
        assert_eq!(pole.wind_gusts(), 0.0);
        assert!(pole.recalc_pending());
    }

    #[test]
    fn weather_object_of_wrong_kind_is_rejected() {
        let mut properties = PoleProperties::new("p1", "WOOD-40", 2000);
        properties.weather = Some("WOOD-40".into());
        assert!(matches!(
            pole(properties),
            Err(StructuresError::WrongObjectKind { .. })
        ));
    }

    #[test]
    fn contributions_outside_bottom_up_are_rejected() {
        let mut pole = pole(PoleProperties::new("p1", "WOOD-40", 2000)).unwrap();
        pole.set_wind_speed(5.0);
        pole.settle(T0);
        let err = pole.contribute(&MountLoad::default()).unwrap_err();
        assert!(matches!(
            err,
            StructuresError::OutOfPhase {
                expected: Phase::BottomUp,
                actual: Phase::Settle,
                ..
            }
        ));
    }

    #[test]
    fn contributions_without_pending_recalc_are_ignored() {
        let mut pole = pole(PoleProperties::new("p1", "WOOD-40", 2000)).unwrap();
        pole.settle(T0);
        pole.top_down(T0);
        pole.bottom_up(T0);
        let load = MountLoad {
            equipment_moment: 100.0,
            ..MountLoad::default()
        };
        assert!(!pole.contribute(&load).unwrap());
        assert_eq!(pole.accumulators().equipment_moment, 0.0);
    }

    #[test]
    fn resolution_is_idempotent_once_flag_clears() {
        let mut pole = pole(PoleProperties::new("p1", "WOOD-40", 2000)).unwrap();
        pole.set_wind_speed(20.0);
        pole.settle(T0);
        pole.top_down(T0);
        pole.bottom_up(T0);
        assert_eq!(pole.resolve(T0).unwrap(), NextEvent::Never);
        let stress = pole.pole_stress();
        assert!(stress > 0.0 && stress < 1.0);
        assert!(!pole.recalc_pending());

        assert_eq!(pole.resolve(T0).unwrap(), NextEvent::Never);
        assert_eq!(pole.pole_stress(), stress);
        assert_eq!(pole.status(), PoleStatus::Ok);
    }

    #[test]
    fn tilt_adds_static_moment() {
        let mut properties = PoleProperties::new("p1", "WOOD-40", 2000);
        properties.tilt_angle = 15.0;
        let mut pole = pole(properties).unwrap();
        pole.set_wind_speed(1.0);
        pole.settle(T0);
        let expected_tilt = physics::tilt_moment(52.0, 34.0, 20.74, 9.87, 15.0);
        assert!(pole.pole_moment() > expected_tilt);
    }

    #[test]
    fn next_event_takes_the_earliest_wake() {
        assert_eq!(NextEvent::Never.earliest(NextEvent::At(5)), NextEvent::At(5));
        assert_eq!(NextEvent::At(9).earliest(NextEvent::At(5)), NextEvent::At(5));
        assert_eq!(NextEvent::Never.earliest(NextEvent::Never), NextEvent::Never);
        assert_eq!(NextEvent::At(3).timestamp(), Some(3));
    }

    #[test]
    fn status_serializes_in_upper_case() {
        assert_eq!(serde_json::to_string(&PoleStatus::Failed).unwrap(), "\"FAILED\"");
        assert_eq!(PoleStatus::Ok.to_string(), "OK");
    }
}
