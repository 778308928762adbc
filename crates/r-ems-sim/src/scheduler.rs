//! ---
//! ems_section: "11-simulation-test-harness"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Simulation runtime helpers and scenario engines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Host driver for the pole phase protocol.
//!
//! Every pass completes for the whole population before the next pass
//! starts, so all peer contributions land before any pole resolves.

use std::collections::BTreeSet;
use std::sync::Arc;

use r_ems_common::time::display_timestamp;
use r_ems_common::{SimulationConfig, StructuresConfig, Timestamp};
use r_ems_logging::{log_system_event, LogContext, SystemEventOutcome};
use r_ems_structures::{
    NextEvent, PoleAssembly, PoleStatus, SimulationHalt, WeatherFeed, WeatherStation,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::errors::{Result, SimError};
use crate::report::{PoleEvent, PoleEventKind, SimulationReport};
use crate::weather_tape::WeatherTape;

/// A weather station and the tape that drives it.
#[derive(Debug, Clone)]
pub struct WeatherReplay {
    pub station: Arc<WeatherStation>,
    pub tape: WeatherTape,
}

impl WeatherReplay {
    pub fn new(station: Arc<WeatherStation>, tape: WeatherTape) -> Self {
        Self { station, tape }
    }
}

/// Result of one timestep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub next: NextEvent,
    pub events: Vec<PoleEvent>,
    pub halted: Option<SimulationHalt>,
}

#[derive(Debug)]
pub struct PhaseScheduler {
    assemblies: Vec<PoleAssembly>,
    weather: Vec<WeatherReplay>,
    names: StructuresConfig,
    window: SimulationConfig,
    rng: Option<StdRng>,
    /// Wake times requested by earlier steps that have not been reached yet.
    wakes: BTreeSet<Timestamp>,
}

impl PhaseScheduler {
    pub fn new(
        assemblies: Vec<PoleAssembly>,
        weather: Vec<WeatherReplay>,
        names: StructuresConfig,
        window: SimulationConfig,
    ) -> Self {
        let rng = window.seed.map(StdRng::seed_from_u64);
        Self {
            assemblies,
            weather,
            names,
            window,
            rng,
            wakes: BTreeSet::new(),
        }
    }

    pub fn assemblies(&self) -> &[PoleAssembly] {
        &self.assemblies
    }

    pub fn assemblies_mut(&mut self) -> &mut [PoleAssembly] {
        &mut self.assemblies
    }

    pub fn assembly(&self, name: &str) -> Option<&PoleAssembly> {
        self.assemblies.iter().find(|assembly| assembly.name() == name)
    }

    /// Visiting order for a random-order pass.
    fn random_order(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.assemblies.len()).collect();
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }
        order
    }

    fn publish_weather(&self, now: Timestamp) {
        for replay in &self.weather {
            if !replay.tape.publish_at(&replay.station, now, &self.names) {
                debug!(
                    station = %replay.station.name(),
                    timestamp = now,
                    "no weather sample yet, keeping previous values"
                );
            }
        }
    }

    /// Run every pass once at `now`.
    ///
    /// A halt request stops the step after the resolution pass; the commit
    /// pass is skipped.
    pub fn step(&mut self, now: Timestamp) -> Result<StepOutcome> {
        let mut outcome = StepOutcome::default();
        self.publish_weather(now);

        for idx in self.random_order() {
            let assembly = &mut self.assemblies[idx];
            let before = assembly.pole().status();
            outcome.next = outcome.next.earliest(assembly.settle(now));
            let pole = assembly.pole();
            if before == PoleStatus::Failed && pole.status() == PoleStatus::Ok {
                info!(pole = %pole.name(), timestamp = now, "pole repaired");
                outcome.events.push(PoleEvent {
                    pole: pole.name().to_owned(),
                    at: now,
                    kind: PoleEventKind::Repaired {
                        install_year: pole.install_year(),
                    },
                });
            }
        }

        for assembly in &mut self.assemblies {
            outcome.next = outcome.next.earliest(assembly.top_down(now));
        }

        for assembly in self.assemblies.iter_mut().rev() {
            assembly.bottom_up(now)?;
        }

        for assembly in &mut self.assemblies {
            let before = assembly.pole().status();
            let resolved = assembly.resolve(now);
            let pole = assembly.pole();
            if before == PoleStatus::Ok && pole.status() == PoleStatus::Failed {
                let repair_at = resolved.as_ref().ok().and_then(|next| next.timestamp());
                outcome.events.push(PoleEvent {
                    pole: pole.name().to_owned(),
                    at: now,
                    kind: PoleEventKind::Failed {
                        stress: pole.pole_stress(),
                        repair_at,
                    },
                });
            }
            match resolved {
                Ok(next) => outcome.next = outcome.next.earliest(next),
                Err(err) => match err.as_halt() {
                    // Keep resolving so every pole reports a consistent state.
                    Some(halt) if outcome.halted.is_none() => outcome.halted = Some(halt.clone()),
                    Some(_) => {}
                    None => return Err(SimError::Structures(err)),
                },
            }
        }

        if outcome.halted.is_some() {
            return Ok(outcome);
        }

        for idx in self.random_order() {
            let assembly = &mut self.assemblies[idx];
            outcome.next = outcome.next.earliest(assembly.commit(now));
        }
        Ok(outcome)
    }

    /// Next step time: one timestep ahead, or the earliest pending wake if sooner.
    fn advance(&mut self, now: Timestamp, timestep: i64, requested: NextEvent) -> Timestamp {
        if let NextEvent::At(wake) = requested {
            self.wakes.insert(wake);
        }
        self.wakes.retain(|wake| *wake > now);
        let regular = now.saturating_add(timestep);
        match self.wakes.first() {
            Some(&wake) if wake < regular => {
                debug!(wake, "advancing to scheduled wake");
                wake
            }
            _ => regular,
        }
    }

    /// Step from start to stop, waking early for pending repairs.
    pub fn run(&mut self) -> Result<SimulationReport> {
        let start = self.window.start_timestamp();
        let stop = self.window.stop_timestamp();
        if stop < start {
            return Err(SimError::EmptyWindow { start, stop });
        }
        let timestep = self.window.timestep_secs().max(1);
        let mut report = SimulationReport::new(start, stop);

        let ctx = LogContext::new().with_object("scheduler").with_timestamp(start);
        log_system_event(
            Some(&ctx),
            "simulation.start",
            &format!(
                "{} poles from {} to {}",
                self.assemblies.len(),
                display_timestamp(start),
                display_timestamp(stop)
            ),
            SystemEventOutcome::Success,
        );

        let mut now = start;
        while now <= stop {
            let outcome = self.step(now)?;
            report.steps.push(now);
            report.events.extend(outcome.events);

            if let Some(halt) = outcome.halted {
                warn!(pole = %halt.pole, timestamp = now, "simulation halted by pole failure");
                let ctx = LogContext::new().with_object(&halt.pole).with_timestamp(now);
                log_system_event(
                    Some(&ctx),
                    "simulation.halt",
                    &halt.to_string(),
                    SystemEventOutcome::Fault,
                );
                report.halted = Some(halt);
                return Ok(report);
            }

            report.snapshots.extend(
                self.assemblies
                    .iter()
                    .filter_map(|assembly| assembly.pole().last_committed().cloned()),
            );

            now = self.advance(now, timestep, outcome.next);
        }

        let ctx = LogContext::new().with_object("scheduler").with_timestamp(stop);
        log_system_event(
            Some(&ctx),
            "simulation.done",
            &format!(
                "{} steps, {} failures, {} repairs",
                report.steps.len(),
                report.failures().count(),
                report.repairs().count()
            ),
            SystemEventOutcome::Success,
        );
        Ok(report)
    }
}
