//! ---
//! ems_section: "11-simulation-test-harness"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Simulation runtime helpers and scenario engines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use indexmap::IndexMap;
use r_ems_common::Timestamp;
use r_ems_structures::{PoleSnapshot, PoleStatus, SimulationHalt};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoleEventKind {
    Failed { stress: f64, repair_at: Option<Timestamp> },
    Repaired { install_year: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoleEvent {
    pub pole: String,
    pub at: Timestamp,
    #[serde(flatten)]
    pub kind: PoleEventKind,
}

/// Per-pole rollup of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoleSummary {
    pub name: String,
    pub final_status: PoleStatus,
    pub max_stress: f64,
    pub failures: usize,
    pub repairs: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    pub start: Timestamp,
    pub stop: Timestamp,
    /// Every timestep the scheduler executed, in order.
    pub steps: Vec<Timestamp>,
    pub snapshots: Vec<PoleSnapshot>,
    pub events: Vec<PoleEvent>,
    pub halted: Option<SimulationHalt>,
}

impl SimulationReport {
    pub fn new(start: Timestamp, stop: Timestamp) -> Self {
        Self {
            start,
            stop,
            ..Self::default()
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PoleEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event.kind, PoleEventKind::Failed { .. }))
    }

    pub fn repairs(&self) -> impl Iterator<Item = &PoleEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event.kind, PoleEventKind::Repaired { .. }))
    }

    pub fn snapshots_for<'a>(&'a self, pole: &'a str) -> impl Iterator<Item = &'a PoleSnapshot> {
        self.snapshots.iter().filter(move |snapshot| snapshot.name == pole)
    }

    /// Summaries in first-seen pole order.
    pub fn summaries(&self) -> Vec<PoleSummary> {
        let mut summaries: IndexMap<&str, PoleSummary> = IndexMap::new();
        for snapshot in &self.snapshots {
            let summary = summaries
                .entry(snapshot.name.as_str())
                .or_insert_with(|| PoleSummary {
                    name: snapshot.name.clone(),
                    final_status: snapshot.status,
                    max_stress: 0.0,
                    failures: 0,
                    repairs: 0,
                });
            summary.final_status = snapshot.status;
            summary.max_stress = summary.max_stress.max(snapshot.pole_stress);
        }
        for event in &self.events {
            if let Some(summary) = summaries.get_mut(event.pole.as_str()) {
                match event.kind {
                    PoleEventKind::Failed { .. } => summary.failures += 1,
                    PoleEventKind::Repaired { .. } => summary.repairs += 1,
                }
            }
        }
        if let Some(halt) = &self.halted {
            // A halting pole skips commit, so its last snapshot predates the failure.
            if let Some(summary) = summaries.get_mut(halt.pole.as_str()) {
                summary.final_status = PoleStatus::Failed;
                summary.max_stress = summary.max_stress.max(halt.stress);
            }
        }
        summaries.into_values().collect()
    }
}
