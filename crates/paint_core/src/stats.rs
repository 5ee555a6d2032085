//! Run counters and the append-only operation log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ColorId, Event, EventEnvelope};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounters {
    /// Vehicles placed in a lane (overflowed ones included, dropped ones not).
    pub total_admitted: u64,
    pub admitted_by_color: BTreeMap<ColorId, u64>,
    pub overflow_penalties: u64,
    pub dropped: u64,
    pub nothing_to_pick: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    counters: StatCounters,
    operation_log: Vec<EventEnvelope>,
}

impl SimulationStats {
    pub fn counters(&self) -> &StatCounters {
        &self.counters
    }

    pub fn operation_log(&self) -> &[EventEnvelope] {
        &self.operation_log
    }

    /// Last `n` log entries, oldest first.
    pub fn recent_operations(&self, n: usize) -> &[EventEnvelope] {
        let start = self.operation_log.len().saturating_sub(n);
        &self.operation_log[start..]
    }

    /// Folds one event into the counters and appends it to the log.
    pub fn record(&mut self, envelope: EventEnvelope) {
        let counters = &mut self.counters;
        match &envelope.event {
            Event::VehicleAdmitted { color, .. } => {
                counters.total_admitted += 1;
                *counters.admitted_by_color.entry(color.clone()).or_insert(0) += 1;
            }
            Event::OverflowPenalty { .. } => counters.overflow_penalties += 1,
            Event::VehicleDropped { .. } => counters.dropped += 1,
            Event::NothingToPick => counters.nothing_to_pick += 1,
            Event::VehiclePicked { .. } => {}
        }
        self.operation_log.push(envelope);
    }
}
