//! `paint_core`: paint-shop buffer assignment and conveyor sequencing.
//!
//! No IO, no network. All randomness via the passed-in Rng.

pub mod admission;
mod color;
mod config;
mod engine;
mod error;
mod id;
mod lane;
mod picker;
pub mod snapshot;
mod stats;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use admission::{Admission, Placement};
pub use color::{generate_input_stream, ColorPriorityTable, Priority};
pub use config::{
    tick_delay_from_secs, ColorMixEntry, EmptyLanePolicy, LineConfig, StageConfig,
    MAX_LANES_PER_STAGE, MAX_LANE_CAPACITY, MAX_TICK_DELAY_SECS,
};
pub use engine::SimulationRun;
pub use error::{ConfigError, SimError};
pub use id::new_run_id;
pub use lane::{FrontColors, Lane, LaneBank};
pub use picker::Picker;
pub use snapshot::{compute_snapshot, Snapshot};
pub use stats::{SimulationStats, StatCounters};
pub use types::*;

pub(crate) fn emit(counters: &mut Counters, tick: u64, event: Event) -> EventEnvelope {
    let id = id::event_id(counters.next_event_id);
    counters.next_event_id += 1;
    EventEnvelope { id, tick, event }
}

#[cfg(test)]
mod tests;
