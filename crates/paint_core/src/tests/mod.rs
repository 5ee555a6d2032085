use super::*;
use crate::test_fixtures::{
    base_config, base_run, color, fill_lane, fill_lane_full, run_with, small_config,
};

mod admission;
mod snapshot;

// --- Shared test helpers ------------------------------------------------

fn admit(run: &mut SimulationRun, name: &str, stage: Stage) -> Admission {
    run.admit(&color(name), stage)
}

fn front(run: &SimulationRun, lane: usize) -> Option<&str> {
    run.bank()
        .lane(lane)
        .and_then(Lane::front)
        .map(ColorId::as_str)
}

fn occupancy(run: &SimulationRun, lane: usize) -> usize {
    run.bank().lane(lane).map_or(0, Lane::occupancy)
}
