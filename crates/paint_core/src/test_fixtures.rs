//! Shared test fixtures for paint_core and downstream crates.
//!
//! `base_config()` is the reference line (4x14 + 5x16, reference color mix).
//! `small_config()` shrinks lanes so overflow scenarios need few vehicles.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::{ColorId, LineConfig, SimulationRun, StageConfig};

pub fn base_config() -> LineConfig {
    LineConfig::reference()
}

/// Two 2-slot lanes per stage; otherwise the reference config.
pub fn small_config() -> LineConfig {
    LineConfig {
        stage1: StageConfig {
            lanes: 2,
            capacity: 2,
        },
        stage2: StageConfig {
            lanes: 2,
            capacity: 2,
        },
        ..LineConfig::reference()
    }
}

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

pub fn color(name: &str) -> ColorId {
    ColorId::new(name)
}

pub fn run_with(config: LineConfig) -> SimulationRun {
    SimulationRun::new(config, Uuid::nil()).expect("fixture config is valid")
}

pub fn base_run() -> SimulationRun {
    run_with(base_config())
}

/// Writes `count` vehicles of `name` straight into `lane`, bypassing admission.
pub fn fill_lane(run: &mut SimulationRun, lane: usize, name: &str, count: usize) {
    for _ in 0..count {
        run.bank_mut()
            .insert(lane, color(name))
            .expect("fixture lane has room");
    }
}

/// Fills `lane` to capacity with `name`.
pub fn fill_lane_full(run: &mut SimulationRun, lane: usize, name: &str) {
    let free = run
        .bank()
        .lane(lane)
        .map_or(0, |l| l.capacity() - l.occupancy());
    fill_lane(run, lane, name, free);
}
