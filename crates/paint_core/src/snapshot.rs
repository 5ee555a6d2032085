//! Point-in-time view of a run for external consumers.
//!
//! `compute_snapshot(&SimulationRun) -> Snapshot` derives everything from the
//! lane bank, the picker and the stats. No state mutation, no IO.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ColorId, EventEnvelope, Lane, SimulationRun, Stage};

const WARNING_FILL: f64 = 0.7;
const CRITICAL_FILL: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneStatus {
    Active,
    Warning,
    Critical,
}

impl LaneStatus {
    fn from_fill(current: usize, capacity: usize) -> Self {
        let fill = current as f64 / capacity.max(1) as f64;
        if fill >= CRITICAL_FILL {
            LaneStatus::Critical
        } else if fill >= WARNING_FILL {
            LaneStatus::Warning
        } else {
            LaneStatus::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneView {
    /// Display id, `L1` for global lane 0.
    pub id: String,
    pub index: usize,
    pub capacity: usize,
    pub current: usize,
    /// Front first.
    pub vehicles: Vec<ColorId>,
    pub status: LaneStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneViews {
    pub stage1: Vec<LaneView>,
    pub stage2: Vec<LaneView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickerView {
    pub current_target: Option<ColorId>,
    pub total_picks: usize,
    pub changeovers: u64,
    pub recent_sequence: Vec<ColorId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub throughput: usize,
    pub target_jph: u32,
    pub changeovers: u64,
    pub buffer_utilization_pct: u32,
    pub overflow_penalties: u64,
    pub total_vehicles: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsView {
    pub stage1_utilization_pct: f64,
    pub stage2_utilization_pct: f64,
    pub admitted_by_color: BTreeMap<ColorId, u64>,
    pub picked_by_color: BTreeMap<ColorId, u64>,
    pub nothing_to_pick: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub run_id: Uuid,
    pub tick: u64,
    pub lanes: LaneViews,
    pub picker: PickerView,
    pub kpis: Kpis,
    pub stats: StatsView,
    pub recent_operations: Vec<EventEnvelope>,
}

pub fn compute_snapshot(run: &SimulationRun) -> Snapshot {
    let bank = run.bank();
    let picker = run.picker();
    let counters = run.stats().counters();
    let window = run.config().recent_window;

    let lane_views = |stage: Stage| -> Vec<LaneView> {
        bank.lanes_of(stage)
            .filter_map(|index| bank.lane(index).map(|lane| lane_view(index, lane)))
            .collect()
    };

    let utilization = |vehicles: usize, capacity: usize| vehicles as f64 / capacity.max(1) as f64;
    let overall = utilization(bank.total_vehicles(), bank.total_capacity());
    let stage_pct = |stage: Stage| {
        let fraction = utilization(bank.stage_vehicles(stage), bank.stage_capacity(stage));
        (fraction * 1000.0).round_ties_even() / 10.0
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let buffer_utilization_pct = (overall * 100.0).round_ties_even() as u32;

    Snapshot {
        run_id: run.id(),
        tick: run.tick(),
        lanes: LaneViews {
            stage1: lane_views(Stage::One),
            stage2: lane_views(Stage::Two),
        },
        picker: PickerView {
            current_target: picker.current_target().cloned(),
            total_picks: picker.total_picks(),
            changeovers: picker.changeovers(),
            recent_sequence: picker.recent_colors(window),
        },
        kpis: Kpis {
            throughput: picker.total_picks(),
            target_jph: run.config().target_jph,
            changeovers: picker.changeovers(),
            buffer_utilization_pct,
            overflow_penalties: counters.overflow_penalties,
            total_vehicles: counters.total_admitted,
            dropped: counters.dropped,
        },
        stats: StatsView {
            stage1_utilization_pct: stage_pct(Stage::One),
            stage2_utilization_pct: stage_pct(Stage::Two),
            admitted_by_color: counters.admitted_by_color.clone(),
            picked_by_color: picker.picked_by_color(),
            nothing_to_pick: counters.nothing_to_pick,
        },
        recent_operations: run.stats().recent_operations(window).to_vec(),
    }
}

fn lane_view(index: usize, lane: &Lane) -> LaneView {
    LaneView {
        id: format!("L{}", index + 1),
        index,
        capacity: lane.capacity(),
        current: lane.occupancy(),
        vehicles: lane.vehicles().cloned().collect(),
        status: LaneStatus::from_fill(lane.occupancy(), lane.capacity()),
    }
}
