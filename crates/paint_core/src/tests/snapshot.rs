use super::*;

fn populated_run() -> SimulationRun {
    let mut run = base_run();
    for (i, name) in ["C1", "C2", "C1", "C3", "C1", "C4"].iter().enumerate() {
        run.apply(&TickAction::Admit {
            color: color(name),
            stage: Stage::for_stream_position(i),
        });
    }
    run.apply(&TickAction::Pick);
    run
}

#[test]
fn snapshot_query_is_idempotent() {
    let run = populated_run();
    let first = run.snapshot();
    let second = run.snapshot();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn snapshot_is_a_value_copy() {
    let mut run = populated_run();
    let before = run.snapshot();
    run.apply(&TickAction::Pick);
    assert_eq!(before.picker.total_picks, 1);
    assert_eq!(run.snapshot().picker.total_picks, 2);
}

#[test]
fn snapshot_lane_views() {
    let run = populated_run();
    let snap = run.snapshot();
    assert_eq!(snap.lanes.stage1.len(), 4);
    assert_eq!(snap.lanes.stage2.len(), 5);
    assert_eq!(snap.lanes.stage1[0].id, "L1");
    assert_eq!(snap.lanes.stage2[0].id, "L5");
    assert_eq!(snap.lanes.stage2[0].capacity, 16);
    let held: usize = snap
        .lanes
        .stage1
        .iter()
        .chain(&snap.lanes.stage2)
        .map(|lane| lane.current)
        .sum();
    assert_eq!(held, 5);
    assert!(snap
        .lanes
        .stage1
        .iter()
        .all(|lane| lane.vehicles.len() == lane.current));
}

#[test]
fn snapshot_kpis_follow_counters() {
    let run = populated_run();
    let snap = run.snapshot();
    assert_eq!(snap.tick, 7);
    assert_eq!(snap.kpis.throughput, 1);
    assert_eq!(snap.kpis.total_vehicles, 6);
    assert_eq!(snap.kpis.target_jph, 900);
    assert_eq!(snap.kpis.overflow_penalties, 0);
    // 5 of 136 slots.
    assert_eq!(snap.kpis.buffer_utilization_pct, 4);
    assert_eq!(snap.stats.admitted_by_color[&color("C1")], 3);
    assert_eq!(snap.picker.recent_sequence.len(), 1);
}

#[test]
fn recent_sequence_capped_at_window() {
    let mut run = base_run();
    for _ in 0..30 {
        fill_lane(&mut run, 4, "C1", 1);
        run.apply(&TickAction::Pick);
    }
    let snap = run.snapshot();
    assert_eq!(snap.picker.total_picks, 30);
    assert_eq!(snap.picker.recent_sequence.len(), 20);
    assert_eq!(snap.recent_operations.len(), 20);
}
