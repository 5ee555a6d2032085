use super::*;

#[test]
fn first_vehicle_goes_to_lane_zero() {
    let mut run = base_run();
    let outcome = admit(&mut run, "C1", Stage::One);
    assert_eq!(
        outcome,
        Admission::Placed {
            placement: Placement {
                lane: 0,
                stage: Stage::One,
                reason: PlacementReason::FirstVehicle,
            },
            overflowed_from: None,
        }
    );
    assert_eq!(run.bank().lane(0).unwrap().slots()[0], Some(&color("C1")));
    assert_eq!(run.stats().counters().overflow_penalties, 0);
}

#[test]
fn first_vehicle_rule_applies_even_for_low_weight_color() {
    let mut run = base_run();
    admit(&mut run, "C12", Stage::One);
    assert_eq!(front(&run, 0), Some("C12"));
}

#[test]
fn stage_two_on_empty_bank_uses_first_stage_two_lane() {
    let mut run = base_run();
    let outcome = admit(&mut run, "C3", Stage::Two);
    assert_eq!(outcome.lane(), Some(4));
    assert!(matches!(
        outcome,
        Admission::Placed {
            placement: Placement {
                reason: PlacementReason::LowestPriority,
                ..
            },
            ..
        }
    ));
}

#[test]
fn color_match_keeps_like_colors_together() {
    let mut run = base_run();
    fill_lane(&mut run, 0, "C2", 1);
    fill_lane(&mut run, 1, "C1", 3);
    let outcome = admit(&mut run, "C1", Stage::One);
    assert_eq!(outcome.lane(), Some(1));
    assert_eq!(occupancy(&run, 1), 4);
}

#[test]
fn color_match_skips_full_matching_lane() {
    let mut run = base_run();
    fill_lane_full(&mut run, 0, "C1");
    fill_lane(&mut run, 1, "C3", 1);
    fill_lane(&mut run, 2, "C1", 1);
    let outcome = admit(&mut run, "C1", Stage::One);
    assert_eq!(outcome.lane(), Some(2));
    assert_eq!(outcome.overflowed_from(), None);
}

#[test]
fn lowest_priority_lane_chosen_without_match() {
    let mut run = base_run();
    fill_lane(&mut run, 0, "C1", 1);
    fill_lane(&mut run, 1, "C2", 1);
    fill_lane(&mut run, 2, "C5", 1);
    fill_lane(&mut run, 3, "C3", 1);
    let outcome = admit(&mut run, "C4", Stage::One);
    assert_eq!(outcome.lane(), Some(2));
    assert_eq!(front(&run, 2), Some("C5"));
    assert_eq!(occupancy(&run, 2), 2);
}

#[test]
fn lowest_priority_tie_keeps_first_lane() {
    let mut run = base_run();
    fill_lane(&mut run, 0, "C1", 1);
    fill_lane(&mut run, 1, "C6", 1);
    fill_lane(&mut run, 2, "C7", 1);
    fill_lane(&mut run, 3, "C2", 1);
    let outcome = admit(&mut run, "C3", Stage::One);
    assert_eq!(outcome.lane(), Some(1));
}

/// An empty front weighs +infinity, so the lane with C1 (weight 40) wins
/// over three empty lanes.
#[test]
fn empty_lane_loses_lowest_priority_scan() {
    let mut run = base_run();
    fill_lane(&mut run, 0, "C1", 1);
    let outcome = admit(&mut run, "C2", Stage::One);
    assert_eq!(outcome.lane(), Some(0));
    assert_eq!(occupancy(&run, 1), 0);
}

#[test]
fn preferred_policy_sends_vehicle_to_empty_lane() {
    let mut config = base_config();
    config.empty_lane_policy = EmptyLanePolicy::Preferred;
    let mut run = run_with(config);
    fill_lane(&mut run, 0, "C1", 1);
    let outcome = admit(&mut run, "C2", Stage::One);
    assert_eq!(outcome.lane(), Some(1));
}

#[test]
fn full_lane_zero_diverts_vehicle_away_from_it() {
    let mut run = base_run();
    fill_lane_full(&mut run, 0, "C1");
    let outcome = admit(&mut run, "C1", Stage::One);
    assert_ne!(outcome.lane(), Some(0));
    assert_eq!(occupancy(&run, 0), 14);
    // Lane 0 is the only weighted front in stage 1, so it is chosen, found
    // full, and the vehicle overflows to the first stage-2 lane.
    assert_eq!(outcome.lane(), Some(4));
    assert_eq!(outcome.overflowed_from(), Some(0));
    assert_eq!(run.stats().counters().overflow_penalties, 1);
}

#[test]
fn full_stage_one_overflows_to_stage_two() {
    let mut run = base_run();
    for (lane, name) in ["C1", "C3", "C4", "C2"].iter().enumerate() {
        fill_lane_full(&mut run, lane, name);
    }
    let outcome = admit(&mut run, "C2", Stage::One);
    let lane = outcome.lane().expect("placed in stage 2");
    assert!(run.bank().lanes_of(Stage::Two).contains(&lane));
    assert_eq!(run.stats().counters().overflow_penalties, 1);
    assert_eq!(run.stats().counters().total_admitted, 1);
}

#[test]
fn overflow_counted_once_per_event() {
    let mut run = base_run();
    for lane in 0..4 {
        fill_lane_full(&mut run, lane, "C1");
    }
    for _ in 0..3 {
        admit(&mut run, "C2", Stage::One);
    }
    assert_eq!(run.stats().counters().overflow_penalties, 3);
    let overflow_events = run
        .stats()
        .operation_log()
        .iter()
        .filter(|e| matches!(e.event, Event::OverflowPenalty { .. }))
        .count();
    assert_eq!(overflow_events, 3);
}

#[test]
fn full_stage_two_drops_vehicle() {
    let mut run = run_with(small_config());
    fill_lane_full(&mut run, 2, "C1");
    fill_lane_full(&mut run, 3, "C2");
    let outcome = admit(&mut run, "C3", Stage::Two);
    assert_eq!(
        outcome,
        Admission::Dropped {
            stage: Stage::Two,
            overflowed_from: None,
        }
    );
    let counters = run.stats().counters();
    assert_eq!(counters.dropped, 1);
    assert_eq!(counters.overflow_penalties, 0);
    assert_eq!(counters.total_admitted, 0);
}

#[test]
fn overflow_into_full_stage_two_drops_and_penalizes() {
    let mut run = run_with(small_config());
    for lane in 0..4 {
        fill_lane_full(&mut run, lane, "C1");
    }
    let outcome = admit(&mut run, "C1", Stage::One);
    assert_eq!(outcome.lane(), None);
    assert_eq!(outcome.overflowed_from(), Some(0));
    assert_eq!(run.stats().counters().overflow_penalties, 1);
    assert_eq!(run.stats().counters().dropped, 1);
    assert_eq!(run.bank().total_vehicles(), 8);
}

#[test]
fn unknown_color_front_treated_as_unweighted() {
    let mut run = base_run();
    fill_lane(&mut run, 0, "X9", 1);
    fill_lane(&mut run, 1, "C12", 1);
    let outcome = admit(&mut run, "C3", Stage::One);
    assert_eq!(outcome.lane(), Some(1));
}
