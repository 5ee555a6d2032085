//! Admission policy: which lane receives an incoming vehicle.
//!
//! Within a stage: color match first, then the lane whose front has the
//! lowest priority weight. Stage one overflows into stage two exactly once;
//! stage two has nowhere further to go.

use crate::color::{ColorPriorityTable, Priority};
use crate::{ColorId, LaneBank, PlacementReason, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub lane: usize,
    pub stage: Stage,
    pub reason: PlacementReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Placed {
        placement: Placement,
        /// Full stage-one lane that forced the overflow, if any.
        overflowed_from: Option<usize>,
    },
    Dropped {
        stage: Stage,
        overflowed_from: Option<usize>,
    },
}

impl Admission {
    pub fn lane(&self) -> Option<usize> {
        match self {
            Admission::Placed { placement, .. } => Some(placement.lane),
            Admission::Dropped { .. } => None,
        }
    }

    pub fn overflowed_from(&self) -> Option<usize> {
        match self {
            Admission::Placed {
                overflowed_from, ..
            }
            | Admission::Dropped {
                overflowed_from, ..
            } => *overflowed_from,
        }
    }
}

/// Places `color` in a lane of `stage`, overflowing stage one into stage two.
pub fn admit(
    bank: &mut LaneBank,
    table: &ColorPriorityTable,
    color: &ColorId,
    stage: Stage,
) -> Admission {
    let overflowed_from = match try_stage(bank, table, color, stage) {
        Ok(placement) => {
            return Admission::Placed {
                placement,
                overflowed_from: None,
            }
        }
        Err(full_lane) => full_lane,
    };

    if stage == Stage::Two {
        return Admission::Dropped {
            stage,
            overflowed_from: None,
        };
    }

    tracing::debug!(%color, lane = overflowed_from, "stage 1 full, overflowing to stage 2");
    match try_stage(bank, table, color, Stage::Two) {
        Ok(placement) => Admission::Placed {
            placement,
            overflowed_from: Some(overflowed_from),
        },
        Err(_) => Admission::Dropped {
            stage: Stage::Two,
            overflowed_from: Some(overflowed_from),
        },
    }
}

/// Single-stage placement. On failure returns the lane that was chosen but
/// had no room.
fn try_stage(
    bank: &mut LaneBank,
    table: &ColorPriorityTable,
    color: &ColorId,
    stage: Stage,
) -> Result<Placement, usize> {
    let lanes = bank.lanes_of(stage);

    if stage == Stage::One && bank.is_empty() {
        return place(bank, color, lanes.start, stage, PlacementReason::FirstVehicle);
    }

    let (lane, reason) = {
        let fronts = bank.front_colors_of(stage);
        let matching = fronts
            .iter()
            .zip(lanes.clone())
            .find(|(front, lane)| **front == Some(color) && bank.first_empty_slot(*lane).is_some())
            .map(|(_, lane)| lane);
        match matching {
            Some(lane) => (lane, PlacementReason::ColorMatch),
            None => (
                lowest_priority_lane(table, &fronts, lanes.start),
                PlacementReason::LowestPriority,
            ),
        }
    };
    place(bank, color, lane, stage, reason)
}

/// First lane whose front has the strictly lowest priority; `first` when all
/// fronts are unweighted.
fn lowest_priority_lane(
    table: &ColorPriorityTable,
    fronts: &[Option<&ColorId>],
    first: usize,
) -> usize {
    let mut best = (first, Priority::Unweighted);
    for (offset, front) in fronts.iter().enumerate() {
        let priority = table.priority_of_front(*front);
        if priority < best.1 {
            best = (first + offset, priority);
        }
    }
    best.0
}

fn place(
    bank: &mut LaneBank,
    color: &ColorId,
    lane: usize,
    stage: Stage,
    reason: PlacementReason,
) -> Result<Placement, usize> {
    bank.insert(lane, color.clone())
        .map(|_| Placement {
            lane,
            stage,
            reason,
        })
        .map_err(|_| lane)
}
