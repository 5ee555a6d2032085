//! Lane storage.
//!
//! A lane is a fixed-capacity FIFO. Vehicles always occupy a contiguous
//! prefix of the lane's slots, so "front" is slot 0 and the first empty slot
//! is the occupancy.

use std::collections::VecDeque;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{ColorId, LineConfig, SimError, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    stage: Stage,
    capacity: usize,
    vehicles: VecDeque<ColorId>,
}

impl Lane {
    pub fn new(stage: Stage, capacity: usize) -> Self {
        Self {
            stage,
            capacity,
            vehicles: VecDeque::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn occupancy(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_full(&self) -> bool {
        self.vehicles.len() >= self.capacity
    }

    pub fn front(&self) -> Option<&ColorId> {
        self.vehicles.front()
    }

    pub fn first_empty_slot(&self) -> Option<usize> {
        (!self.is_full()).then_some(self.vehicles.len())
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &ColorId> {
        self.vehicles.iter()
    }

    /// Slot-by-slot view, `capacity` entries long, empties trailing.
    pub fn slots(&self) -> Vec<Option<&ColorId>> {
        self.vehicles
            .iter()
            .map(Some)
            .chain(std::iter::repeat(None))
            .take(self.capacity)
            .collect()
    }

    fn push_back(&mut self, color: ColorId) -> Option<usize> {
        let slot = self.first_empty_slot()?;
        self.vehicles.push_back(color);
        Some(slot)
    }

    fn pop_front(&mut self) -> Option<ColorId> {
        self.vehicles.pop_front()
    }
}

/// Front colors of a stage's lanes, in lane order. Stages are small.
pub type FrontColors<'a> = SmallVec<[Option<&'a ColorId>; 8]>;

/// All lanes of the line. Stage-one lanes come first in global index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneBank {
    lanes: Vec<Lane>,
    stage1_lanes: usize,
}

impl LaneBank {
    pub fn from_config(config: &LineConfig) -> Self {
        let stage1 = config.stage1;
        let stage2 = config.stage2;
        let lanes = std::iter::repeat_with(|| Lane::new(Stage::One, stage1.capacity))
            .take(stage1.lanes)
            .chain(
                std::iter::repeat_with(|| Lane::new(Stage::Two, stage2.capacity))
                    .take(stage2.lanes),
            )
            .collect();
        Self {
            lanes,
            stage1_lanes: stage1.lanes,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn lane(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Global index range of the lanes in `stage`.
    pub fn lanes_of(&self, stage: Stage) -> Range<usize> {
        match stage {
            Stage::One => 0..self.stage1_lanes,
            Stage::Two => self.stage1_lanes..self.lanes.len(),
        }
    }

    pub fn front_colors_of(&self, stage: Stage) -> FrontColors<'_> {
        self.lanes[self.lanes_of(stage)]
            .iter()
            .map(Lane::front)
            .collect()
    }

    /// Front colors across every lane, stage one first.
    pub fn front_colors(&self) -> FrontColors<'_> {
        self.lanes.iter().map(Lane::front).collect()
    }

    pub fn first_empty_slot(&self, lane: usize) -> Option<usize> {
        self.lanes.get(lane).and_then(Lane::first_empty_slot)
    }

    /// Writes `color` into the first empty slot of `lane`, returning the slot.
    pub fn insert(&mut self, lane: usize, color: ColorId) -> Result<usize, SimError> {
        let target = self
            .lanes
            .get_mut(lane)
            .ok_or(SimError::UnknownLane { lane })?;
        target.push_back(color).ok_or(SimError::LaneFull { lane })
    }

    /// Removes the front vehicle of `lane`; the rest move up one slot.
    pub fn pop_front(&mut self, lane: usize) -> Option<ColorId> {
        self.lanes.get_mut(lane).and_then(Lane::pop_front)
    }

    pub fn total_vehicles(&self) -> usize {
        self.lanes.iter().map(Lane::occupancy).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(|lane| lane.occupancy() == 0)
    }

    pub fn stage_vehicles(&self, stage: Stage) -> usize {
        self.lanes[self.lanes_of(stage)]
            .iter()
            .map(Lane::occupancy)
            .sum()
    }

    pub fn stage_capacity(&self, stage: Stage) -> usize {
        self.lanes[self.lanes_of(stage)]
            .iter()
            .map(Lane::capacity)
            .sum()
    }

    pub fn total_capacity(&self) -> usize {
        self.lanes.iter().map(Lane::capacity).sum()
    }
}
