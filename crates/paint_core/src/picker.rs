//! Conveyor picker: greedy color sequencing over lane fronts.
//!
//! Stays on the current target color for as long as some lane front offers
//! it; otherwise switches to the first available front and counts a
//! changeover. The first target is the most common front color.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{ColorId, LaneBank, PickRecord, SimError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picker {
    current_target: Option<ColorId>,
    changeovers: u64,
    history: Vec<PickRecord>,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_target(&self) -> Option<&ColorId> {
        self.current_target.as_ref()
    }

    pub fn changeovers(&self) -> u64 {
        self.changeovers
    }

    pub fn history(&self) -> &[PickRecord] {
        &self.history
    }

    pub fn total_picks(&self) -> usize {
        self.history.len()
    }

    /// Colors of the last `n` picks, oldest first.
    pub fn recent_colors(&self, n: usize) -> Vec<ColorId> {
        let start = self.history.len().saturating_sub(n);
        self.history[start..]
            .iter()
            .map(|record| record.color.clone())
            .collect()
    }

    pub fn picked_by_color(&self) -> BTreeMap<ColorId, u64> {
        let mut tally = BTreeMap::new();
        for record in &self.history {
            *tally.entry(record.color.clone()).or_insert(0) += 1;
        }
        tally
    }

    /// Pulls the next vehicle off the bank.
    ///
    /// Lanes are scanned in global index order (stage one, then stage two).
    /// Returns `NothingToPick` when every lane is empty; the target is kept.
    pub fn pick_next(&mut self, bank: &mut LaneBank, tick: u64) -> Result<PickRecord, SimError> {
        let (lane, changeover) = {
            let fronts = bank.front_colors();
            if self.current_target.is_none() {
                self.current_target = most_frequent(&fronts).cloned();
            }
            let Some(target) = self.current_target.as_ref() else {
                return Err(SimError::NothingToPick);
            };

            if let Some(lane) = fronts.iter().position(|front| *front == Some(target)) {
                (lane, false)
            } else {
                let Some((lane, color)) = fronts
                    .iter()
                    .enumerate()
                    .find_map(|(lane, front)| front.map(|color| (lane, color)))
                else {
                    return Err(SimError::NothingToPick);
                };
                let changeover = color != target;
                self.current_target = Some(color.clone());
                (lane, changeover)
            }
        };

        let color = bank.pop_front(lane).ok_or(SimError::NothingToPick)?;
        if changeover {
            self.changeovers += 1;
        }
        let record = PickRecord {
            color,
            lane,
            tick,
            changeover,
        };
        tracing::debug!(color = %record.color, lane, changeover, "picked");
        self.history.push(record.clone());
        Ok(record)
    }
}

/// Most common front color; ties go to the color seen first in lane order.
fn most_frequent<'a>(fronts: &[Option<&'a ColorId>]) -> Option<&'a ColorId> {
    let mut counts: AHashMap<&ColorId, usize> = AHashMap::new();
    let mut order: Vec<&ColorId> = Vec::new();
    for &color in fronts.iter().flatten() {
        let count = counts.entry(color).or_insert(0);
        if *count == 0 {
            order.push(color);
        }
        *count += 1;
    }
    let mut best: Option<(&ColorId, usize)> = None;
    for color in order {
        let count = counts[&color];
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((color, count));
        }
    }
    best.map(|(color, _)| color)
}
