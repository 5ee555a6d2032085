//! Color priority table and input-stream generation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{ColorId, ColorMixEntry, EmptyLanePolicy};

/// Static color -> weight lookup built from the configured mix.
///
/// Weights are compared as `Option<u32>`-like keys where "no weight" sorts
/// above every real weight (+infinity).
#[derive(Debug, Clone)]
pub struct ColorPriorityTable {
    entries: Vec<ColorMixEntry>,
    empty_lane_policy: EmptyLanePolicy,
}

/// Priority of a lane front. Lower is chosen first; `Unweighted` is +infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Weight(u32),
    Unweighted,
}

impl ColorPriorityTable {
    pub fn new(entries: Vec<ColorMixEntry>, empty_lane_policy: EmptyLanePolicy) -> Self {
        Self {
            entries,
            empty_lane_policy,
        }
    }

    pub fn entries(&self) -> &[ColorMixEntry] {
        &self.entries
    }

    pub fn weight(&self, color: &ColorId) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| &entry.color == color)
            .map(|entry| entry.weight)
    }

    /// Priority of a lane whose front is `front` (`None` for an empty lane).
    /// Colors missing from the table are unweighted.
    pub fn priority_of_front(&self, front: Option<&ColorId>) -> Priority {
        match front {
            Some(color) => self
                .weight(color)
                .map_or(Priority::Unweighted, Priority::Weight),
            None => match self.empty_lane_policy {
                EmptyLanePolicy::LastResort => Priority::Unweighted,
                EmptyLanePolicy::Preferred => Priority::Weight(0),
            },
        }
    }
}

/// Builds a shuffled stream of `total` vehicles whose colors follow `mix`.
///
/// Each color contributes `round(weight / 100 * total)` vehicles with ties
/// rounded to even, so the stream length can differ slightly from `total`.
pub fn generate_input_stream(
    total: usize,
    mix: &[ColorMixEntry],
    rng: &mut impl Rng,
) -> Vec<ColorId> {
    let mut colors = Vec::with_capacity(total);
    for entry in mix {
        let count = (f64::from(entry.weight) / 100.0 * total as f64).round_ties_even();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = count.max(0.0) as usize;
        colors.extend(std::iter::repeat(entry.color.clone()).take(count));
    }
    colors.shuffle(rng);
    colors
}
