//! Line configuration: lane layout, color mix and loop timing.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ColorId, ConfigError, Stage};

/// Upper bound on lanes per stage.
pub const MAX_LANES_PER_STAGE: usize = 256;
/// Upper bound on vehicles held by one lane.
pub const MAX_LANE_CAPACITY: usize = 10_000;
/// Upper bound on the delay between ticks, in seconds.
pub const MAX_TICK_DELAY_SECS: f64 = 3600.0;

/// Converts a tick delay in seconds, rejecting NaN, non-positive and
/// out-of-range values.
pub fn tick_delay_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    if secs.is_nan() || secs <= 0.0 {
        return Err(ConfigError::NonPositiveDelay { secs });
    }
    let out_of_range = ConfigError::DelayOutOfRange {
        secs,
        max_secs: MAX_TICK_DELAY_SECS,
    };
    if secs > MAX_TICK_DELAY_SECS {
        return Err(out_of_range);
    }
    Duration::try_from_secs_f64(secs).map_err(|_| out_of_range)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub lanes: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMixEntry {
    pub color: ColorId,
    /// Target share of production, in percent. Doubles as the color's
    /// priority weight when choosing a lane.
    pub weight: u32,
}

/// How an empty lane front is weighed in the lowest-priority scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyLanePolicy {
    /// Empty front weighs +infinity: any lane holding a known color is
    /// chosen before an empty one.
    #[default]
    LastResort,
    /// Empty front weighs zero: empty lanes win the scan.
    Preferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    pub stage1: StageConfig,
    pub stage2: StageConfig,
    pub color_mix: Vec<ColorMixEntry>,
    pub vehicles_per_run: usize,
    /// Every `pick_every`-th tick (0-based) is a pick; the rest admit.
    pub pick_every: u64,
    pub tick_delay_secs: f64,
    pub snapshot_send_timeout_ms: u64,
    /// How many picks and log entries a snapshot carries.
    pub recent_window: usize,
    pub target_jph: u32,
    #[serde(default)]
    pub empty_lane_policy: EmptyLanePolicy,
}

impl LineConfig {
    /// Four 14-slot lanes feeding oven one, five 16-slot lanes feeding oven two.
    pub fn reference() -> Self {
        let mix = [
            ("C1", 40),
            ("C2", 25),
            ("C3", 12),
            ("C4", 8),
            ("C5", 3),
            ("C6", 2),
            ("C7", 2),
            ("C8", 2),
            ("C9", 2),
            ("C10", 2),
            ("C11", 2),
            ("C12", 1),
        ];
        Self {
            stage1: StageConfig {
                lanes: 4,
                capacity: 14,
            },
            stage2: StageConfig {
                lanes: 5,
                capacity: 16,
            },
            color_mix: mix
                .iter()
                .map(|&(color, weight)| ColorMixEntry {
                    color: ColorId::new(color),
                    weight,
                })
                .collect(),
            vehicles_per_run: 50,
            pick_every: 3,
            tick_delay_secs: 1.0,
            snapshot_send_timeout_ms: 5_000,
            recent_window: 20,
            target_jph: 900,
            empty_lane_policy: EmptyLanePolicy::LastResort,
        }
    }

    pub fn stage(&self, stage: Stage) -> StageConfig {
        match stage {
            Stage::One => self.stage1,
            Stage::Two => self.stage2,
        }
    }

    pub fn tick_delay(&self) -> Result<Duration, ConfigError> {
        tick_delay_from_secs(self.tick_delay_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for stage in [Stage::One, Stage::Two] {
            let layout = self.stage(stage);
            if layout.lanes == 0 {
                return Err(ConfigError::NoLanes { stage });
            }
            if layout.lanes > MAX_LANES_PER_STAGE {
                return Err(ConfigError::TooManyLanes {
                    stage,
                    lanes: layout.lanes,
                    max: MAX_LANES_PER_STAGE,
                });
            }
            if layout.capacity == 0 {
                return Err(ConfigError::ZeroCapacity { stage });
            }
            if layout.capacity > MAX_LANE_CAPACITY {
                return Err(ConfigError::CapacityTooLarge {
                    stage,
                    capacity: layout.capacity,
                    max: MAX_LANE_CAPACITY,
                });
            }
        }
        if self.color_mix.is_empty() {
            return Err(ConfigError::EmptyColorMix);
        }
        let mut seen = HashSet::new();
        for entry in &self.color_mix {
            if !seen.insert(&entry.color) {
                return Err(ConfigError::DuplicateColor {
                    color: entry.color.0.clone(),
                });
            }
        }
        self.tick_delay()?;
        if self.pick_every == 0 {
            return Err(ConfigError::ZeroPickInterval);
        }
        if self.recent_window == 0 {
            return Err(ConfigError::ZeroRecentWindow);
        }
        Ok(())
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::reference()
    }
}
