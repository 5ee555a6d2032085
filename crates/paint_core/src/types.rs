//! Type definitions for `paint_core`.
//!
//! Identifiers, stage/lane addressing, tick actions and the event log types.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(ColorId);
string_id!(EventId);

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

/// Processing group a lane belongs to. Stage one is the primary oven; stage
/// two takes its own vehicles plus stage-one overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "stage1")]
    One,
    #[serde(rename = "stage2")]
    Two,
}

impl Stage {
    /// Target stage for the vehicle at `position` in the input stream.
    pub fn for_stream_position(position: usize) -> Self {
        if position % 2 == 0 {
            Stage::One
        } else {
            Stage::Two
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::One => f.write_str("stage 1"),
            Stage::Two => f.write_str("stage 2"),
        }
    }
}

/// Why the admission policy put a vehicle where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementReason {
    FirstVehicle,
    ColorMatch,
    LowestPriority,
}

/// One unit of work for a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickAction {
    Admit { color: ColorId, stage: Stage },
    Pick,
}

// ---------------------------------------------------------------------------
// Picker history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRecord {
    pub color: ColorId,
    /// Global lane index the vehicle came from.
    pub lane: usize,
    /// Run tick at which the pick happened.
    pub tick: u64,
    pub changeover: bool,
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    VehicleAdmitted {
        color: ColorId,
        lane: usize,
        stage: Stage,
        reason: PlacementReason,
    },
    /// Stage-one placement failed and the vehicle was redirected to stage two.
    OverflowPenalty {
        color: ColorId,
        from_lane: usize,
    },
    /// Every candidate lane was full; the vehicle is gone.
    VehicleDropped {
        color: ColorId,
        stage: Stage,
    },
    VehiclePicked {
        color: ColorId,
        lane: usize,
        changeover: bool,
    },
    NothingToPick,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
}
