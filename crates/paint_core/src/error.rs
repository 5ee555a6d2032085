//! Error types for `paint_core`.

use thiserror::Error;

use crate::Stage;

/// Problems with a `LineConfig`. Fatal: a run is never built from an invalid
/// configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{stage} has no lanes")]
    NoLanes { stage: Stage },

    #[error("{stage} lanes have zero capacity")]
    ZeroCapacity { stage: Stage },

    #[error("{stage} has {lanes} lanes, at most {max} allowed")]
    TooManyLanes { stage: Stage, lanes: usize, max: usize },

    #[error("{stage} lane capacity {capacity} exceeds {max}")]
    CapacityTooLarge {
        stage: Stage,
        capacity: usize,
        max: usize,
    },

    #[error("color mix is empty")]
    EmptyColorMix,

    #[error("color '{color}' appears more than once in the color mix")]
    DuplicateColor { color: String },

    #[error("tick delay must be positive, got {secs}s")]
    NonPositiveDelay { secs: f64 },

    #[error("tick delay {secs}s is out of range, at most {max_secs}s allowed")]
    DelayOutOfRange { secs: f64, max_secs: f64 },

    #[error("pick interval must be at least 1")]
    ZeroPickInterval,

    #[error("recent window must be at least 1")]
    ZeroRecentWindow,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("lane {lane} is full")]
    LaneFull { lane: usize },

    #[error("lane {lane} does not exist")]
    UnknownLane { lane: usize },

    #[error("no vehicle at the front of any lane")]
    NothingToPick,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}
