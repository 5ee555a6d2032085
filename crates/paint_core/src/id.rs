//! Run and event identifiers.

use rand::Rng;
use uuid::Uuid;

use crate::EventId;

/// Run id drawn from the run's RNG, so a seeded run keeps its id.
pub fn new_run_id(rng: &mut impl Rng) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// `evt_000042` for sequence number 42.
pub(crate) fn event_id(sequence: u64) -> EventId {
    EventId(format!("evt_{sequence:06}"))
}
