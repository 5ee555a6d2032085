//! Tick sources: what each tick of a paint run does.

use paint_core::{generate_input_stream, ColorId, LineConfig, SimulationRun, Stage, TickAction};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decides what each tick of a run does.
pub trait TickSource {
    /// Action for the run's next tick, or `None` once the source is done.
    fn next_action(&mut self, run: &SimulationRun) -> Option<TickAction>;
}

/// Feeds a pre-generated vehicle stream into a run.
///
/// With a 0-based operation counter, every `pick_every`-th operation is a
/// pick and the others admit the next vehicle. The vehicle at stream
/// position `i` targets stage one when `i` is even, stage two when odd. Once
/// the stream is used up the feeder stops, pick slots included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternatingFeeder {
    stream: Vec<ColorId>,
    cursor: usize,
    operations: u64,
    pick_every: u64,
}

impl AlternatingFeeder {
    pub fn new(stream: Vec<ColorId>, pick_every: u64) -> Self {
        Self {
            stream,
            cursor: 0,
            operations: 0,
            pick_every: pick_every.max(1),
        }
    }

    /// Generates `config.vehicles_per_run` vehicles following the color mix.
    pub fn generate(config: &LineConfig, rng: &mut impl Rng) -> Self {
        let stream = generate_input_stream(config.vehicles_per_run, &config.color_mix, rng);
        Self::new(stream, config.pick_every)
    }

    pub fn stream(&self) -> &[ColorId] {
        &self.stream
    }

    /// Vehicles handed out so far.
    pub fn fed(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.stream.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.stream.len()
    }
}

impl TickSource for AlternatingFeeder {
    fn next_action(&mut self, _run: &SimulationRun) -> Option<TickAction> {
        if self.is_exhausted() {
            return None;
        }
        let operation = self.operations;
        self.operations += 1;
        if operation % self.pick_every == 0 {
            return Some(TickAction::Pick);
        }
        let position = self.cursor;
        self.cursor += 1;
        Some(TickAction::Admit {
            color: self.stream[position].clone(),
            stage: Stage::for_stream_position(position),
        })
    }
}

/// Runs `inner` to exhaustion, then keeps picking until the lanes are empty.
#[derive(Debug, Clone)]
pub struct DrainAfter<S> {
    inner: S,
    draining: bool,
}

impl<S: TickSource> DrainAfter<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            draining: false,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: TickSource> TickSource for DrainAfter<S> {
    fn next_action(&mut self, run: &SimulationRun) -> Option<TickAction> {
        if !self.draining {
            if let Some(action) = self.inner.next_action(run) {
                return Some(action);
            }
            tracing::debug!(held = run.bank().total_vehicles(), "stream exhausted, draining");
            self.draining = true;
        }
        (!run.bank().is_empty()).then_some(TickAction::Pick)
    }
}

/// Applies actions from `source` until it yields nothing. Returns the number
/// of ticks applied.
pub fn run_to_completion(run: &mut SimulationRun, source: &mut impl TickSource) -> u64 {
    let mut ticks = 0;
    while let Some(action) = source.next_action(run) {
        run.apply(&action);
        ticks += 1;
    }
    ticks
}
