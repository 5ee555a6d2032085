use uuid::Uuid;

use crate::admission::{self, Admission};
use crate::color::ColorPriorityTable;
use crate::snapshot::{compute_snapshot, Snapshot};
use crate::stats::SimulationStats;
use crate::{
    ColorId, Counters, Event, EventEnvelope, LaneBank, LineConfig, PickRecord, Picker, SimError,
    Stage, TickAction,
};

/// One independent simulation: lane bank, picker and stats for a single run.
///
/// Every mutation goes through `&mut self`, so a run advances strictly one
/// operation at a time. Runs share nothing; several may be driven at once.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    id: Uuid,
    config: LineConfig,
    table: ColorPriorityTable,
    bank: LaneBank,
    picker: Picker,
    stats: SimulationStats,
    tick: u64,
    counters: Counters,
}

impl SimulationRun {
    pub fn new(config: LineConfig, id: Uuid) -> Result<Self, SimError> {
        config.validate()?;
        let table = ColorPriorityTable::new(config.color_mix.clone(), config.empty_lane_policy);
        let bank = LaneBank::from_config(&config);
        Ok(Self {
            id,
            config,
            table,
            bank,
            picker: Picker::new(),
            stats: SimulationStats::default(),
            tick: 0,
            counters: Counters::default(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    pub fn priority_table(&self) -> &ColorPriorityTable {
        &self.table
    }

    pub fn bank(&self) -> &LaneBank {
        &self.bank
    }

    pub fn picker(&self) -> &Picker {
        &self.picker
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Direct lane access for arranging test scenarios.
    #[cfg(any(test, feature = "test-support"))]
    pub fn bank_mut(&mut self) -> &mut LaneBank {
        &mut self.bank
    }

    /// Number of ticks applied so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Wipes lanes, picker state and stats. Keeps the config and run id.
    pub fn reset(&mut self) {
        self.bank = LaneBank::from_config(&self.config);
        self.picker = Picker::new();
        self.stats = SimulationStats::default();
        self.tick = 0;
        self.counters = Counters::default();
    }

    /// Perform one tick's action and advance the tick counter.
    ///
    /// Returns the events produced by this tick; they are also appended to
    /// the run's operation log.
    pub fn apply(&mut self, action: &TickAction) -> Vec<EventEnvelope> {
        let log_start = self.stats.operation_log().len();
        match action {
            TickAction::Admit { color, stage } => {
                self.admit(color, *stage);
            }
            TickAction::Pick => {
                let _ = self.pick_next();
            }
        }
        self.tick += 1;
        self.stats.operation_log()[log_start..].to_vec()
    }

    /// Admit one vehicle at the current tick.
    pub fn admit(&mut self, color: &ColorId, stage: Stage) -> Admission {
        let outcome = admission::admit(&mut self.bank, &self.table, color, stage);
        if let Some(from_lane) = outcome.overflowed_from() {
            self.record(Event::OverflowPenalty {
                color: color.clone(),
                from_lane,
            });
        }
        match outcome {
            Admission::Placed { placement, .. } => self.record(Event::VehicleAdmitted {
                color: color.clone(),
                lane: placement.lane,
                stage: placement.stage,
                reason: placement.reason,
            }),
            Admission::Dropped { stage, .. } => {
                tracing::warn!(run = %self.id, %color, %stage, "all lanes full, vehicle dropped");
                self.record(Event::VehicleDropped {
                    color: color.clone(),
                    stage,
                });
            }
        }
        outcome
    }

    /// Pick one vehicle at the current tick. `NothingToPick` is recorded and
    /// returned; it never aborts the run.
    pub fn pick_next(&mut self) -> Result<PickRecord, SimError> {
        match self.picker.pick_next(&mut self.bank, self.tick) {
            Ok(record) => {
                self.record(Event::VehiclePicked {
                    color: record.color.clone(),
                    lane: record.lane,
                    changeover: record.changeover,
                });
                Ok(record)
            }
            Err(err) => {
                tracing::debug!(run = %self.id, tick = self.tick, "nothing to pick");
                self.record(Event::NothingToPick);
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        compute_snapshot(self)
    }

    fn record(&mut self, event: Event) {
        let envelope = crate::emit(&mut self.counters, self.tick, event);
        self.stats.record(envelope);
    }
}
