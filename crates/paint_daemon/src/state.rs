use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use paint_control::AlternatingFeeder;
use paint_core::{LineConfig, SimulationRun, Snapshot};
use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, futures::Notified, Notify};

pub struct SimState {
    pub run: SimulationRun,
    pub feeder: AlternatingFeeder,
    pub config: LineConfig,
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl SimState {
    pub fn new(config: LineConfig, seed: u64) -> Result<Self> {
        let paint_world::RunSetup { run, feeder, rng } =
            paint_world::build_seeded_run(&config, seed)?;
        Ok(Self {
            run,
            feeder,
            config,
            rng,
            seed,
        })
    }

    /// Replaces the run with a fresh one and a newly generated stream. The
    /// RNG carries on, so each restart gets a different stream.
    pub fn restart(&mut self) -> Result<()> {
        let (run, feeder) = paint_world::build_run(&self.config, &mut self.rng)?;
        self.run = run;
        self.feeder = feeder;
        Ok(())
    }
}

/// Start/stop/speed signals shared between HTTP handlers and the tick loop.
#[derive(Debug)]
pub struct RunControl {
    running: AtomicBool,
    stop_requested: AtomicBool,
    delay_micros: AtomicU64,
    stop_notify: Notify,
}

impl RunControl {
    pub fn new(delay: Duration) -> Self {
        Self {
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            delay_micros: AtomicU64::new(duration_micros(delay)),
            stop_notify: Notify::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_micros(self.delay_micros.load(Ordering::Relaxed))
    }

    /// Sets the inter-tick delay. Takes effect from the next tick.
    pub fn set_delay_secs(&self, secs: f64) -> Option<Duration> {
        let delay = paint_core::tick_delay_from_secs(secs).ok()?;
        self.delay_micros
            .store(duration_micros(delay).max(1), Ordering::Relaxed);
        Some(delay)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claims the run slot. Returns false if a loop is already running.
    pub fn try_begin(&self) -> bool {
        let claimed = self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.stop_requested.store(false, Ordering::Release);
        }
        claimed
    }

    pub fn finish(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolves on the next `request_stop` issued after this call, even if
    /// the returned future has not been polled yet.
    pub fn stop_signal(&self) -> Notified<'_> {
        self.stop_notify.notified()
    }
}

fn duration_micros(delay: Duration) -> u64 {
    u64::try_from(delay.as_micros()).unwrap_or(u64::MAX)
}

pub type SharedSim = Arc<Mutex<SimState>>;
pub type SnapshotTx = broadcast::Sender<Snapshot>;

#[derive(Clone)]
pub struct AppState {
    pub sim: SharedSim,
    pub control: Arc<RunControl>,
    pub snapshot_tx: SnapshotTx,
    pub send_timeout: Duration,
}

impl AppState {
    pub fn new(config: LineConfig, seed: u64) -> Result<Self> {
        config.validate().context("invalid line configuration")?;
        let delay = config.tick_delay()?;
        let send_timeout = Duration::from_millis(config.snapshot_send_timeout_ms);
        let sim = SimState::new(config, seed)?;
        let (snapshot_tx, _) = broadcast::channel(64);
        Ok(Self {
            sim: Arc::new(Mutex::new(sim)),
            control: Arc::new(RunControl::new(delay)),
            snapshot_tx,
            send_timeout,
        })
    }
}
