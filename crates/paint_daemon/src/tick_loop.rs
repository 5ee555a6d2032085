use std::sync::Arc;
use std::time::Duration;

use paint_control::TickSource;
use paint_core::Snapshot;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::state::{RunControl, SharedSim, SimState, SnapshotTx};

/// Why a tick loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    Exhausted,
    ConsumerTimedOut,
    ConsumerGone,
}

/// Drives the shared run one tick at a time until the feeder runs dry, a stop
/// is requested, or the snapshot consumer stalls past `send_timeout`.
///
/// Each tick runs and is snapshotted under the run lock; the lock is released
/// before the snapshot is sent. Clears the running flag on exit.
pub async fn run_tick_loop(
    sim: SharedSim,
    control: Arc<RunControl>,
    snapshot_tx: mpsc::Sender<Snapshot>,
    send_timeout: Duration,
) -> LoopExit {
    let exit = loop {
        if control.stop_requested() {
            break LoopExit::Stopped;
        }

        let snapshot = {
            let mut guard = sim.lock();
            // A reset may have landed between the flag check and the lock.
            if control.stop_requested() {
                break LoopExit::Stopped;
            }
            let SimState {
                ref mut run,
                ref mut feeder,
                ..
            } = *guard;
            let Some(action) = feeder.next_action(run) else {
                break LoopExit::Exhausted;
            };
            let events = run.apply(&action);
            tracing::debug!(tick = run.tick(), events = events.len(), "tick applied");
            run.snapshot()
        };

        match snapshot_tx.send_timeout(snapshot, send_timeout).await {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                tracing::warn!(?send_timeout, "snapshot consumer stalled, stopping run");
                break LoopExit::ConsumerTimedOut;
            }
            Err(SendTimeoutError::Closed(_)) => {
                tracing::warn!("snapshot consumer gone, stopping run");
                break LoopExit::ConsumerGone;
            }
        }

        let stop_signal = control.stop_signal();
        // A stop may have arrived while the send was pending.
        if control.stop_requested() {
            break LoopExit::Stopped;
        }
        tokio::select! {
            () = tokio::time::sleep(control.delay()) => {}
            () = stop_signal => {}
        }
    };

    control.finish();
    let tick = sim.lock().run.tick();
    tracing::info!(?exit, tick, "tick loop finished");
    exit
}

/// Fans snapshots from one run's bounded channel out to every SSE subscriber.
///
/// A run started with nobody listening keeps going. Once a subscriber has
/// received a snapshot, losing the last one ends the forwarder, which closes
/// the run's channel and stops the tick loop with `ConsumerGone`.
pub async fn forward_snapshots(mut rx: mpsc::Receiver<Snapshot>, tx: SnapshotTx) {
    let mut seen_subscriber = false;
    while let Some(snapshot) = rx.recv().await {
        match tx.send(snapshot) {
            Ok(_) => seen_subscriber = true,
            Err(_) if seen_subscriber => {
                tracing::info!("last stream subscriber left, closing run channel");
                break;
            }
            Err(_) => {}
        }
    }
}
