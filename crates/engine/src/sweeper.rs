//! Periodic expired-hold sweeper.
//!
//! Hold expiry is cooperative and lazy; this worker bounds the staleness
//! window by running the global sweep on an interval. The lazy sweep inside
//! `create_hold` runs regardless, so the engine stays correct even if this
//! worker is never spawned.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::reservation::ReservationManager;

/// Handle to control and join the background sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

pub struct HoldSweeper;

impl HoldSweeper {
    /// Spawn the sweep loop on the current runtime.
    pub fn spawn(manager: ReservationManager, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        match manager.sweep_expired(Utc::now()).await {
                            Ok(0) => {}
                            Ok(released) => info!(released, "expired holds released"),
                            Err(err) => warn!(error = %err, "hold sweep failed"),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}
