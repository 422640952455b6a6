//! Background reclaiming of idle rounds.

use alloc::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::ActionError;
use crate::ledger::Ledger;
use crate::options::MIN_REAP_INTERVAL;
use crate::render::{FinishKind, RenderStatus, Renderer};
use crate::result::Outcome;

use super::Table;

impl<L: Ledger, R: Renderer> Table<L, R> {
    /// Forfeits every round idle for longer than the table's timeout.
    ///
    /// Each round is locked before it is checked, so a press being handled
    /// right now either finishes first (and the round is skipped) or waits
    /// and then finds the round already closed.
    ///
    /// Returns the number of rounds reaped.
    pub async fn reap_idle(&self) -> usize {
        let timeout = self.options.idle_timeout;
        let mut reaped = 0;

        for (owner, handle, cell) in self.registry.snapshot() {
            let mut session = cell.lock().await;
            if session.is_terminal() || !session.is_idle(Instant::now(), timeout) {
                continue;
            }

            let status = match self
                .settle::<ActionError>(&mut session, FinishKind::Timeout, Outcome::lose())
                .await
            {
                Ok(status) => status,
                Err(err) => {
                    debug!(%owner, %handle, %err, "timeout settlement failed");
                    RenderStatus::Aborted
                }
            };
            info!(%owner, %handle, "idle round reaped");
            self.show(&session, &status).await;
            reaped += 1;
        }
        reaped
    }
}

/// Handle to the task that reaps idle rounds on a fixed interval.
///
/// Start it once when the process comes up and [`stop`](Reaper::stop) it on
/// shutdown.
pub struct Reaper {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Reaper {
    /// Spawns the reaper on the current runtime.
    #[must_use]
    pub fn start<L, R>(table: Arc<Table<L, R>>) -> Self
    where
        L: Ledger + 'static,
        R: Renderer + 'static,
    {
        let (shutdown, mut stopped) = watch::channel(false);
        let period = table.options().reap_interval.max(MIN_REAP_INTERVAL);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(?period, "reaper started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        table.reap_idle().await;
                    }
                    _ = stopped.changed() => break,
                }
            }
            info!("reaper stopped");
        });

        Self { shutdown, task }
    }

    /// Returns whether the task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the reaper and waits for the current scan to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            error!(%err, "reaper task failed");
        }
    }
}
