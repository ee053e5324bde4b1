use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Periodic one-second pulses for a running session.
///
/// Owned by the engine while a session is active. Dropping the ticker aborts
/// the background task and closes the channel, so no pulse can be observed
/// after release.
pub(crate) struct CountdownTicker {
    pulses: mpsc::Receiver<()>,
    task: JoinHandle<()>,
}

impl CountdownTicker {
    /// Spawn the pulse task on the current tokio runtime.
    ///
    /// Returns `None` when called outside a runtime.
    pub(crate) fn spawn(period: Duration) -> Option<Self> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let (tx, pulses) = mpsc::channel(1);
        let task = handle.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            // Ticks missed while the consumer was busy are delivered back to back.
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Some(Self { pulses, task })
    }

    /// Wait for the next pulse. `None` once the task has stopped.
    pub(crate) async fn pulse(&mut self) -> Option<()> {
        self.pulses.recv().await
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
