//! A fixed-rate tick loop for hosts without their own tick source.
//!
//! Game servers usually have a tick event to hang
//! [`EventRouter::tick`](crate::EventRouter::tick) off. Standalone
//! services (a lobby gateway, a test harness) don't, so this driver runs
//! the maintenance pass from a Tokio task at a fixed period instead.
//!
//! Overruns use skip semantics: if a tick's work runs long, missed ticks
//! are dropped and the loop resumes on the next boundary. Timeout and
//! reminder decisions are measured against wall-clock instants, so a
//! late tick makes enforcement late, never wrong.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use vigil_types::Player;

use crate::EventRouter;

/// Handle to a running tick loop. Dropping it detaches the loop (it runs
/// until the runtime shuts down); call [`shutdown`](Self::shutdown) for a
/// clean stop.
pub struct TickDriver {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TickDriver {
    /// Spawns the tick loop on the current Tokio runtime.
    ///
    /// The first tick fires immediately, then every `period` (floored at
    /// one millisecond). 50 ms — the classic 20 Hz server tick — is a
    /// sensible default period.
    pub fn spawn<P: Player>(router: Arc<EventRouter<P>>, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(period_ms = period.as_millis() as u64, "tick driver started");

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => router.tick(),
                }
            }

            debug!("tick driver stopped");
        });

        Self { stop, task }
    }

    /// Stops the loop and waits for the task to finish.
    pub async fn shutdown(self) {
        // A closed receiver just means the task is already gone.
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}
