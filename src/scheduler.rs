//! Timer trigger: a default-window run every `period`

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, instrument};

use crate::actors::supervisor::SupervisorHandle;
use crate::orchestrator::{Orchestrator, Trigger};
use crate::window::ExecutionWindow;

pub struct SchedulerHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Start ticking. The first run happens one `period` from now.
    pub fn spawn(
        orchestrator: Orchestrator,
        supervisor: SupervisorHandle,
        period: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(orchestrator, supervisor, period, shutdown_rx));

        Self { shutdown_tx, task }
    }

    /// Stop ticking. Runs already handed to the supervisor are not affected.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            error!("scheduler task failed: {e}");
        }
    }
}

#[instrument(skip_all, fields(period = ?period))]
async fn run(
    orchestrator: Orchestrator,
    supervisor: SupervisorHandle,
    period: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("starting scheduler");

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let orchestrator = orchestrator.clone();
                let run = async move {
                    orchestrator
                        .run_reported(Trigger::Timer, ExecutionWindow::default())
                        .await
                };

                if let Err(e) = supervisor.track(Trigger::Timer, run).await {
                    error!("failed to hand scheduled run to supervisor: {e:#}");
                    break;
                }
            }

            _ = &mut shutdown_rx => {
                debug!("received shutdown signal");
                break;
            }
        }
    }

    debug!("scheduler stopped");
}
