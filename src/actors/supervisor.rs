//! SupervisorActor - Keeps detached runs alive until they settle
//!
//! HTTP handlers and the scheduler never await a run themselves. They hand it
//! to the supervisor, which spawns it into a `JoinSet`, joins it and records the
//! outcome. A run returning `Err` is a process-level fault: it has already been
//! reported by the orchestrator and is logged and counted here.
//!
//! ## Message Flow
//!
//! ```text
//! /execute, timer → Track(run) → JoinSet → settled / faults
//!                         ↑
//!                         └─── Commands (GetStats, Shutdown)
//! ```

use std::future::Future;

use anyhow::{Context, Result, anyhow};
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, instrument, warn};

use crate::error::OrchestrationError;
use crate::orchestrator::{RunSummary, Trigger};

use super::messages::{SupervisorCommand, SupervisorStats};

type Settled = (Trigger, Result<RunSummary, OrchestrationError>);

pub struct SupervisorActor {
    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SupervisorCommand>,

    /// Runs still executing
    tasks: JoinSet<Settled>,

    stats: SupervisorStats,
}

impl SupervisorActor {
    pub fn new(command_rx: mpsc::Receiver<SupervisorCommand>) -> Self {
        Self {
            command_rx,
            tasks: JoinSet::new(),
            stats: SupervisorStats::default(),
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or every handle is dropped.
    /// Either way, in-flight runs are drained first.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting supervisor actor");

        loop {
            tokio::select! {
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.record(joined);
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(SupervisorCommand::Track { trigger, run }) => {
                            self.stats.tracked += 1;
                            self.tasks.spawn(run.map(move |result| (trigger, result)));
                            debug!("tracking {trigger} run ({} in flight)", self.tasks.len());
                        }

                        Some(SupervisorCommand::GetStats { respond_to }) => {
                            let _ = respond_to.send(self.snapshot());
                        }

                        Some(SupervisorCommand::Shutdown { respond_to }) => {
                            debug!("received shutdown command");
                            self.command_rx.close();
                            self.drain().await;
                            let _ = respond_to.send(self.snapshot());
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            self.drain().await;
                            break;
                        }
                    }
                }
            }
        }

        debug!("supervisor actor stopped");
    }

    async fn drain(&mut self) {
        if !self.tasks.is_empty() {
            debug!("waiting for {} in-flight runs", self.tasks.len());
        }
        while let Some(joined) = self.tasks.join_next().await {
            self.record(joined);
        }
    }

    fn record(&mut self, joined: Result<Settled, JoinError>) {
        self.stats.settled += 1;

        match joined {
            Ok((trigger, Ok(summary))) => {
                debug!(
                    "{trigger} run settled: {} metrics, {} failed",
                    summary.metrics, summary.failed
                );
            }
            Ok((trigger, Err(e))) => {
                self.stats.faults += 1;
                error!("{trigger} run failed: {e}");
            }
            Err(e) => {
                self.stats.faults += 1;
                error!("run task aborted: {e}");
            }
        }
    }

    fn snapshot(&self) -> SupervisorStats {
        SupervisorStats {
            in_flight: self.tasks.len(),
            ..self.stats.clone()
        }
    }
}

/// Handle for controlling a SupervisorActor
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorCommand>,
}

impl SupervisorHandle {
    /// Spawn a new supervisor actor
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);

        tokio::spawn(SupervisorActor::new(cmd_rx).run());

        Self { sender: cmd_tx }
    }

    /// Hand a run over; returns as soon as the supervisor owns it.
    pub async fn track<F>(&self, trigger: Trigger, run: F) -> Result<()>
    where
        F: Future<Output = Result<RunSummary, OrchestrationError>> + Send + 'static,
    {
        self.sender
            .send(SupervisorCommand::Track {
                trigger,
                run: run.boxed(),
            })
            .await
            .map_err(|_| anyhow!("failed to send Track command"))?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<SupervisorStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SupervisorCommand::GetStats { respond_to: tx })
            .await
            .map_err(|_| anyhow!("failed to send GetStats command"))?;

        rx.await.context("failed to receive stats")
    }

    /// Wait for all in-flight runs and stop the supervisor
    pub async fn shutdown(&self) -> Result<SupervisorStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SupervisorCommand::Shutdown { respond_to: tx })
            .await
            .map_err(|_| anyhow!("failed to send Shutdown command"))?;

        rx.await.context("failed to receive shutdown response")
    }
}
