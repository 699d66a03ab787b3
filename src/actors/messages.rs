//! Message types for actor communication

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::OrchestrationError;
use crate::orchestrator::{RunSummary, Trigger};

/// A detached run handed over to the supervisor
pub type RunFuture = BoxFuture<'static, Result<RunSummary, OrchestrationError>>;

/// Commands that can be sent to the SupervisorActor
pub enum SupervisorCommand {
    /// Take ownership of a run and join it in the background
    Track { trigger: Trigger, run: RunFuture },

    /// Get the current counters
    GetStats {
        respond_to: oneshot::Sender<SupervisorStats>,
    },

    /// Wait for every in-flight run, then stop
    ///
    /// Runs tracked after this command are rejected.
    Shutdown {
        respond_to: oneshot::Sender<SupervisorStats>,
    },
}

/// Supervisor counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorStats {
    /// Runs handed to the supervisor
    pub tracked: u64,

    /// Runs that finished, successfully or not
    pub settled: u64,

    /// Runs that ended with a structural fault or whose task aborted
    pub faults: u64,

    /// Runs still executing
    pub in_flight: usize,
}
