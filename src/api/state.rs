//! API shared state

use std::sync::Arc;

use crate::actors::supervisor::SupervisorHandle;
use crate::config::Config;
use crate::orchestrator::Orchestrator;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Runs the metric pipelines; detached runs go through `supervisor`
    pub orchestrator: Orchestrator,

    /// Owns runs started by `/execute`
    pub supervisor: SupervisorHandle,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator, supervisor: SupervisorHandle) -> Self {
        Self {
            orchestrator,
            supervisor,
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        self.orchestrator.config()
    }
}
