//! Centralized error reporting
//!
//! Pipeline and orchestration faults are handed to an [`ErrorReporter`]. The
//! reporter must never fail the caller: delivery problems are logged and
//! dropped.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, instrument, warn};

use crate::util::Secret;

/// Severity of a reported fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultLevel {
    /// A single metric failed; the run carried on
    Error,
    /// The run itself failed
    Fatal,
}

#[async_trait]
pub trait ErrorReporter: Send + Sync {
    /// `context` names where the fault was caught (a metric name, a trigger).
    async fn report(
        &self,
        level: FaultLevel,
        context: &str,
        error: &(dyn std::error::Error + Sync),
    );
}

/// Render an error with its source chain, skipping causes already spelled out
/// by the outer message.
pub fn error_chain(error: &(dyn std::error::Error + Sync)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Reports as structured log events
#[derive(Debug, Clone, Default)]
pub struct LogReporter;

#[async_trait]
impl ErrorReporter for LogReporter {
    async fn report(
        &self,
        level: FaultLevel,
        context: &str,
        error: &(dyn std::error::Error + Sync),
    ) {
        error!(?level, context, "{}", error_chain(error));
    }
}

#[derive(Debug, Serialize)]
struct WebhookEvent<'a> {
    level: FaultLevel,
    context: &'a str,
    message: String,
    timestamp: String,
}

/// Posts each fault as a JSON event to a collector URL
#[derive(Debug, Clone)]
pub struct WebhookReporter {
    client: Client,
    dsn: Secret,
}

impl WebhookReporter {
    pub fn new(dsn: Secret) -> Self {
        Self {
            client: Client::new(),
            dsn,
        }
    }
}

#[async_trait]
impl ErrorReporter for WebhookReporter {
    #[instrument(skip_all)]
    async fn report(
        &self,
        level: FaultLevel,
        context: &str,
        error: &(dyn std::error::Error + Sync),
    ) {
        let event = WebhookEvent {
            level,
            context,
            message: error_chain(error),
            timestamp: Utc::now().to_rfc3339(),
        };

        match self.client.post(self.dsn.expose()).json(&event).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!("error report rejected with status {}", response.status());
            }
            Ok(_) => {}
            Err(e) => {
                warn!("failed to deliver error report: {}", e.without_url());
            }
        }
    }
}

/// Fans every report out to several reporters in order
#[derive(Clone, Default)]
pub struct CompositeReporter {
    reporters: Vec<Arc<dyn ErrorReporter>>,
}

impl CompositeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }
}

#[async_trait]
impl ErrorReporter for CompositeReporter {
    async fn report(
        &self,
        level: FaultLevel,
        context: &str,
        error: &(dyn std::error::Error + Sync),
    ) {
        for reporter in &self.reporters {
            reporter.report(level, context, error).await;
        }
    }
}
