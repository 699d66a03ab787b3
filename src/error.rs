//! Error types for the relay pipeline
//!
//! Two channels are kept apart:
//!
//! - [`PipelineError`] is the expected, per-metric fault. It is reported and
//!   absorbed at the metric boundary.
//! - [`OrchestrationError`] is a structural fault of a run itself. It is
//!   reported and then returned to whoever triggered the run.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Destination of a data point on the status page service
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Destination {
    pub page: String,
    pub metric: String,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} metric {}", self.page, self.metric)
    }
}

/// Underlying cause of a failed upstream call
#[derive(Debug, Error)]
pub enum UpstreamCause {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("window of {limit} minutes ending {skip} minutes ago is out of range")]
    WindowOutOfRange { limit: i64, skip: i64 },
}

/// A monitoring provider call failed
#[derive(Debug, Error)]
#[error("{provider} fetch failed: {cause}")]
pub struct FetchError {
    pub provider: &'static str,
    #[source]
    pub cause: UpstreamCause,
}

impl FetchError {
    pub fn new(provider: &'static str, cause: impl Into<UpstreamCause>) -> Self {
        Self {
            provider,
            cause: cause.into(),
        }
    }

    pub fn malformed(provider: &'static str, reason: impl ToString) -> Self {
        Self::new(provider, UpstreamCause::Malformed(reason.to_string()))
    }
}

/// A status page write failed
#[derive(Debug, Error)]
#[error("publish to {destination} failed: {cause}")]
pub struct PublishError {
    pub destination: Destination,
    #[source]
    pub cause: UpstreamCause,
}

impl PublishError {
    pub fn new(destination: Destination, cause: impl Into<UpstreamCause>) -> Self {
        Self {
            destination,
            cause: cause.into(),
        }
    }
}

/// Fault inside a single metric's pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("publish task for {0} did not complete")]
    PublishTask(Destination),

    #[error("no {0} client configured")]
    MissingProvider(&'static str),
}

/// Fault in the orchestration of a run rather than in one metric
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("pipeline task for metric '{metric}' aborted: {source}")]
    PipelineTask {
        metric: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Invalid configuration document or settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration document: {0}")]
    Parse(String),

    #[error("metric #{index}: {reason}")]
    InvalidMetric { index: usize, reason: String },

    #[error("missing setting {0}")]
    MissingSetting(&'static str),
}
