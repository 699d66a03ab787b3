pub mod actors;
pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod reporter;
pub mod scheduler;
pub mod statuspage;
pub mod util;
pub mod window;

use serde::{Deserialize, Serialize};

/// Discrete result attached to a sample by providers that report failed checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    Up,
    Down,
}

impl SampleStatus {
    /// Classify a provider result code. Only explicit successes qualify.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "up" | "ok" | "success" => SampleStatus::Up,
            _ => SampleStatus::Down,
        }
    }
}

/// A single measurement returned by a monitoring provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Seconds since epoch
    pub timestamp: i64,
    pub value: f64,
    pub status: Option<SampleStatus>,
}

impl RawSample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            status: None,
        }
    }

    pub fn with_status(mut self, status: SampleStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Samples without a status are always counted.
    pub fn qualifies(&self) -> bool {
        !matches!(self.status, Some(SampleStatus::Down))
    }
}

/// One value per whole-minute bucket, ready to be pushed to the status page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPoint {
    pub timestamp: i64,
    pub value: f64,
}

/// Floor-align an epoch timestamp (seconds) to its minute.
pub fn minute_bucket(timestamp: i64) -> i64 {
    timestamp.div_euclid(60) * 60
}
