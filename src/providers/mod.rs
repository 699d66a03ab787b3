//! Monitoring provider clients
//!
//! Each provider turns a monitor id (plus an optional region) into a flat list
//! of [`RawSample`]s with timestamps in epoch seconds.
//!
//! - [`uptimerobot::UptimeRobotClient`] - windowed response-time history
//! - [`regional::RegionalPingClient`] - recent pings per probing region

pub mod regional;
pub mod uptimerobot;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::RawSample;
use crate::config::ProviderKind;
use crate::error::FetchError;
use crate::window::ExecutionWindow;

/// Timeout applied to every upstream call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait MonitoringClient: Send + Sync {
    /// Provider name used in errors and logs
    fn provider(&self) -> &'static str;

    /// Fetch samples for one monitor, optionally restricted to one region.
    async fn fetch(
        &self,
        monitor: &str,
        region: Option<&str>,
        window: ExecutionWindow,
    ) -> Result<Vec<RawSample>, FetchError>;
}

/// The clients available to a deployment, keyed by provider
#[derive(Clone, Default)]
pub struct ProviderSet {
    uptimerobot: Option<Arc<dyn MonitoringClient>>,
    regional: Option<Arc<dyn MonitoringClient>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ProviderKind, client: Arc<dyn MonitoringClient>) -> Self {
        match kind {
            ProviderKind::UptimeRobot => self.uptimerobot = Some(client),
            ProviderKind::Regional => self.regional = Some(client),
        }
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn MonitoringClient>> {
        match kind {
            ProviderKind::UptimeRobot => self.uptimerobot.as_ref(),
            ProviderKind::Regional => self.regional.as_ref(),
        }
    }
}

pub(crate) fn build_http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("uptime-relay/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
