//! Regional ping client
//!
//! Queries the most recent pings of a monitor from one probing region at a
//! time. The window is implicit: the provider returns the last
//! [`SAMPLE_COUNT`] checks.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::error::{FetchError, UpstreamCause};
use crate::util::Secret;
use crate::window::ExecutionWindow;
use crate::{RawSample, SampleStatus};

use super::{MonitoringClient, build_http_client};

const PROVIDER: &str = "regional";

/// Number of recent pings requested per region
pub const SAMPLE_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
struct Ping {
    checked_at: String,
    value: f64,
    result: String,
}

pub struct RegionalPingClient {
    client: reqwest::Client,
    base_url: String,
    token: Secret,
}

impl RegionalPingClient {
    pub fn new(base_url: impl Into<String>, token: Secret) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl MonitoringClient for RegionalPingClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, _window), fields(provider = PROVIDER))]
    async fn fetch(
        &self,
        monitor: &str,
        region: Option<&str>,
        _window: ExecutionWindow,
    ) -> Result<Vec<RawSample>, FetchError> {
        let url = format!("{}/v1/monitors/{monitor}/pings", self.base_url);
        let limit = SAMPLE_COUNT.to_string();

        let mut query = vec![("limit", limit.as_str())];
        if let Some(region) = region {
            query.push(("region", region));
        }

        trace!("requesting {SAMPLE_COUNT} pings from {url}");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(|e| FetchError::new(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(FetchError::new(
                PROVIDER,
                UpstreamCause::Status(response.status()),
            ));
        }

        let pings: Vec<Ping> = response
            .json()
            .await
            .map_err(|e| FetchError::new(PROVIDER, e))?;

        pings
            .into_iter()
            .map(|ping| {
                let timestamp = parse_checked_at(&ping.checked_at).ok_or_else(|| {
                    FetchError::malformed(
                        PROVIDER,
                        format!("unparsable checked_at '{}'", ping.checked_at),
                    )
                })?;

                Ok(RawSample::new(timestamp, ping.value)
                    .with_status(SampleStatus::from_code(&ping.result)))
            })
            .collect()
    }
}

/// Epoch seconds of an RFC 3339 or naive UTC `YYYY-MM-DD HH:MM:SS` timestamp.
fn parse_checked_at(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp());
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().timestamp())
}
