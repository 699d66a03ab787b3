//! UptimeRobot v2 client
//!
//! One `getMonitors` call per monitor with `response_times=1` returns the
//! response-time history between two epoch-second bounds. Each entry already
//! covers one minute.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::RawSample;
use crate::error::{FetchError, UpstreamCause};
use crate::util::Secret;
use crate::window::ExecutionWindow;

use super::{MonitoringClient, build_http_client};

const PROVIDER: &str = "uptimerobot";

#[derive(Debug, Deserialize)]
struct GetMonitorsResponse {
    stat: String,
    #[serde(default)]
    monitors: Vec<Monitor>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Monitor {
    id: serde_json::Value,
    #[serde(default)]
    response_times: Vec<ResponseTime>,
}

#[derive(Debug, Deserialize)]
struct ResponseTime {
    datetime: i64,
    value: f64,
}

pub struct UptimeRobotClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Secret,
}

impl UptimeRobotClient {
    pub fn new(base_url: impl Into<String>, api_key: Secret) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl MonitoringClient for UptimeRobotClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn fetch(
        &self,
        monitor: &str,
        _region: Option<&str>,
        window: ExecutionWindow,
    ) -> Result<Vec<RawSample>, FetchError> {
        let (start, end) = window.bounds().ok_or_else(|| {
            FetchError::new(
                PROVIDER,
                UpstreamCause::WindowOutOfRange {
                    limit: window.limit,
                    skip: window.skip,
                },
            )
        })?;
        let url = format!("{}/v2/getMonitors", self.base_url);

        trace!("requesting response times {start}..{end}");

        let start = start.to_string();
        let end = end.to_string();
        let form = [
            ("api_key", self.api_key.expose()),
            ("format", "json"),
            ("monitors", monitor),
            ("response_times", "1"),
            ("response_times_start_date", start.as_str()),
            ("response_times_end_date", end.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| FetchError::new(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(FetchError::new(
                PROVIDER,
                UpstreamCause::Status(response.status()),
            ));
        }

        let body: GetMonitorsResponse = response
            .json()
            .await
            .map_err(|e| FetchError::new(PROVIDER, e))?;

        samples_for(monitor, body)
    }
}

fn samples_for(monitor: &str, body: GetMonitorsResponse) -> Result<Vec<RawSample>, FetchError> {
    if body.stat != "ok" {
        let detail = body
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| format!("stat={}", body.stat));
        return Err(FetchError::malformed(PROVIDER, detail));
    }

    let mut monitors = body.monitors;
    if monitors.is_empty() {
        return Err(FetchError::malformed(
            PROVIDER,
            format!("monitor {monitor} missing from response"),
        ));
    }

    let position = monitors
        .iter()
        .position(|m| id_matches(&m.id, monitor))
        .unwrap_or(0);

    let samples: Vec<RawSample> = monitors
        .swap_remove(position)
        .response_times
        .into_iter()
        .map(|rt| RawSample::new(rt.datetime, rt.value))
        .collect();

    trace!("received {} response times", samples.len());
    Ok(samples)
}

fn id_matches(id: &serde_json::Value, monitor: &str) -> bool {
    match id {
        serde_json::Value::String(s) => s == monitor,
        other => other.to_string() == monitor,
    }
}
