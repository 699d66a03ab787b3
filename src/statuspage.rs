//! Status page metric ingestion
//!
//! One POST per data point; the service upserts by timestamp, so points can be
//! sent in any order and concurrently.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{instrument, trace};

use crate::AggregatedPoint;
use crate::error::{Destination, PublishError, UpstreamCause};
use crate::providers::build_http_client;
use crate::util::Secret;

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        destination: &Destination,
        point: AggregatedPoint,
    ) -> Result<(), PublishError>;
}

#[derive(Debug, Serialize)]
struct DataBody {
    data: AggregatedPoint,
}

pub struct StatuspageClient {
    client: reqwest::Client,
    base_url: String,
    token: Secret,
}

impl StatuspageClient {
    pub fn new(base_url: impl Into<String>, token: Secret) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl Publisher for StatuspageClient {
    #[instrument(skip(self), fields(page = %destination.page, metric = %destination.metric))]
    async fn publish(
        &self,
        destination: &Destination,
        point: AggregatedPoint,
    ) -> Result<(), PublishError> {
        let url = format!(
            "{}/v1/pages/{}/metrics/{}/data.json",
            self.base_url, destination.page, destination.metric
        );

        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("OAuth {}", self.token.expose()),
            )
            .json(&DataBody { data: point })
            .send()
            .await
            .map_err(|e| PublishError::new(destination.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::new(
                destination.clone(),
                UpstreamCause::Status(status),
            ));
        }

        // The body is JSON but carries nothing we act on.
        let _: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PublishError::new(destination.clone(), e))?;

        trace!("published point {}", point.timestamp);
        Ok(())
    }
}
