//! Run orchestration
//!
//! ## Flow
//!
//! ```text
//! run(window)
//!   ├── metric 1: fetch (per region, all must succeed) → aggregate → publish all
//!   ├── metric 2: ...
//!   └── metric N: ...
//! ```
//!
//! Every metric pipeline is its own task. A failing pipeline is reported and
//! absorbed at its own boundary, so the run only fails when a pipeline task
//! itself dies.

use std::fmt;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::aggregate::aggregate;
use crate::config::{Config, MetricDefinition};
use crate::error::{Destination, FetchError, OrchestrationError, PipelineError};
use crate::providers::{MonitoringClient, ProviderSet};
use crate::reporter::{ErrorReporter, FaultLevel};
use crate::statuspage::Publisher;
use crate::window::ExecutionWindow;
use crate::{AggregatedPoint, RawSample};

/// What started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Http,
    Timer,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Http => write!(f, "http"),
            Trigger::Timer => write!(f, "timer"),
        }
    }
}

/// Outcome of one metric pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricReport {
    pub published: usize,
    pub empty_buckets: usize,
}

/// Totals over all metric pipelines of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub metrics: usize,
    pub failed: usize,
    pub published: usize,
    pub empty_buckets: usize,
}

#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<Config>,
    providers: ProviderSet,
    publisher: Arc<dyn Publisher>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        providers: ProviderSet,
        publisher: Arc<dyn Publisher>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            config,
            providers,
            publisher,
            reporter,
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Run every metric pipeline concurrently and wait for all of them.
    ///
    /// Per-metric faults end up in [`RunSummary::failed`]. An `Err` means a
    /// pipeline task aborted; it is returned only after every other pipeline
    /// has settled.
    #[instrument(skip(self))]
    pub async fn run(&self, window: ExecutionWindow) -> Result<RunSummary, OrchestrationError> {
        let handles: Vec<_> = self
            .config
            .metrics()
            .iter()
            .cloned()
            .map(|metric| {
                let this = self.clone();
                let name = metric.name.clone();
                let handle =
                    tokio::spawn(async move { this.run_metric_isolated(metric, window).await });
                (name, handle)
            })
            .collect();

        let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut summary = RunSummary {
            metrics: names.len(),
            ..RunSummary::default()
        };
        let mut structural = None;

        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(Some(report)) => {
                    summary.published += report.published;
                    summary.empty_buckets += report.empty_buckets;
                }
                Ok(None) => summary.failed += 1,
                Err(source) => {
                    summary.failed += 1;
                    warn!("pipeline task for '{name}' aborted: {source}");
                    structural.get_or_insert(OrchestrationError::PipelineTask {
                        metric: name,
                        source,
                    });
                }
            }
        }

        match structural {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    /// Run and, on a structural fault, report it before handing it back.
    pub async fn run_reported(
        &self,
        trigger: Trigger,
        window: ExecutionWindow,
    ) -> Result<RunSummary, OrchestrationError> {
        match self.run(window).await {
            Ok(summary) => {
                info!(
                    %trigger,
                    metrics = summary.metrics,
                    failed = summary.failed,
                    published = summary.published,
                    empty_buckets = summary.empty_buckets,
                    "run complete"
                );
                Ok(summary)
            }
            Err(err) => {
                self.reporter
                    .report(FaultLevel::Fatal, &trigger.to_string(), &err)
                    .await;
                Err(err)
            }
        }
    }

    /// The per-metric boundary: a failed pipeline is reported and becomes `None`.
    async fn run_metric_isolated(
        &self,
        metric: MetricDefinition,
        window: ExecutionWindow,
    ) -> Option<MetricReport> {
        match self.run_metric(&metric, window).await {
            Ok(report) => Some(report),
            Err(err) => {
                self.reporter
                    .report(FaultLevel::Error, &metric.name, &err)
                    .await;
                None
            }
        }
    }

    #[instrument(skip_all, fields(metric = %metric.name))]
    pub async fn run_metric(
        &self,
        metric: &MetricDefinition,
        window: ExecutionWindow,
    ) -> Result<MetricReport, PipelineError> {
        let client = self
            .providers
            .get(metric.provider)
            .ok_or(PipelineError::MissingProvider(metric.provider.name()))?;

        let samples = fetch_samples(client.as_ref(), metric, window).await?;
        let aggregated = aggregate(&samples, metric.aggregation);

        debug!(
            "{} samples aggregated into {} points",
            samples.len(),
            aggregated.points.len()
        );

        let published = self
            .publish_all(&metric.destination, aggregated.points)
            .await?;

        Ok(MetricReport {
            published,
            empty_buckets: aggregated.empty_buckets.len(),
        })
    }

    /// Publish every point as its own task.
    ///
    /// The first failure is returned; publishes already in flight keep running
    /// and their outcome is not observed.
    async fn publish_all(
        &self,
        destination: &Destination,
        points: Vec<AggregatedPoint>,
    ) -> Result<usize, PipelineError> {
        let handles: Vec<_> = points
            .into_iter()
            .map(|point| {
                let publisher = self.publisher.clone();
                let destination = destination.clone();
                tokio::spawn(async move { publisher.publish(&destination, point).await })
            })
            .collect();

        let count = handles.len();

        try_join_all(handles.into_iter().map(|handle| async move {
            match handle.await {
                Ok(result) => result.map_err(PipelineError::from),
                Err(_) => Err(PipelineError::PublishTask(destination.clone())),
            }
        }))
        .await?;

        Ok(count)
    }
}

async fn fetch_samples(
    client: &dyn MonitoringClient,
    metric: &MetricDefinition,
    window: ExecutionWindow,
) -> Result<Vec<RawSample>, FetchError> {
    if metric.regions.is_empty() {
        return client.fetch(&metric.monitor, None, window).await;
    }

    let per_region = try_join_all(
        metric
            .regions
            .iter()
            .map(|region| client.fetch(&metric.monitor, Some(region.as_str()), window)),
    )
    .await?;

    Ok(per_region.into_iter().flatten().collect())
}
