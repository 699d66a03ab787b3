//! Orchestrator tests against in-memory fakes
//!
//! These tests verify that:
//! - Points reach the status page per metric
//! - A failing metric never affects its siblings
//! - Regions are merged before aggregation
//! - Structural faults are reported and returned

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use uptime_relay::{
    AggregatedPoint, RawSample, SampleStatus,
    error::OrchestrationError,
    orchestrator::{Orchestrator, RunSummary, Trigger},
    providers::ProviderSet,
    reporter::FaultLevel,
    window::ExecutionWindow,
};

use crate::helpers::*;

fn two_uptimerobot_metrics() -> serde_json::Value {
    json!({
        "metrics": [
            {
                "name": "alpha",
                "uptimerobot": { "monitor": "a" },
                "statuspage": { "page": "page", "metric": "metric-a" }
            },
            {
                "name": "beta",
                "uptimerobot": { "monitor": "b" },
                "statuspage": { "page": "page", "metric": "metric-b" }
            }
        ]
    })
}

#[tokio::test]
async fn test_points_published_per_metric() {
    let monitor = Arc::new(
        FakeMonitor::new("uptimerobot")
            .with_samples("a", None, vec![RawSample::new(60, 100.0), RawSample::new(125, 110.0)])
            .with_samples("b", None, vec![RawSample::new(60, 7.0)]),
    );
    let publisher = Arc::new(RecordingPublisher::new());
    let reporter = Arc::new(RecordingReporter::new());

    let summary = orchestrator(
        config(two_uptimerobot_metrics()),
        monitor.clone(),
        publisher.clone(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            metrics: 2,
            failed: 0,
            published: 3,
            empty_buckets: 0,
        }
    );

    let mut alpha = publisher.published_to("metric-a");
    alpha.sort_by_key(|p| p.timestamp);
    assert_eq!(
        alpha,
        vec![
            AggregatedPoint {
                timestamp: 60,
                value: 100.0
            },
            AggregatedPoint {
                timestamp: 120,
                value: 110.0
            },
        ]
    );
    assert_eq!(
        publisher.published_to("metric-b"),
        vec![AggregatedPoint {
            timestamp: 60,
            value: 7.0
        }]
    );
    assert!(reporter.reports().is_empty());
    assert_eq!(monitor.calls(), 2);
}

#[tokio::test]
async fn test_fetch_failure_is_isolated_and_reported_once() {
    let monitor = Arc::new(
        FakeMonitor::new("uptimerobot")
            .failing("a", None)
            .with_samples("b", None, vec![RawSample::new(60, 7.0), RawSample::new(120, 8.0)]),
    );
    let publisher = Arc::new(RecordingPublisher::new());
    let reporter = Arc::new(RecordingReporter::new());

    let summary = orchestrator(
        config(two_uptimerobot_metrics()),
        monitor,
        publisher.clone(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.published, 2);
    assert_eq!(publisher.published_to("metric-b").len(), 2);
    assert!(publisher.published_to("metric-a").is_empty());

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].level, FaultLevel::Error);
    assert_eq!(reports[0].context, "alpha");
    assert!(reports[0].message.contains("uptimerobot fetch failed"));
}

#[tokio::test]
async fn test_publish_failure_is_isolated() {
    let monitor = Arc::new(
        FakeMonitor::new("uptimerobot")
            .with_samples("a", None, vec![RawSample::new(60, 1.0), RawSample::new(120, 2.0)])
            .with_samples("b", None, vec![RawSample::new(60, 3.0)]),
    );
    let publisher = Arc::new(RecordingPublisher::new().failing_for("metric-a"));
    let reporter = Arc::new(RecordingReporter::new());

    let summary = orchestrator(
        config(two_uptimerobot_metrics()),
        monitor,
        publisher.clone(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(publisher.published_to("metric-b").len(), 1);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].context, "alpha");
    assert!(reports[0].message.contains("publish to page page metric metric-a failed"));
}

#[tokio::test]
async fn test_regions_merged_before_filtered_mean() {
    let monitor = Arc::new(
        FakeMonitor::new("regional")
            .with_samples(
                "site",
                Some("london"),
                vec![
                    RawSample::new(600, 10.0).with_status(SampleStatus::Up),
                    RawSample::new(610, 999.0).with_status(SampleStatus::Down),
                ],
            )
            .with_samples(
                "site",
                Some("virginia"),
                vec![
                    RawSample::new(650, 20.0).with_status(SampleStatus::Up),
                    RawSample::new(700, 5.0).with_status(SampleStatus::Down),
                ],
            ),
    );
    let publisher = Arc::new(RecordingPublisher::new());
    let reporter = Arc::new(RecordingReporter::new());

    let summary = orchestrator(
        config(json!({
            "metrics": [{
                "name": "site",
                "regional": { "monitor": "site", "regions": ["london", "virginia"] },
                "statuspage": { "page": "page", "metric": "latency" }
            }]
        })),
        monitor.clone(),
        publisher.clone(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(monitor.calls(), 2);
    assert_eq!(
        publisher.published_to("latency"),
        vec![AggregatedPoint {
            timestamp: 600,
            value: 15.0
        }]
    );
    // 660..720 only had a down sample
    assert_eq!(summary.empty_buckets, 1);
    assert!(reporter.reports().is_empty());
}

#[tokio::test]
async fn test_one_failing_region_fails_the_metric() {
    let monitor = Arc::new(
        FakeMonitor::new("regional")
            .with_samples(
                "site",
                Some("london"),
                vec![RawSample::new(600, 10.0).with_status(SampleStatus::Up)],
            )
            .failing("site", Some("virginia")),
    );
    let publisher = Arc::new(RecordingPublisher::new());
    let reporter = Arc::new(RecordingReporter::new());

    let summary = orchestrator(
        config(json!({
            "metrics": [{
                "name": "site",
                "regional": { "monitor": "site", "regions": ["london", "virginia"] },
                "statuspage": { "page": "page", "metric": "latency" }
            }]
        })),
        monitor,
        publisher.clone(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert!(publisher.published().is_empty());
    assert_eq!(reporter.reports().len(), 1);
}

#[tokio::test]
async fn test_pipeline_panic_is_structural() {
    let monitor = Arc::new(
        FakeMonitor::new("uptimerobot")
            .panicking("a")
            .with_samples("b", None, vec![RawSample::new(60, 7.0)]),
    );
    let publisher = Arc::new(RecordingPublisher::new());
    let reporter = Arc::new(RecordingReporter::new());

    let orchestrator = orchestrator(
        config(two_uptimerobot_metrics()),
        monitor,
        publisher.clone(),
        reporter.clone(),
    );

    let result = orchestrator
        .run_reported(Trigger::Timer, ExecutionWindow::default())
        .await;

    match result {
        Err(OrchestrationError::PipelineTask { metric, .. }) => assert_eq!(metric, "alpha"),
        other => panic!("expected a structural fault, got {other:?}"),
    }

    // The sibling still ran to completion
    assert_eq!(publisher.published_to("metric-b").len(), 1);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].level, FaultLevel::Fatal);
    assert_eq!(reports[0].context, "timer");
}

#[tokio::test]
async fn test_missing_provider_is_a_metric_failure() {
    let publisher = Arc::new(RecordingPublisher::new());
    let reporter = Arc::new(RecordingReporter::new());

    let orchestrator = Orchestrator::new(
        config(two_uptimerobot_metrics()),
        ProviderSet::new(),
        publisher.clone(),
        reporter.clone(),
    );

    let summary = orchestrator.run(ExecutionWindow::default()).await.unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(reporter.reports().len(), 2);
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn test_empty_config_runs_nothing() {
    let monitor = Arc::new(FakeMonitor::new("uptimerobot"));
    let publisher = Arc::new(RecordingPublisher::new());
    let reporter = Arc::new(RecordingReporter::new());

    let summary = orchestrator(
        config(json!({ "metrics": [] })),
        monitor.clone(),
        publisher,
        reporter,
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(summary, RunSummary::default());
    assert_eq!(monitor.calls(), 0);
}
