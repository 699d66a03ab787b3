//! Failure scenarios against mocked upstream services
//!
//! These tests verify that:
//! - Upstream HTTP errors fail only the affected metric
//! - Malformed provider responses are reported, not published
//! - A rejecting status page fails its metric only

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use uptime_relay::{orchestrator::Trigger, reporter::FaultLevel, window::ExecutionWindow};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn two_monitors() -> serde_json::Value {
    json!({
        "metrics": [
            {
                "name": "api",
                "uptimerobot": { "monitor": 101 },
                "statuspage": { "page": "pg", "metric": "api-latency" }
            },
            {
                "name": "web",
                "uptimerobot": { "monitor": 202 },
                "statuspage": { "page": "pg", "metric": "web-latency" }
            }
        ]
    })
}

async fn accept_all_points(statuspage: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": {} })))
        .mount(statuspage)
        .await;
}

#[tokio::test]
async fn test_upstream_500_fails_one_metric() {
    let upstream = MockServer::start().await;
    let statuspage = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/getMonitors"))
        .and(body_string_contains("monitors=101"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/getMonitors"))
        .and(body_string_contains("monitors=202"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(uptimerobot_body(202, &[(1_700_000_040, 80.0)])),
        )
        .mount(&upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages/pg/metrics/web-latency/data.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&statuspage)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/pages/pg/metrics/api-latency/data.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": {} })))
        .expect(0)
        .mount(&statuspage)
        .await;

    let reporter = Arc::new(RecordingReporter::new());
    let summary = live_orchestrator(
        config(two_monitors()),
        &upstream.uri(),
        &statuspage.uri(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.published, 1);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].level, FaultLevel::Error);
    assert_eq!(reports[0].context, "api");
    assert!(reports[0].message.contains("500"));
}

#[tokio::test]
async fn test_malformed_provider_body_is_reported() {
    let upstream = MockServer::start().await;
    let statuspage = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/getMonitors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&upstream)
        .await;
    accept_all_points(&statuspage).await;

    let reporter = Arc::new(RecordingReporter::new());
    let summary = live_orchestrator(
        config(two_monitors()),
        &upstream.uri(),
        &statuspage.uri(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.published, 0);
    assert!(statuspage.received_requests().await.unwrap().is_empty());

    let mut contexts: Vec<String> = reporter.reports().into_iter().map(|r| r.context).collect();
    contexts.sort();
    assert_eq!(contexts, vec!["api".to_string(), "web".to_string()]);
}

#[tokio::test]
async fn test_provider_error_stat_is_reported() {
    let upstream = MockServer::start().await;
    let statuspage = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/getMonitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "fail",
            "error": { "type": "invalid_parameter", "message": "api_key is invalid." }
        })))
        .mount(&upstream)
        .await;
    accept_all_points(&statuspage).await;

    let reporter = Arc::new(RecordingReporter::new());
    live_orchestrator(
        config(json!({
            "metrics": [{
                "uptimerobot": { "monitor": 101 },
                "statuspage": { "page": "pg", "metric": "api-latency" }
            }]
        })),
        &upstream.uri(),
        &statuspage.uri(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].context, "uptimerobot:101");
    assert!(reports[0].message.contains("api_key is invalid."));
}

#[tokio::test]
async fn test_rejected_publish_fails_only_that_metric() {
    let upstream = MockServer::start().await;
    let statuspage = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/getMonitors"))
        .and(body_string_contains("monitors=101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(uptimerobot_body(
            101,
            &[(1_700_000_040, 80.0), (1_700_000_100, 85.0)],
        )))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/getMonitors"))
        .and(body_string_contains("monitors=202"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(uptimerobot_body(202, &[(1_700_000_040, 40.0)])),
        )
        .mount(&upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages/pg/metrics/api-latency/data.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "denied" })))
        .mount(&statuspage)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/pages/pg/metrics/web-latency/data.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&statuspage)
        .await;

    let reporter = Arc::new(RecordingReporter::new());
    let summary = live_orchestrator(
        config(two_monitors()),
        &upstream.uri(),
        &statuspage.uri(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.published, 1);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].context, "api");
    assert!(reports[0].message.contains("page pg metric api-latency"));
}

#[tokio::test]
async fn test_unreachable_provider_is_reported() {
    let statuspage = MockServer::start().await;
    accept_all_points(&statuspage).await;

    // Nothing listens on port 9 of localhost
    let reporter = Arc::new(RecordingReporter::new());
    let summary = live_orchestrator(
        config(two_monitors()),
        "http://127.0.0.1:9",
        &statuspage.uri(),
        reporter.clone(),
    )
    .run(ExecutionWindow::default())
    .await
    .unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(reporter.reports().len(), 2);
}

#[tokio::test]
async fn test_out_of_range_window_fails_metrics_not_the_run() {
    let upstream = MockServer::start().await;
    let statuspage = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    accept_all_points(&statuspage).await;

    let reporter = Arc::new(RecordingReporter::new());
    let summary = live_orchestrator(
        config(two_monitors()),
        &upstream.uri(),
        &statuspage.uri(),
        reporter.clone(),
    )
    .run_reported(Trigger::Http, ExecutionWindow::new(10, 9_000_000_000_000))
    .await
    .unwrap();

    assert_eq!(summary.failed, 2);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.level == FaultLevel::Error));
    assert!(reports[0].message.contains("out of range"));
}
