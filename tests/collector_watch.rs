//! End-to-end tests of the collector against a mock cluster API.

use std::sync::Arc;
use std::time::Duration;

use phase_collector::config::CollectorConfig;
use phase_collector::lifecycle::{Collector, CollectorError, Shutdown};
use phase_collector::recorder::{MemorySink, PhaseLabels};
use phase_collector::watch::WatchError;

mod common;

const TOKEN: &str = "test-token";
const SERIES: &str = "resource_phase_duration_kubevirt_io_v1_virtualmachineinstances_seconds";

fn config(server: String, token: &str) -> CollectorConfig {
    let mut config = CollectorConfig::default();
    config.watch.group = "kubevirt.io".into();
    config.watch.version = "v1".into();
    config.watch.resource = "virtualmachineinstances".into();
    config.watch.namespace = "vms".into();
    config.cluster.server = Some(server);
    config.cluster.token = Some(token.to_string());
    config.observability.metrics_enabled = false;
    config
}

fn lifecycle_feed() -> String {
    let pending = ("Pending", "2024-01-01T00:00:00Z");
    let running = ("Running", "2024-01-01T00:00:10Z");
    let succeeded = ("Succeeded", "2024-01-01T00:00:30Z");
    let y_running = ("Running", "2024-01-01T00:01:00Z");
    let y_failed = ("Failed", "2024-01-01T00:01:45Z");

    [
        common::event("ADDED", common::vmi("vms", "x", "Pending", &[pending])),
        common::event("ADDED", common::vmi("vms", "y", "Running", &[y_running])),
        common::event("MODIFIED", common::vmi("vms", "x", "Pending", &[pending])),
        common::event("MODIFIED", common::vmi("vms", "x", "Running", &[pending, running])),
        "this is not json".to_string(),
        common::event("BOOKMARK", serde_json::json!({ "metadata": { "resourceVersion": "7" } })),
        common::event("MODIFIED", common::vmi("vms", "x", "Succeeded", &[pending, running, succeeded])),
        common::event("DELETED", common::vmi("vms", "y", "Failed", &[y_running, y_failed])),
        common::event("DELETED", common::vmi("vms", "never-seen", "Running", &[y_running])),
    ]
    .join("\n")
}

#[tokio::test]
async fn test_records_phase_durations_from_watch() {
    let cluster = common::start_mock_cluster(TOKEN, lifecycle_feed()).await;
    let mut config = config(cluster.url(), TOKEN);
    config.watch.label_selector = "app=test".into();

    let sink = Arc::new(MemorySink::new());
    let collector = Collector::new(config).unwrap();
    let summary = collector.run_with_sink(sink.clone(), &Shutdown::new()).await.unwrap();

    assert_eq!(summary.upserts, 5);
    assert_eq!(summary.deletes, 2);
    assert_eq!(summary.transitions, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.ignored, 1);

    assert_eq!(sink.value(SERIES, &PhaseLabels::new("vms", "x", "Pending")), Some(10.0));
    assert_eq!(sink.value(SERIES, &PhaseLabels::new("vms", "x", "Running")), Some(20.0));
    assert_eq!(sink.value(SERIES, &PhaseLabels::new("vms", "y", "Running")), Some(45.0));
    assert_eq!(sink.value(SERIES, &PhaseLabels::new("vms", "never-seen", "Running")), None);
    assert_eq!(sink.write_count(), 3);

    let requests = cluster.watch_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].get("watch").map(String::as_str), Some("true"));
    assert_eq!(requests[0].get("labelSelector").map(String::as_str), Some("app=test"));
    assert_eq!(requests[0].get("namespace").map(String::as_str), Some("vms"));
    assert!(!requests[0].contains_key("fieldSelector"));
}

#[tokio::test]
async fn test_resolves_kind_through_discovery() {
    let feed = common::event(
        "ADDED",
        common::vmi("vms", "x", "Pending", &[("Pending", "2024-01-01T00:00:00Z")]),
    );
    let cluster = common::start_mock_cluster(TOKEN, feed).await;

    let mut config = config(cluster.url(), TOKEN);
    config.watch.resource.clear();
    config.watch.kind = "VirtualMachineInstance".into();

    let sink = Arc::new(MemorySink::new());
    let collector = Collector::new(config).unwrap();
    let summary = collector.run_with_sink(sink.clone(), &Shutdown::new()).await.unwrap();

    assert_eq!(summary.upserts, 1);
    assert_eq!(sink.write_count(), 0);
    assert_eq!(cluster.watch_requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_kind_is_fatal() {
    let cluster = common::start_mock_cluster(TOKEN, String::new()).await;

    let mut config = config(cluster.url(), TOKEN);
    config.watch.resource.clear();
    config.watch.kind = "VirtualMachineInstanceMigration".into();

    let collector = Collector::new(config).unwrap();
    let err = collector
        .run_with_sink(Arc::new(MemorySink::new()), &Shutdown::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CollectorError::Watch(WatchError::KindNotFound { .. })));
    assert!(cluster.watch_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_credentials() {
    let cluster = common::start_mock_cluster(TOKEN, String::new()).await;
    let collector = Collector::new(config(cluster.url(), "wrong-token")).unwrap();

    let err = collector
        .run_with_sink(Arc::new(MemorySink::new()), &Shutdown::new())
        .await
        .unwrap_err();
    match err {
        CollectorError::Watch(WatchError::Status { status, .. }) => assert_eq!(status, 401),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_shutdown_before_start_is_honoured() {
    let feed = common::event("ADDED", common::vmi("vms", "x", "Pending", &[]));
    let cluster = common::start_open_mock_cluster(TOKEN, feed).await;
    let collector = Collector::new(config(cluster.url(), TOKEN)).unwrap();

    let shutdown = Shutdown::new();
    shutdown.trigger();

    let summary = tokio::time::timeout(
        Duration::from_secs(3),
        collector.run_with_sink(Arc::new(MemorySink::new()), &shutdown),
    )
    .await
    .expect("collector ignored shutdown")
    .unwrap();

    assert!(summary.shutdown);
    assert_eq!(summary.upserts, 0);
    assert!(cluster.watch_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_shutdown_stops_open_watch() {
    let feed = common::event(
        "ADDED",
        common::vmi("vms", "x", "Pending", &[("Pending", "2024-01-01T00:00:00Z")]),
    );
    let cluster = common::start_open_mock_cluster(TOKEN, feed).await;
    let collector = Collector::new(config(cluster.url(), TOKEN)).unwrap();

    let shutdown = Shutdown::new();
    let task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { collector.run_with_sink(Arc::new(MemorySink::new()), &shutdown).await })
    };

    while cluster.watch_requests.lock().unwrap().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown.trigger();

    let summary = tokio::time::timeout(Duration::from_secs(3), task)
        .await
        .expect("collector ignored shutdown")
        .unwrap()
        .unwrap();
    assert!(summary.shutdown);
}
