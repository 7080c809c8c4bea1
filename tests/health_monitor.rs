//! Background health monitor against live mock backends.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use service_gateway::config::HealthCheckConfig;
use service_gateway::health::HealthMonitor;
use service_gateway::{Registry, Shutdown};

mod common;
use common::{MockBackend, MockResponse};

fn monitor(registry: &Arc<Registry>, interval_ms: u64, timeout_ms: u64) -> HealthMonitor {
    let config = HealthCheckConfig {
        enabled: true,
        interval_ms,
        timeout_ms,
        ..HealthCheckConfig::default()
    };
    HealthMonitor::new(registry.clone(), &config)
}

fn health_hits(backend: &MockBackend) -> usize {
    backend
        .requests()
        .iter()
        .filter(|r| r.target == "/health")
        .count()
}

#[tokio::test]
async fn test_spawned_monitor_stops_on_shutdown() {
    let backend = MockBackend::named("a").await;
    let registry = Arc::new(Registry::new());
    registry.register("task-service", &backend.url()).unwrap();

    let shutdown = Shutdown::new();
    let handle = monitor(&registry, 50, 500).spawn(shutdown.subscribe());

    tokio::time::sleep(Duration::from_millis(150)).await;
    shutdown.trigger();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("monitor did not stop")
        .expect("monitor task panicked");
    assert!(health_hits(&backend) >= 1);
}

#[tokio::test]
async fn test_cycles_do_not_overlap() {
    let slow = MockBackend::start(|_| MockResponse::health("ok").delayed(Duration::from_millis(200))).await;
    let registry = Arc::new(Registry::new());
    registry.register("task-service", &slow.url()).unwrap();

    let shutdown = Shutdown::new();
    let handle = monitor(&registry, 50, 1_000).spawn(shutdown.subscribe());

    tokio::time::sleep(Duration::from_millis(450)).await;
    shutdown.trigger();
    handle.await.unwrap();

    // A 50 ms ticker over 450 ms would start ~9 probes if cycles overlapped.
    let hits = health_hits(&slow);
    assert!((1..=3).contains(&hits), "{} probes started", hits);
}

#[tokio::test]
async fn test_slow_instance_does_not_delay_others() {
    let stalled = MockBackend::start(|_| MockResponse::health("ok").delayed(Duration::from_secs(5))).await;
    let live = MockBackend::named("live").await;
    let registry = Arc::new(Registry::new());
    registry.register("task-service", &stalled.url()).unwrap();
    registry.register("task-service", &live.url()).unwrap();

    let started = Instant::now();
    let summary = monitor(&registry, 30_000, 300).run_cycle().await;
    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert_eq!(summary.probed, 2);
    assert_eq!(summary.healthy, 1);

    let group = registry.get("task-service").unwrap();
    assert!(group.find_by_url(&live.url()).unwrap().healthy);
    assert!(!group.find_by_url(&stalled.url()).unwrap().healthy);
}

#[tokio::test]
async fn test_freshly_reported_instance_is_skipped() {
    let backend = MockBackend::named("a").await;
    let registry = Arc::new(Registry::new());
    let id = registry.register("task-service", &backend.url()).unwrap();
    registry.record_report("task-service", id, false, SystemTime::now());

    let summary = monitor(&registry, 30_000, 500).run_cycle().await;
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.probed, 0);
    assert_eq!(health_hits(&backend), 0);
    assert!(registry.healthy("task-service").is_empty());
}

#[tokio::test]
async fn test_error_status_and_malformed_body_count_as_failures() {
    let failing = MockBackend::start(|_| MockResponse::json(500, r#"{"status":"ok"}"#)).await;
    let garbled = MockBackend::start(|_| MockResponse::json(200, "definitely not json")).await;
    let statusless = MockBackend::start(|_| MockResponse::json(200, "{}")).await;
    let registry = Arc::new(Registry::new());
    for backend in [&failing, &garbled, &statusless] {
        registry.register("task-service", &backend.url()).unwrap();
    }

    let summary = monitor(&registry, 30_000, 500).run_cycle().await;
    assert_eq!(summary.probed, 3);
    assert_eq!(summary.healthy, 0);
    for instance in registry.get("task-service").unwrap().instances {
        assert!(!instance.healthy, "{}", instance.base_url);
        assert_eq!(instance.consecutive_failures, 1);
    }
}
