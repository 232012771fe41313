//! # Events, Metrics and Snapshots
//!
//! What the engine tells the outside world: the event stream a downstream
//! subscriber sees, the Prometheus exposition, and the persisted state it
//! restarts from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oracle_aggregation::adapters::{
    spawn_snapshot_task, FileSnapshotStore, InMemorySnapshotStore, ManualTimeSource,
};
use oracle_aggregation::ports::{OracleEventSink, SnapshotStore};
use oracle_aggregation::{
    AggregationStrategy, OracleApi, OracleConfig, OracleEvent, OracleService, Principal,
};
use parking_lot::Mutex;

use super::fixtures::{definition, feed_id, registration, request, Oracle, START};

/// Keeps every published event in order
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<OracleEvent>>,
}

impl RecordingSink {
    fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl OracleEventSink for RecordingSink {
    async fn publish(&self, event: OracleEvent) {
        self.events.lock().push(event);
    }
}

#[tokio::test]
async fn test_event_stream_for_anomalous_round() {
    let sink = Arc::new(RecordingSink::default());
    let operator = Principal::new("operator").unwrap();
    let service = OracleService::new(
        OracleConfig::default().with_circuit_breaker_threshold(1),
        operator.clone(),
        Arc::new(ManualTimeSource::new(START)),
        sink.clone(),
    )
    .unwrap();

    service
        .create_feed(&operator, definition("feed-1", AggregationStrategy::Median, 3))
        .await
        .unwrap();
    for (id, weight) in [("r1", 5_000), ("r2", 3_000), ("r3", 2_000)] {
        service
            .register_reporter(&operator, registration(id, weight))
            .await
            .unwrap();
    }
    for (reporter, value) in [("r1", 100), ("r2", 100), ("r3", 200)] {
        service.submit(request("feed-1", reporter, value)).await.unwrap();
    }

    assert_eq!(
        sink.names(),
        vec![
            "submission_accepted",
            "submission_accepted",
            "submission_accepted",
            "value_aggregated",
            "anomaly_detected",
            "circuit_breaker_tripped",
        ]
    );

    // Subscribers on the other side of a wire get the same event back
    let aggregated = sink.events.lock()[3].clone();
    let json = serde_json::to_string(&aggregated).unwrap();
    assert!(json.contains("\"ValueAggregated\""));
    let decoded: OracleEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, aggregated);
}

#[tokio::test]
async fn test_broadcast_subscriber_sees_reset() {
    let oracle = Oracle::new(OracleConfig::default().with_circuit_breaker_threshold(1));
    oracle.add_feed("feed-1", AggregationStrategy::Median, 3).await;
    oracle
        .add_reporters(&[("r1", 5_000), ("r2", 3_000), ("r3", 2_000)])
        .await;
    oracle
        .submit_round("feed-1", &[("r1", 100), ("r2", 100), ("r3", 200)])
        .await;

    let mut subscriber = oracle.sink.subscribe();
    oracle
        .service
        .resolve_anomaly(&oracle.operator, 1, "duplicate meter reading".to_string())
        .await
        .unwrap();
    oracle
        .service
        .reset_circuit_breaker(&oracle.operator)
        .await
        .unwrap();

    let resolved = subscriber.recv().await.unwrap();
    assert_eq!(
        resolved,
        OracleEvent::AnomalyResolved {
            anomaly_id: 1,
            by: oracle.operator.clone(),
            unresolved: 0,
        }
    );
    let reset = subscriber.recv().await.unwrap();
    assert_eq!(reset.name(), "circuit_breaker_reset");
}

#[tokio::test]
async fn test_metrics_exposed_through_telemetry() {
    let oracle = Oracle::reference().await;
    oracle
        .submit_round("feed-1", &[("r1", 100), ("r2", 102), ("r3", 98)])
        .await;
    let _ = oracle.submit("missing-feed", "r1", 100).await;

    let text = oracle_telemetry::encode_metrics().unwrap();
    assert!(text.contains("oracle_submissions_accepted_total"));
    assert!(text.contains("oracle_aggregations_total"));
    assert!(text.contains("oracle_submissions_rejected_total"));
    assert!(text.contains("oracle_last_quality_score"));
}

#[tokio::test]
async fn test_restart_from_file_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path().join("oracle.snapshot"));

    let oracle = Oracle::reference().await;
    oracle
        .submit_round("feed-1", &[("r1", 100), ("r2", 102), ("r3", 98)])
        .await;
    oracle.submit("feed-1", "r1", 110).await.unwrap();
    store.save(&oracle.service.snapshot()).unwrap();

    let restarted = Oracle::new(OracleConfig::default());
    let snapshot = store.load().unwrap().expect("snapshot on disk");
    restarted.service.restore(snapshot);

    let id = feed_id("feed-1");
    let latest = restarted.service.get_latest_value(&id).await.unwrap();
    assert_eq!(latest.value, 100);
    assert_eq!(restarted.service.current_round(&id).await.unwrap(), 2);

    // The open round carries over: two more reporters close it
    restarted.submit("feed-1", "r2", 110).await.unwrap();
    let receipt = restarted.submit("feed-1", "r3", 110).await.unwrap();
    assert_eq!(receipt.aggregated.unwrap().value, 110);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_snapshots() {
    let oracle = Oracle::reference().await;
    let store = Arc::new(InMemorySnapshotStore::new());

    let task = spawn_snapshot_task(oracle.service.clone(), store.clone(), Duration::from_secs(30));
    tokio::time::sleep(Duration::from_secs(95)).await;
    task.abort();

    assert!(store.save_count() >= 3);
    let latest = store.load().unwrap().expect("snapshot saved");
    assert_eq!(latest.feeds.len(), 1);
    assert_eq!(latest.reporters.len(), 3);
}
