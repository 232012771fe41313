//! # Concurrency
//!
//! Per-feed atomicity under parallel submitters. Each test runs on the
//! multi-threaded runtime so submissions genuinely race.

use std::collections::HashSet;
use std::sync::Arc;

use oracle_aggregation::{AggregationStrategy, ErrorKind, OracleApi, OracleConfig};
use parking_lot::Mutex;

use super::fixtures::{feed_id, reporter_id, request, Oracle};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_submitters_close_each_round_once() {
    let oracle = Oracle::new(OracleConfig::default());
    oracle.add_feed("feed-1", AggregationStrategy::Median, 3).await;
    let reporters: Vec<String> = (1..=9).map(|i| format!("r{}", i)).collect();
    for id in &reporters {
        oracle.add_reporters(&[(id.as_str(), 1_000)]).await;
    }

    let mut handles = Vec::new();
    for id in reporters.clone() {
        let service = oracle.service.clone();
        handles.push(tokio::spawn(async move {
            service.submit(request("feed-1", &id, 500)).await
        }));
    }

    let mut closed = 0;
    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        if receipt.aggregated.is_some() {
            closed += 1;
        }
    }

    assert_eq!(closed, 3);
    assert_eq!(oracle.service.current_round(&feed_id("feed-1")).await.unwrap(), 4);

    let history = oracle.service.get_history(&feed_id("feed-1"), 10).await.unwrap();
    assert_eq!(history.len(), 3);
    let mut contributors = HashSet::new();
    for (i, result) in history.iter().enumerate() {
        assert_eq!(result.round, i as u64 + 1);
        assert_eq!(result.oracle_count, 3);
        for reporter in &result.reporters {
            assert!(contributors.insert(reporter.clone()), "{} counted twice", reporter);
        }
    }
    assert_eq!(contributors.len(), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_feeds_progress_independently() {
    let oracle = Oracle::new(OracleConfig::default());
    let feeds: Vec<String> = (0..8).map(|i| format!("feed-{}", i)).collect();
    for feed in &feeds {
        oracle.add_feed(feed, AggregationStrategy::TrimmedMean, 3).await;
    }
    oracle
        .add_reporters(&[("r1", 5_000), ("r2", 3_000), ("r3", 2_000)])
        .await;

    let mut handles = Vec::new();
    for (i, feed) in feeds.clone().into_iter().enumerate() {
        let service = oracle.service.clone();
        handles.push(tokio::spawn(async move {
            let value = 1_000 + i as u128;
            for round in 0..5u128 {
                for reporter in ["r1", "r2", "r3"] {
                    service
                        .submit(request(&feed, reporter, value + round))
                        .await
                        .unwrap();
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for (i, feed) in feeds.iter().enumerate() {
        let id = feed_id(feed);
        assert_eq!(oracle.service.current_round(&id).await.unwrap(), 6);
        let latest = oracle.service.get_latest_value(&id).await.unwrap();
        assert_eq!(latest.value, 1_004 + i as u128);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_breaker_and_round_state_stay_consistent() {
    let oracle = Oracle::reference().await;
    let feeds: Vec<String> = (0..6).map(|i| format!("site-{}", i)).collect();
    for feed in &feeds {
        oracle.add_feed(feed, AggregationStrategy::Median, 3).await;
    }

    let rejections = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::new();
    for feed in feeds.clone() {
        let service = oracle.service.clone();
        let rejections = rejections.clone();
        handles.push(tokio::spawn(async move {
            for (reporter, value) in [("r1", 100), ("r2", 100), ("r3", 400)] {
                if let Err(e) = service.submit(request(&feed, reporter, value)).await {
                    rejections.lock().push(e.kind());
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(oracle.service.is_circuit_breaker_active().await);
    assert!(rejections.lock().iter().all(|kind| *kind == ErrorKind::State));

    // Every closed round is exactly one recorded anomaly
    let mut closed = 0;
    for feed in &feeds {
        let round = oracle.service.current_round(&feed_id(feed)).await.unwrap();
        assert!(round == 1 || round == 2);
        if round == 2 {
            closed += 1;
        }
    }
    let unresolved = oracle.service.unresolved_anomaly_count().await;
    assert!(unresolved >= 3);
    assert_eq!(closed, unresolved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_snapshots_stay_consistent_under_load() {
    let oracle = Oracle::new(OracleConfig::default().with_circuit_breaker_threshold(10_000));
    let feeds: Vec<String> = (0..4).map(|i| format!("site-{}", i)).collect();
    for feed in &feeds {
        oracle.add_feed(feed, AggregationStrategy::Median, 3).await;
    }
    oracle
        .add_reporters(&[("r1", 5_000), ("r2", 3_000), ("r3", 2_000)])
        .await;

    let mut handles = Vec::new();
    for feed in feeds.clone() {
        let service = oracle.service.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                for (reporter, value) in [("r1", 100), ("r2", 100), ("r3", 400)] {
                    service.submit(request(&feed, reporter, value)).await.unwrap();
                }
            }
        }));
    }

    let admin = {
        let service = oracle.service.clone();
        let operator = oracle.operator.clone();
        tokio::spawn(async move {
            let r1 = reporter_id("r1");
            for _ in 0..200 {
                service.reset_circuit_breaker(&operator).await.unwrap();
                service.adjust_reputation(&operator, &r1, 0).await.unwrap();
            }
        })
    };

    // Every closed round is one anomaly, so each copy must balance exactly
    let checker = {
        let service = oracle.service.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..200 {
                let snapshot = service.snapshot();
                let closed: u64 = snapshot
                    .feeds
                    .iter()
                    .map(|feed| feed.rounds.current_round() - 1)
                    .sum();
                assert_eq!(snapshot.safety.anomalies.len() as u64, closed);
            }
        })
    };

    let all = async {
        for handle in handles {
            handle.await.unwrap();
        }
        admin.await.unwrap();
        checker.await.unwrap();
    };
    tokio::time::timeout(std::time::Duration::from_secs(30), all)
        .await
        .expect("snapshot, submit and admin paths finished");

    assert_eq!(oracle.service.unresolved_anomaly_count().await, 200);
}
