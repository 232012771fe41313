//! # Reference Scenarios
//!
//! End-to-end runs of the reference numbers through the public API, plus the
//! numeric properties the downstream issuance logic relies on:
//!
//! 1. Quorum of three around 100 aggregates to 100 without anomaly
//! 2. One outlier out of three is an anomaly, the aggregate still publishes
//! 3. Three unresolved anomalies trip the breaker for every feed
//! 4. Zero-weight registration is rejected without side effects
//! 5. A ring of capacity two keeps the two latest rounds in order

use oracle_aggregation::config::QualityConfig;
use oracle_aggregation::domain::{AggregationEngine, QualityInputs};
use oracle_aggregation::{AggregationStrategy, ErrorKind, OracleApi, OracleConfig};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::fixtures::{feed_id, registration, reporter_id, Oracle, FRESHNESS_WINDOW, START};

const FIVE_REPORTERS: [(&str, u32); 5] = [
    ("r1", 5_000),
    ("r2", 3_000),
    ("r3", 2_000),
    ("r4", 1_000),
    ("r5", 500),
];

// =============================================================================
// REFERENCE SCENARIOS
// =============================================================================

#[tokio::test]
async fn test_scenario_quorum_of_three() {
    let oracle = Oracle::reference().await;

    let receipt = oracle
        .submit_round("feed-1", &[("r1", 100), ("r2", 102), ("r3", 98)])
        .await;
    let result = receipt.aggregated.expect("third submission closes the round");

    assert_eq!(result.value, 100);
    assert_eq!(result.oracle_count, 3);
    assert!(!result.anomaly);
    // 3 of 2 x quorum contributors costs 1500; 100 bps of dispersion is free
    assert_eq!(result.quality_score, 8_500);

    let latest = oracle.service.get_latest_value(&feed_id("feed-1")).await.unwrap();
    assert_eq!(latest.value, 100);
    assert_eq!(latest.timestamp, START);
    assert_eq!(latest.quality_score, 8_500);
}

#[tokio::test]
async fn test_scenario_single_outlier_is_anomalous() {
    let oracle = Oracle::reference().await;

    let result = oracle
        .submit_round("feed-1", &[("r1", 100), ("r2", 100), ("r3", 200)])
        .await
        .aggregated
        .unwrap();

    assert!(result.anomaly);
    assert_eq!(result.value, 100);
    assert_eq!(oracle.service.unresolved_anomaly_count().await, 1);
    assert!(!oracle.service.is_circuit_breaker_active().await);

    // Anomalous rounds still publish
    let latest = oracle.service.get_latest_value(&feed_id("feed-1")).await.unwrap();
    assert_eq!(latest.value, 100);
}

#[tokio::test]
async fn test_scenario_breaker_halts_all_feeds() {
    let oracle = Oracle::reference().await;
    oracle
        .add_feed("feed-2", AggregationStrategy::WeightedAverage, 3)
        .await;

    for _ in 0..3 {
        oracle
            .submit_round("feed-1", &[("r1", 100), ("r2", 100), ("r3", 200)])
            .await;
    }
    assert!(oracle.service.is_circuit_breaker_active().await);

    for feed in ["feed-1", "feed-2"] {
        let err = oracle.submit(feed, "r1", 100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }
}

#[tokio::test]
async fn test_scenario_zero_weight_registration() {
    let oracle = Oracle::reference().await;

    let err = oracle
        .service
        .register_reporter(&oracle.operator, registration("r4", 0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(oracle.service.get_reporter(&reporter_id("r4")).await.is_none());
    assert_eq!(oracle.service.snapshot().reporters.len(), 3);
}

#[tokio::test]
async fn test_scenario_history_capacity_two() {
    let oracle = Oracle::new(OracleConfig::default().with_history_capacity(2));
    oracle.add_feed("feed-1", AggregationStrategy::Median, 3).await;
    oracle
        .add_reporters(&[("r1", 5_000), ("r2", 3_000), ("r3", 2_000)])
        .await;

    for value in [100, 200, 300] {
        oracle
            .submit_round("feed-1", &[("r1", value), ("r2", value), ("r3", value)])
            .await;
    }

    let history = oracle.service.get_history(&feed_id("feed-1"), 10).await.unwrap();
    let rounds: Vec<(u64, u128)> = history.iter().map(|r| (r.round, r.value)).collect();
    assert_eq!(rounds, vec![(2, 200), (3, 300)]);
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[tokio::test]
async fn test_identical_inputs_aggregate_to_themselves() {
    let oracle = Oracle::new(OracleConfig::default());
    let strategies = [
        ("median", AggregationStrategy::Median),
        ("weighted-median", AggregationStrategy::WeightedMedian),
        ("trimmed-mean", AggregationStrategy::TrimmedMean),
        ("weighted-average", AggregationStrategy::WeightedAverage),
    ];
    for (feed, strategy) in strategies {
        oracle.add_feed(feed, strategy, 3).await;
    }
    oracle
        .add_reporters(&[("r1", 5_000), ("r2", 3_000), ("r3", 2_000)])
        .await;

    for (feed, _) in strategies {
        let result = oracle
            .submit_round(feed, &[("r1", 4_242), ("r2", 4_242), ("r3", 4_242)])
            .await
            .aggregated
            .unwrap();
        assert_eq!(result.value, 4_242, "strategy for {}", feed);
        assert_eq!(result.quality_score, 8_500);
    }
}

#[tokio::test]
async fn test_median_strategies_ignore_submission_order() {
    let values = [
        ("r1", 120u128),
        ("r2", 95),
        ("r3", 100),
        ("r4", 130),
        ("r5", 101),
    ];
    let mut rng = StdRng::seed_from_u64(7);

    for strategy in [AggregationStrategy::Median, AggregationStrategy::WeightedMedian] {
        let mut seen = Vec::new();
        for _ in 0..8 {
            let mut order = values.to_vec();
            order.shuffle(&mut rng);

            let oracle = Oracle::new(OracleConfig::default());
            oracle.add_feed("feed-1", strategy, 5).await;
            oracle.add_reporters(&FIVE_REPORTERS).await;

            let result = oracle
                .submit_round("feed-1", &order)
                .await
                .aggregated
                .unwrap();
            seen.push(result.value);
        }
        assert!(
            seen.windows(2).all(|w| w[0] == w[1]),
            "{:?} produced {:?}",
            strategy,
            seen
        );
    }
}

#[tokio::test]
async fn test_reference_strategy_values() {
    let oracle = Oracle::new(OracleConfig::default());
    oracle
        .add_feed("trimmed", AggregationStrategy::TrimmedMean, 5)
        .await;
    oracle
        .add_feed("weighted", AggregationStrategy::WeightedMedian, 3)
        .await;
    oracle.add_reporters(&FIVE_REPORTERS).await;

    // One trimmed from each end of five: (100 + 100 + 105) / 3
    let trimmed = oracle
        .submit_round(
            "trimmed",
            &[("r1", 95), ("r2", 100), ("r3", 100), ("r4", 105), ("r5", 1_000)],
        )
        .await
        .aggregated
        .unwrap();
    assert_eq!(trimmed.value, 101);
    assert!(!trimmed.anomaly);

    // r1 alone carries half of the total weight
    let weighted = oracle
        .submit_round("weighted", &[("r1", 100), ("r2", 200), ("r3", 300)])
        .await
        .aggregated
        .unwrap();
    assert_eq!(weighted.value, 100);
}

#[test]
fn test_quality_is_monotone_in_dispersion() {
    let engine = AggregationEngine::new(QualityConfig::default());
    let mut previous = u32::MAX;

    for spread in (0u128..=100).step_by(5) {
        let values = [100 - spread, 100, 100 + spread];
        let score = engine.quality_score(&QualityInputs {
            min_oracles: 3,
            values: &values,
            aggregate: 100,
            previous_timestamp: None,
            freshness_window: FRESHNESS_WINDOW,
            now: START,
        });

        assert!((5_000..=10_000).contains(&score), "score {} out of range", score);
        assert!(score <= previous, "spread {} raised quality", spread);
        previous = score;
    }
    assert_eq!(previous, 5_000);
}

#[tokio::test]
async fn test_anomaly_requires_more_than_a_quarter_outliers() {
    let oracle = Oracle::new(OracleConfig::default());
    oracle.add_feed("five", AggregationStrategy::Median, 5).await;
    oracle.add_feed("four", AggregationStrategy::Median, 4).await;
    oracle.add_reporters(&FIVE_REPORTERS).await;

    // 1 of 5 outliers
    let one_of_five = oracle
        .submit_round(
            "five",
            &[("r1", 100), ("r2", 100), ("r3", 100), ("r4", 100), ("r5", 150)],
        )
        .await
        .aggregated
        .unwrap();
    assert!(!one_of_five.anomaly);

    // Exactly a quarter is not enough
    let one_of_four = oracle
        .submit_round("four", &[("r1", 100), ("r2", 100), ("r3", 100), ("r4", 150)])
        .await
        .aggregated
        .unwrap();
    assert!(!one_of_four.anomaly);

    // 2 of 5 outliers
    let two_of_five = oracle
        .submit_round(
            "five",
            &[("r1", 100), ("r2", 100), ("r3", 100), ("r4", 150), ("r5", 150)],
        )
        .await
        .aggregated
        .unwrap();
    assert!(two_of_five.anomaly);
    assert_eq!(two_of_five.value, 100);
    assert_eq!(oracle.service.unresolved_anomaly_count().await, 1);
}

#[tokio::test]
async fn test_breaker_trips_exactly_at_threshold() {
    let oracle = Oracle::reference().await;
    let anomalous = [("r1", 100), ("r2", 100), ("r3", 200)];

    for expected in 1..=2u64 {
        oracle.submit_round("feed-1", &anomalous).await;
        assert_eq!(oracle.service.unresolved_anomaly_count().await, expected);
        assert!(!oracle.service.is_circuit_breaker_active().await);
    }

    oracle.submit_round("feed-1", &anomalous).await;
    assert!(oracle.service.is_circuit_breaker_active().await);

    // Resolution alone does not reopen intake
    oracle
        .service
        .resolve_anomaly(&oracle.operator, 1, "sensor recalibrated".to_string())
        .await
        .unwrap();
    assert!(oracle.service.is_circuit_breaker_active().await);
    assert_eq!(
        oracle.submit("feed-1", "r1", 100).await.unwrap_err().kind(),
        ErrorKind::State
    );

    oracle
        .service
        .reset_circuit_breaker(&oracle.operator)
        .await
        .unwrap();
    assert!(!oracle.service.is_circuit_breaker_active().await);
    assert!(oracle.submit("feed-1", "r1", 100).await.is_ok());
}

#[tokio::test]
async fn test_previous_round_does_not_count_toward_next_quorum() {
    let oracle = Oracle::reference().await;

    oracle
        .submit_round("feed-1", &[("r1", 100), ("r2", 100), ("r3", 100)])
        .await;
    assert_eq!(oracle.service.current_round(&feed_id("feed-1")).await.unwrap(), 2);

    let receipt = oracle.submit("feed-1", "r1", 101).await.unwrap();
    assert_eq!(receipt.round, 2);
    assert_eq!(receipt.contributors, 1);
    assert!(receipt.aggregated.is_none());
}

#[tokio::test]
async fn test_stale_submissions_wait_for_fresh_data() {
    let oracle = Oracle::reference().await;

    oracle.submit("feed-1", "r1", 100).await.unwrap();
    oracle.clock.advance(FRESHNESS_WINDOW + 1);
    oracle.submit("feed-1", "r2", 100).await.unwrap();

    // Quorum by count, but only two fresh values: not an error
    let receipt = oracle.submit("feed-1", "r3", 100).await.unwrap();
    assert_eq!(receipt.contributors, 3);
    assert!(receipt.aggregated.is_none());
    assert_eq!(oracle.service.current_round(&feed_id("feed-1")).await.unwrap(), 1);

    // Refreshing the stale value closes the round
    let receipt = oracle.submit("feed-1", "r1", 100).await.unwrap();
    assert_eq!(receipt.contributors, 3);
    assert_eq!(receipt.aggregated.unwrap().oracle_count, 3);
}
