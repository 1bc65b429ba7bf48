//! End-to-end pipeline tests: store + sampler + scorer + forecaster wired
//! together the way the daemon uses them.

use chrono::{Duration as ChronoDuration, Utc};
use procwatch::api::AppState;
use procwatch::collector::{ProcessCollector, ProcessRecord};
use procwatch::config::{Config, ForecastConfig};
use procwatch::detect::{score_snapshot, ScoringConfig};
use procwatch::forecast::{self, ForecastOutcome, Metric};
use procwatch::monitor::{HistoryStore, Sample};
use std::sync::Arc;

struct FixedCollector(Vec<ProcessRecord>);

impl ProcessCollector for FixedCollector {
    fn collect(&self) -> Vec<ProcessRecord> {
        self.0.clone()
    }
}

fn record(pid: u32, name: &str, cpu: f64, mem: f64) -> ProcessRecord {
    ProcessRecord {
        pid,
        name: name.to_string(),
        cpu_percent: cpu,
        mem_percent: mem,
    }
}

fn seed_history(store: &HistoryStore, pid: u32, n: usize, value: impl Fn(usize) -> f64) {
    let start = Utc::now();
    for i in 0..n {
        store.append(Sample {
            pid,
            ts: start + ChronoDuration::seconds(5 * i as i64),
            cpu: value(i),
            mem: value(i),
        });
    }
}

#[tokio::test]
async fn test_forecast_waiting_below_threshold() {
    let store = HistoryStore::new(1000);
    seed_history(&store, 42, 9, |_| 12.0);

    let outcome = forecast::run(&store, 42, Metric::Cpu, &ForecastConfig::default()).await;
    match outcome {
        ForecastOutcome::Waiting { points, threshold } => {
            assert_eq!(points, 9);
            assert_eq!(threshold, 10);
        }
        other => panic!("expected Waiting, got {:?}", other),
    }
}

#[tokio::test]
async fn test_forecast_linear_memory_series() {
    let store = HistoryStore::new(1000);
    // 30 samples, +1 unit every 5 seconds.
    seed_history(&store, 7, 30, |i| 100.0 + i as f64);

    let outcome = forecast::run(&store, 7, Metric::Mem, &ForecastConfig::default()).await;
    match outcome {
        ForecastOutcome::Success {
            pid,
            current_value,
            predictions,
            ..
        } => {
            assert_eq!(pid, 7);
            assert_eq!(current_value, 129.0);
            assert_eq!(predictions.len(), 12);
            for pair in predictions.windows(2) {
                assert!(pair[1].estimate > pair[0].estimate);
                assert!(pair[1].ts > pair[0].ts);
            }
            for p in &predictions {
                assert!(p.lower <= p.estimate && p.estimate <= p.upper);
            }
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_forecast_degenerate_series_never_faults() {
    let store = HistoryStore::new(1000);
    seed_history(&store, 3, 25, |_| 50.0);

    let outcome = forecast::run(&store, 3, Metric::Cpu, &ForecastConfig::default()).await;
    match outcome {
        ForecastOutcome::Success { predictions, .. } => {
            assert_eq!(predictions.len(), 12);
            for p in &predictions {
                assert!(p.lower <= p.estimate && p.estimate <= p.upper);
            }
        }
        ForecastOutcome::Error { .. } => {} // acceptable per contract
        ForecastOutcome::Waiting { .. } => panic!("25 points should not be Waiting"),
    }
}

#[tokio::test]
async fn test_concurrent_forecasts_are_independent() {
    let store = HistoryStore::new(1000);
    seed_history(&store, 1, 30, |i| i as f64);
    seed_history(&store, 2, 30, |_| 5.0);

    let config = ForecastConfig::default();
    let (a, b) = tokio::join!(
        forecast::run(&store, 1, Metric::Cpu, &config),
        forecast::run(&store, 2, Metric::Mem, &config),
    );

    match (a, b) {
        (
            ForecastOutcome::Success {
                pid: pid_a,
                current_value: cur_a,
                ..
            },
            ForecastOutcome::Success {
                pid: pid_b,
                current_value: cur_b,
                ..
            },
        ) => {
            assert_eq!(pid_a, 1);
            assert_eq!(cur_a, 29.0);
            assert_eq!(pid_b, 2);
            assert_eq!(cur_b, 5.0);
        }
        other => panic!("expected two Success outcomes, got {:?}", other),
    }
}

#[test]
fn test_concurrent_appends_and_reads_no_torn_rows() {
    let store = HistoryStore::new(10_000);
    let mut handles = Vec::new();

    // Two writers appending distinct pids, two readers polling.
    for pid in [100u32, 200u32] {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..500 {
                store.append(Sample {
                    pid,
                    ts: Utc::now(),
                    cpu: pid as f64,
                    mem: pid as f64 * 2.0,
                });
                if i % 50 == 0 {
                    std::thread::yield_now();
                }
            }
        }));
    }

    for pid in [100u32, 200u32] {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..200 {
                let history = store.read(pid);
                for sample in &history {
                    // Every observed row is fully formed: field values are
                    // exactly what the writer for this pid produced.
                    assert_eq!(sample.pid, pid);
                    assert_eq!(sample.cpu, pid as f64);
                    assert_eq!(sample.mem, pid as f64 * 2.0);
                }
                for pair in history.windows(2) {
                    assert!(pair[0].ts <= pair[1].ts);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(100), 500);
    assert_eq!(store.len(200), 500);
}

#[test]
fn test_scorer_deterministic_over_snapshot() {
    let records = vec![
        record(1, "bash", 1.0, 0.5),
        record(2, "xmrig", 95.0, 80.0),
        record(3, "postgres", 20.0, 30.0),
        record(4, "firefox", 15.0, 25.0),
    ];
    let config = ScoringConfig::default();

    let first = score_snapshot(&records, &config);
    let second = score_snapshot(&records, &config);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.pid, b.pid);
        assert_eq!(a.score, b.score);
        assert_eq!(a.anomaly, b.anomaly);
        assert_eq!(a.reasons, b.reasons);
    }

    let flagged = first.iter().find(|s| s.pid == 2).unwrap();
    assert!(flagged.anomaly);
    assert!(!flagged.reasons.is_empty());
}

#[tokio::test]
async fn test_classify_and_score_limit() {
    let records: Vec<ProcessRecord> = (1..=50)
        .map(|i| record(i, "worker", 1.0, 1.0))
        .collect();
    let state = AppState::new(
        Arc::new(FixedCollector(records)),
        HistoryStore::new(100),
        Config::default(),
    );

    assert_eq!(state.classified_snapshot(10).await.len(), 10);
    assert_eq!(state.classified_snapshot(50).await.len(), 50);
    assert_eq!(state.classified_snapshot(500).await.len(), 50);
    assert!(state.classified_snapshot(0).await.is_empty());
}

#[tokio::test]
async fn test_state_forecast_matches_store_contents() {
    let state = AppState::new(
        Arc::new(FixedCollector(vec![])),
        HistoryStore::new(100),
        Config::default(),
    );
    seed_history(&state.history, 9, 15, |i| i as f64 * 2.0);

    let outcome = state.forecast(9, Metric::Cpu).await;
    match outcome {
        ForecastOutcome::Success { current_value, .. } => {
            assert_eq!(current_value, 28.0);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}
