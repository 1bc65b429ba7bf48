//! On-demand forecasting of a process's future CPU or memory usage.
//!
//! Each invocation is independent: copy the process history out of the
//! store, check sufficiency, fit a trend model, and predict a fixed number
//! of future points at the sampling cadence. All failures resolve to one of
//! three outcome states rather than propagating.

pub mod model;

use crate::config::ForecastConfig;
use crate::monitor::{HistoryStore, Sample};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use model::TrendModel;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Metric selectable for forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Mem,
}

impl Metric {
    fn value_of(self, sample: &Sample) -> f64 {
        match self {
            Metric::Cpu => sample.cpu,
            Metric::Mem => sample.mem,
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Metric::Cpu),
            "mem" => Ok(Metric::Mem),
            other => Err(format!(
                "unknown metric '{}', expected 'cpu' or 'mem'",
                other
            )),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Cpu => write!(f, "cpu"),
            Metric::Mem => write!(f, "mem"),
        }
    }
}

/// One predicted future point with its uncertainty interval.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub ts: DateTime<Utc>,
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

/// The three mutually exclusive outcomes of a forecast request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ForecastOutcome {
    /// Not enough history yet. A progress report, not a failure.
    Waiting { points: usize, threshold: usize },
    Success {
        pid: u32,
        metric: Metric,
        current_value: f64,
        predictions: Vec<Prediction>,
    },
    Error { message: String },
}

/// Forecast `metric` for `pid`: copy history, fit, predict.
///
/// Fitting runs on the blocking pool under a timeout so a pathological
/// series stalls only its own request.
pub async fn run(
    store: &HistoryStore,
    pid: u32,
    metric: Metric,
    config: &ForecastConfig,
) -> ForecastOutcome {
    // Copy-then-release: the lock is gone before any numeric work starts.
    let history = store.read(pid);
    let timeout = Duration::from_millis(config.timeout_ms);
    let config = config.clone();

    let fit = tokio::task::spawn_blocking(move || evaluate(&history, pid, metric, &config));
    match tokio::time::timeout(timeout, fit).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!(pid, %metric, "Forecast task failed: {}", e);
            ForecastOutcome::Error {
                message: format!("forecast task failed: {}", e),
            }
        }
        Err(_) => ForecastOutcome::Error {
            message: "model fitting timed out".to_string(),
        },
    }
}

/// Pure forecast evaluation over an already-copied history slice.
pub fn evaluate(
    history: &[Sample],
    pid: u32,
    metric: Metric,
    config: &ForecastConfig,
) -> ForecastOutcome {
    if history.len() < config.min_points {
        return ForecastOutcome::Waiting {
            points: history.len(),
            threshold: config.min_points,
        };
    }

    // min_points can be configured down to zero; keep the guard total.
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return ForecastOutcome::Waiting {
            points: 0,
            threshold: config.min_points,
        };
    };

    // Fit on seconds since the first observation. Raw epoch seconds are
    // large enough to lose the regression sums to cancellation.
    let origin = first.ts;
    let xs: Vec<f64> = history
        .iter()
        .map(|s| (s.ts - origin).num_milliseconds() as f64 / 1000.0)
        .collect();
    let ys: Vec<f64> = history.iter().map(|s| metric.value_of(s)).collect();

    let model = match TrendModel::fit(&xs, &ys, config.interval_width) {
        Ok(model) => model,
        Err(e) => {
            return ForecastOutcome::Error {
                message: e.to_string(),
            }
        }
    };

    let step = ChronoDuration::seconds(config.step_secs as i64);

    let mut predictions = Vec::with_capacity(config.horizon);
    for h in 1..=config.horizon {
        let ts = last.ts + step * h as i32;
        let x = (ts - origin).num_milliseconds() as f64 / 1000.0;
        let (estimate, lower, upper) = model.predict(x, h);
        if !estimate.is_finite() || !lower.is_finite() || !upper.is_finite() {
            return ForecastOutcome::Error {
                message: "prediction produced non-finite values".to_string(),
            };
        }
        predictions.push(Prediction {
            ts,
            estimate,
            lower,
            upper,
        });
    }

    ForecastOutcome::Success {
        pid,
        metric,
        current_value: metric.value_of(last),
        predictions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;

    fn history(pid: u32, n: usize, value: impl Fn(usize) -> f64) -> Vec<Sample> {
        let start = Utc::now();
        (0..n)
            .map(|i| Sample {
                pid,
                ts: start + ChronoDuration::seconds(5 * i as i64),
                cpu: value(i),
                mem: value(i) / 2.0,
            })
            .collect()
    }

    #[test]
    fn test_waiting_reports_exact_count() {
        let config = ForecastConfig::default();
        let outcome = evaluate(&history(42, 9, |_| 1.0), 42, Metric::Cpu, &config);
        match outcome {
            ForecastOutcome::Waiting { points, threshold } => {
                assert_eq!(points, 9);
                assert_eq!(threshold, 10);
            }
            other => panic!("expected Waiting, got {:?}", other),
        }
    }

    #[test]
    fn test_success_shape() {
        let config = ForecastConfig::default();
        let outcome = evaluate(
            &history(7, 30, |i| 10.0 + i as f64),
            7,
            Metric::Cpu,
            &config,
        );
        match outcome {
            ForecastOutcome::Success {
                pid,
                metric,
                current_value,
                predictions,
            } => {
                assert_eq!(pid, 7);
                assert_eq!(metric, Metric::Cpu);
                assert_eq!(current_value, 39.0);
                assert_eq!(predictions.len(), 12);
                for p in &predictions {
                    assert!(p.lower <= p.estimate && p.estimate <= p.upper);
                }
                // Linearly increasing series: strictly increasing estimates.
                for pair in predictions.windows(2) {
                    assert!(pair[1].estimate > pair[0].estimate);
                }
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_series_does_not_fault() {
        let config = ForecastConfig::default();
        let outcome = evaluate(&history(1, 20, |_| 33.0), 1, Metric::Mem, &config);
        match outcome {
            ForecastOutcome::Success { predictions, .. } => {
                for p in &predictions {
                    assert!((p.estimate - 16.5).abs() < 1e-9);
                    assert!(p.lower <= p.estimate && p.estimate <= p.upper);
                }
            }
            ForecastOutcome::Error { .. } => {}
            ForecastOutcome::Waiting { .. } => panic!("20 points should not be Waiting"),
        }
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("cpu".parse::<Metric>().unwrap(), Metric::Cpu);
        assert_eq!("mem".parse::<Metric>().unwrap(), Metric::Mem);
        assert!("disk".parse::<Metric>().is_err());
    }

    #[tokio::test]
    async fn test_run_reads_store() {
        let store = crate::monitor::HistoryStore::new(100);
        for sample in history(5, 12, |i| i as f64) {
            store.append(sample);
        }

        let outcome = run(&store, 5, Metric::Cpu, &ForecastConfig::default()).await;
        assert!(matches!(outcome, ForecastOutcome::Success { .. }));

        let outcome = run(&store, 6, Metric::Cpu, &ForecastConfig::default()).await;
        assert!(matches!(
            outcome,
            ForecastOutcome::Waiting {
                points: 0,
                threshold: 10
            }
        ));
    }
}
