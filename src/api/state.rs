//! Shared application state and the request-facing operations over it.

use crate::classify::{ClassifiedProcess, LabelStore, ProcessClassifier};
use crate::collector::ProcessCollector;
use crate::config::Config;
use crate::detect::{score_snapshot, ScoredProcess};
use crate::forecast::{self, ForecastOutcome, Metric};
use crate::monitor::HistoryStore;
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<dyn ProcessCollector>,
    pub history: HistoryStore,
    pub labels: LabelStore,
    pub classifier: ProcessClassifier,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(collector: Arc<dyn ProcessCollector>, history: HistoryStore, config: Config) -> Self {
        Self {
            collector,
            history,
            labels: LabelStore::new(),
            classifier: ProcessClassifier::default(),
            config: Arc::new(config),
        }
    }

    /// Current process snapshot with an anomaly verdict per entry.
    ///
    /// Process enumeration reads the OS table synchronously; it runs on the
    /// blocking pool, same as the sampler tick, so a slow refresh never
    /// stalls the async workers.
    pub async fn scored_snapshot(&self) -> Vec<ScoredProcess> {
        let collector = Arc::clone(&self.collector);
        let records = match tokio::task::spawn_blocking(move || collector.collect()).await {
            Ok(records) => records,
            Err(e) => {
                error!("Process enumeration failed: {}", e);
                Vec::new()
            }
        };
        score_snapshot(&records, &self.config.scoring)
    }

    /// Snapshot with classification, anomaly verdict, and manual labels,
    /// capped at `limit` entries.
    pub async fn classified_snapshot(&self, limit: usize) -> Vec<ClassifiedProcess> {
        let mut scored = self.scored_snapshot().await;
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|s| {
                let category = self.classifier.classify(&s.name);
                let manual_labels = self.labels.get(s.pid);
                ClassifiedProcess {
                    pid: s.pid,
                    name: s.name,
                    cpu_percent: s.cpu_percent,
                    mem_percent: s.mem_percent,
                    category,
                    anomaly: s.anomaly,
                    score: s.score,
                    reasons: s.reasons,
                    has_manual_labels: !manual_labels.is_empty(),
                    manual_labels,
                }
            })
            .collect()
    }

    /// Short-horizon forecast for one (pid, metric) pair.
    pub async fn forecast(&self, pid: u32, metric: Metric) -> ForecastOutcome {
        forecast::run(&self.history, pid, metric, &self.config.forecast).await
    }
}
