//! Background sampling loop.
//!
//! Spawned once at daemon startup; ticks at the configured cadence,
//! enumerates live processes, and appends one sample per process to the
//! shared history. A failed tick is logged and skipped, never fatal.

use crate::collector::ProcessCollector;
use crate::monitor::{HistoryStore, Sample};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub struct Sampler {
    collector: Arc<dyn ProcessCollector>,
    store: HistoryStore,
    interval: Duration,
}

impl Sampler {
    pub fn new(collector: Arc<dyn ProcessCollector>, store: HistoryStore, interval: Duration) -> Self {
        Self {
            collector,
            store,
            interval,
        }
    }

    /// Run until the shutdown channel flips. Intended for `tokio::spawn`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Sampler started");

        let mut tick = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = tick.tick() => self.sample_once().await,
                changed = shutdown.changed() => {
                    // A dropped sender also means teardown.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Sampler stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn sample_once(&self) {
        // Process enumeration reads the OS table synchronously; keep it off
        // the async worker threads.
        let collector = Arc::clone(&self.collector);
        let records = match tokio::task::spawn_blocking(move || collector.collect()).await {
            Ok(records) => records,
            Err(e) => {
                // Transient collection failure: skip this tick, keep running.
                error!("Process enumeration failed: {}", e);
                return;
            }
        };

        let now = Utc::now();
        let samples: Vec<Sample> = records
            .into_iter()
            .map(|r| Sample {
                pid: r.pid,
                ts: now,
                cpu: r.cpu_percent,
                mem: r.mem_percent,
            })
            .collect();

        debug!(count = samples.len(), "Sampling tick");
        self.store.append_batch(samples);
    }
}
