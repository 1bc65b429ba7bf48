//! Shared per-process sample history.
//!
//! One coarse mutex guards the whole table: the sampler appends under the
//! lock, readers copy their slice out under the same lock and release it
//! before doing any numeric work. A reader can never observe a half-written
//! row, and a returned copy never changes under the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// One observation of one process at one instant. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub pid: u32,
    pub ts: DateTime<Utc>,
    pub cpu: f64,
    pub mem: f64,
}

/// Cheaply clonable handle to the shared history table.
///
/// Growth is bounded by a per-pid ring: once a process has `capacity`
/// samples, each append evicts the oldest. Eviction preserves the
/// per-pid timestamp ordering invariant.
#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<Mutex<HashMap<u32, VecDeque<Sample>>>>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, VecDeque<Sample>>> {
        // Sample rows are plain values; a poisoned table is still consistent.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append one sample. Atomic with respect to any concurrent read.
    pub fn append(&self, sample: Sample) {
        let mut table = self.lock();
        let ring = table.entry(sample.pid).or_default();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(sample);
    }

    /// Append a whole sampling tick in one critical section.
    pub fn append_batch(&self, samples: Vec<Sample>) {
        let mut table = self.lock();
        for sample in samples {
            let ring = table.entry(sample.pid).or_default();
            if ring.len() == self.capacity {
                ring.pop_front();
            }
            ring.push_back(sample);
        }
    }

    /// All samples for `pid` in timestamp order, as an independent copy.
    pub fn read(&self, pid: u32) -> Vec<Sample> {
        let table = self.lock();
        table
            .get(&pid)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of retained samples for `pid`.
    pub fn len(&self, pid: u32) -> usize {
        self.lock().get(&pid).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Process ids currently holding history.
    pub fn pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.lock().keys().copied().collect();
        pids.sort_unstable();
        pids
    }
}
