//! Snapshot anomaly scorer.
//!
//! Pure function over a process snapshot: each triggered signal adds its
//! weight to the score and appends one human-readable reason. No history
//! access, no clock reads, no side effects, so identical input always
//! yields identical output.

use crate::collector::ProcessRecord;
use crate::detect::SnapshotStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Absolute CPU utilization cutoff (percent).
    pub cpu_threshold: f64,
    /// Absolute memory utilization cutoff (percent).
    pub mem_threshold: f64,
    /// Robust z-score (median/MAD) above which a process is a CPU outlier
    /// within its snapshot.
    pub zscore_threshold: f64,
    /// Lowercase substrings flagged as suspicious process names.
    pub suspicious_patterns: Vec<String>,
    /// Score added per triggered signal.
    pub signal_weight: f64,
    /// Score at or above which a process is marked anomalous.
    pub anomaly_cutoff: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: 80.0,
            mem_threshold: 75.0,
            zscore_threshold: 3.0,
            suspicious_patterns: vec![
                "miner".to_string(),
                "cryptonight".to_string(),
                "xmrig".to_string(),
            ],
            signal_weight: 1.0,
            anomaly_cutoff: 1.0,
        }
    }
}

/// A snapshot entry augmented with its anomaly verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredProcess {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub anomaly: bool,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Score every process in a snapshot. Empty input yields empty output.
pub fn score_snapshot(records: &[ProcessRecord], config: &ScoringConfig) -> Vec<ScoredProcess> {
    // Peer CPU distribution for the outlier signal. With fewer than 3
    // peers the signal is skipped and scoring degrades to the absolute
    // and name-based checks.
    let cpu_values: Vec<f64> = records.iter().map(|r| r.cpu_percent).collect();
    let cpu_stats = SnapshotStats::compute(&cpu_values);

    records
        .iter()
        .map(|record| score_one(record, cpu_stats.as_ref(), config))
        .collect()
}

fn score_one(
    record: &ProcessRecord,
    peers: Option<&SnapshotStats>,
    config: &ScoringConfig,
) -> ScoredProcess {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if record.cpu_percent > config.cpu_threshold {
        score += config.signal_weight;
        reasons.push(format!(
            "cpu {:.1}% above threshold {:.1}%",
            record.cpu_percent, config.cpu_threshold
        ));
    }

    if record.mem_percent > config.mem_threshold {
        score += config.signal_weight;
        reasons.push(format!(
            "memory {:.1}% above threshold {:.1}%",
            record.mem_percent, config.mem_threshold
        ));
    }

    if let Some(peers) = peers {
        let z = peers.robust_z(record.cpu_percent);
        if z > config.zscore_threshold {
            score += config.signal_weight;
            reasons.push(format!("cpu outlier within snapshot (robust z {:.1})", z));
        }
    }

    let lower_name = record.name.to_lowercase();
    if let Some(pattern) = config
        .suspicious_patterns
        .iter()
        .find(|p| !p.is_empty() && lower_name.contains(p.as_str()))
    {
        score += config.signal_weight;
        reasons.push(format!("name matches suspicious pattern '{}'", pattern));
    }

    ScoredProcess {
        pid: record.pid,
        name: record.name.clone(),
        cpu_percent: record.cpu_percent,
        mem_percent: record.mem_percent,
        anomaly: score >= config.anomaly_cutoff,
        score,
        reasons,
    }
}
