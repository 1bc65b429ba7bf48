//! Anomaly scoring over process snapshots.

pub mod scorer;
pub mod series;

pub use scorer::{score_snapshot, ScoredProcess, ScoringConfig};
pub use series::SnapshotStats;
