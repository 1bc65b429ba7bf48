//! Robust cross-sectional statistics for a process snapshot.
//!
//! CPU and memory distributions across a live process table are heavily
//! skewed: most processes idle near zero while a handful do real work. A
//! mean/std-dev z-score gets dragged around by the busy tail, so outlier
//! detection here uses the median and the median absolute deviation.

/// MAD-to-sigma consistency factor for a normal distribution.
const MAD_SCALE: f64 = 1.4826;

/// Median/MAD summary of one snapshot's metric values.
#[derive(Debug, Clone)]
pub struct SnapshotStats {
    median: f64,
    mad: f64,
}

impl SnapshotStats {
    /// Summarize a snapshot. Returns `None` below 3 values, where an
    /// outlier verdict against peers is meaningless.
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.len() < 3 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = median_sorted(&sorted);

        let mut deviations: Vec<f64> = sorted.iter().map(|v| (v - median).abs()).collect();
        deviations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mad = median_sorted(&deviations) * MAD_SCALE;

        Some(Self { median, mad })
    }

    pub fn median(&self) -> f64 {
        self.median
    }

    pub fn mad(&self) -> f64 {
        self.mad
    }

    /// Robust z-score of `value` against this snapshot.
    ///
    /// A near-zero MAD means the bulk of the snapshot sits at one value;
    /// the score degrades to 0 there and scoring falls back to the
    /// absolute-threshold signals.
    pub fn robust_z(&self, value: f64) -> f64 {
        if self.mad > 1e-12 {
            (value - self.median) / self.mad
        } else {
            0.0
        }
    }
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
