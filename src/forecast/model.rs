//! Univariate trend model for short, densely sampled process metrics.
//!
//! Ordinary least-squares fit over (epoch-seconds, value) pairs with no
//! seasonal terms. Uncertainty comes from the residual standard deviation
//! and widens with the forecast horizon.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("need at least 2 points to fit a trend, have {0}")]
    TooFewPoints(usize),
    #[error("model fit produced non-finite coefficients")]
    NonFiniteFit,
}

/// A fitted linear trend with residual spread.
#[derive(Debug, Clone)]
pub struct TrendModel {
    slope: f64,
    intercept: f64,
    residual_std: f64,
    z: f64,
}

impl TrendModel {
    /// Fit a trend to (x, y) pairs with the given uncertainty interval
    /// width (e.g. 0.8 for an 80% interval).
    ///
    /// A degenerate x-axis (all timestamps equal) fits a flat model at the
    /// mean rather than failing; a degenerate y-series fits a flat model
    /// with zero residual spread.
    pub fn fit(xs: &[f64], ys: &[f64], interval_width: f64) -> Result<Self, ModelError> {
        let n = xs.len();
        if n < 2 || ys.len() != n {
            return Err(ModelError::TooFewPoints(n.min(ys.len())));
        }

        let nf = n as f64;
        let sum_x: f64 = xs.iter().sum();
        let sum_y: f64 = ys.iter().sum();
        let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
        let sum_x2: f64 = xs.iter().map(|x| x * x).sum();

        let denom = nf * sum_x2 - sum_x * sum_x;
        let (slope, intercept) = if denom.abs() < 1e-12 {
            (0.0, sum_y / nf)
        } else {
            let slope = (nf * sum_xy - sum_x * sum_y) / denom;
            (slope, (sum_y - slope * sum_x) / nf)
        };

        if !slope.is_finite() || !intercept.is_finite() {
            return Err(ModelError::NonFiniteFit);
        }

        let residual_var: f64 = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| {
                let predicted = slope * x + intercept;
                (y - predicted).powi(2)
            })
            .sum::<f64>()
            / nf;
        let residual_std = residual_var.sqrt();

        if !residual_std.is_finite() {
            return Err(ModelError::NonFiniteFit);
        }

        Ok(Self {
            slope,
            intercept,
            residual_std,
            z: z_score(interval_width),
        })
    }

    /// Evaluate the model at `x`, `step` points past the last observation
    /// (1-based). The interval widens as sqrt(step).
    pub fn predict(&self, x: f64, step: usize) -> (f64, f64, f64) {
        let estimate = self.slope * x + self.intercept;
        let spread = self.z * self.residual_std * (step as f64).sqrt();
        (estimate, estimate - spread, estimate + spread)
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }
}

/// Two-sided normal quantile for common interval widths.
fn z_score(interval_width: f64) -> f64 {
    match interval_width {
        w if w >= 0.99 => 2.576,
        w if w >= 0.95 => 1.96,
        w if w >= 0.90 => 1.645,
        w if w >= 0.80 => 1.282,
        _ => 1.282,
    }
}
