//! Loss functions.
//!
//! A loss is applied once, at the network output:
//!
//! - `compute(predicted, target)` returns the scalar loss
//! - `gradient(predicted, target)` returns `dL/d(predicted)`
//!
//! Probabilities are clipped to `[EPS, 1 - EPS]` before any `ln` or reciprocal, so
//! the cross-entropy variants stay finite for predictions of exactly `0` or `1`.
//!
//! Normalization differs between variants: `Mse` and `BinaryCrossEntropy` average
//! over the output length, `CrossEntropy` is a plain sum. Compare loss magnitudes
//! across variants with that in mind.

use ndarray::{Array1, Zip};

use crate::error::check_len;
use crate::Result;

/// Clipping bound for probabilities.
pub const EPS: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Supported loss functions.
pub enum Loss {
    /// Mean squared error: `mean((p - t)^2)`.
    #[default]
    Mse,
    /// Categorical cross-entropy over probabilities: `sum(-t * ln(p))`.
    CrossEntropy,
    /// Binary cross-entropy over probabilities:
    /// `mean(-t * ln(p) - (1 - t) * ln(1 - p))`.
    BinaryCrossEntropy,
}

impl Loss {
    /// Compute a loss value.
    ///
    /// Returns an error if `predicted.len() != target.len()`.
    pub fn compute(self, predicted: &Array1<f64>, target: &Array1<f64>) -> Result<f64> {
        check_len("target", target.len(), predicted.len())?;
        Ok(match self {
            Loss::Mse => mse(predicted, target),
            Loss::CrossEntropy => cross_entropy(predicted, target),
            Loss::BinaryCrossEntropy => binary_cross_entropy(predicted, target),
        })
    }

    /// Gradient of the loss w.r.t. `predicted`.
    ///
    /// Returns an error if `predicted.len() != target.len()`.
    pub fn gradient(self, predicted: &Array1<f64>, target: &Array1<f64>) -> Result<Array1<f64>> {
        check_len("target", target.len(), predicted.len())?;
        Ok(match self {
            Loss::Mse => mse_gradient(predicted, target),
            Loss::CrossEntropy => cross_entropy_gradient(predicted, target),
            Loss::BinaryCrossEntropy => binary_cross_entropy_gradient(predicted, target),
        })
    }
}

#[inline]
fn clip(p: f64) -> f64 {
    p.clamp(EPS, 1.0 - EPS)
}

fn mse(pred: &Array1<f64>, target: &Array1<f64>) -> f64 {
    if pred.is_empty() {
        return 0.0;
    }
    let mut sum_sq = 0.0;
    Zip::from(pred).and(target).for_each(|&p, &t| {
        let diff = p - t;
        sum_sq += diff * diff;
    });
    sum_sq / pred.len() as f64
}

/// `2 * (p - t) / N`
fn mse_gradient(pred: &Array1<f64>, target: &Array1<f64>) -> Array1<f64> {
    if pred.is_empty() {
        return Array1::zeros(0);
    }
    let scale = 2.0 / pred.len() as f64;
    Zip::from(pred)
        .and(target)
        .map_collect(|&p, &t| scale * (p - t))
}

fn cross_entropy(pred: &Array1<f64>, target: &Array1<f64>) -> f64 {
    let mut sum = 0.0;
    Zip::from(pred).and(target).for_each(|&p, &t| {
        sum -= t * clip(p).ln();
    });
    sum
}

/// `-t / p`, not normalized by N.
fn cross_entropy_gradient(pred: &Array1<f64>, target: &Array1<f64>) -> Array1<f64> {
    Zip::from(pred)
        .and(target)
        .map_collect(|&p, &t| -t / clip(p))
}

fn binary_cross_entropy(pred: &Array1<f64>, target: &Array1<f64>) -> f64 {
    if pred.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    Zip::from(pred).and(target).for_each(|&p, &t| {
        let p = clip(p);
        sum += -t * p.ln() - (1.0 - t) * (1.0 - p).ln();
    });
    sum / pred.len() as f64
}

/// `(-t / p + (1 - t) / (1 - p)) / N`
fn binary_cross_entropy_gradient(pred: &Array1<f64>, target: &Array1<f64>) -> Array1<f64> {
    if pred.is_empty() {
        return Array1::zeros(0);
    }
    let inv_n = 1.0 / pred.len() as f64;
    Zip::from(pred).and(target).map_collect(|&p, &t| {
        let p = clip(p);
        (-t / p + (1.0 - t) / (1.0 - p)) * inv_n
    })
}
