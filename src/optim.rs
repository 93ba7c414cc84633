//! Optimizers.
//!
//! An optimizer updates one layer's weight matrix in place from a same-shaped
//! gradient matrix. Biases do not go through the optimizer; the network applies
//! plain SGD to them.
//!
//! Design notes:
//! - `Optimizer` is the configuration; `OptimizerState` is what the network owns and
//!   mutates during training.
//! - State is allocated from the final layer topology (`Optimizer::state`), so Adam's
//!   moment matrices always match the weight matrices they track.
//! - A training step calls `update` once per layer and then `finish_step` once.

use ndarray::{Array2, ArrayViewMut2, Zip};

use crate::{Error, Layer, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
/// Optimizer choice for training.
pub enum Optimizer {
    /// Plain SGD.
    #[default]
    Sgd,
    /// Adam (bias-corrected).
    Adam { beta1: f64, beta2: f64, eps: f64 },
}

impl Optimizer {
    /// Adam with the usual defaults (`beta1 = 0.9`, `beta2 = 0.999`, `eps = 1e-8`).
    pub fn adam() -> Self {
        Optimizer::Adam {
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }

    /// Validate optimizer hyperparameters.
    pub fn validate(self) -> Result<()> {
        match self {
            Optimizer::Sgd => Ok(()),
            Optimizer::Adam { beta1, beta2, eps } => {
                if !(beta1.is_finite() && (0.0..1.0).contains(&beta1)) {
                    return Err(Error::InvalidConfig(format!(
                        "adam beta1 must be finite and in [0,1), got {beta1}"
                    )));
                }
                if !(beta2.is_finite() && (0.0..1.0).contains(&beta2)) {
                    return Err(Error::InvalidConfig(format!(
                        "adam beta2 must be finite and in [0,1), got {beta2}"
                    )));
                }
                if !(eps.is_finite() && eps > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "adam eps must be finite and > 0, got {eps}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Allocate optimizer state for `layers`.
    pub fn state(self, layers: &[Layer]) -> Result<OptimizerState> {
        self.validate()?;

        match self {
            Optimizer::Sgd => Ok(OptimizerState::Sgd(Sgd)),
            Optimizer::Adam { beta1, beta2, eps } => Ok(OptimizerState::Adam(Adam::new(
                beta1, beta2, eps, layers,
            ))),
        }
    }
}

#[derive(Debug, Clone)]
/// Owned optimizer state.
pub enum OptimizerState {
    Sgd(Sgd),
    Adam(Adam),
}

impl OptimizerState {
    /// Update the weights of layer `layer_idx` in place.
    pub fn update(
        &mut self,
        layer_idx: usize,
        weights: ArrayViewMut2<'_, f64>,
        grads: &Array2<f64>,
        lr: f64,
    ) -> Result<()> {
        match self {
            OptimizerState::Sgd(sgd) => sgd.update(weights, grads, lr),
            OptimizerState::Adam(adam) => adam.update(layer_idx, weights, grads, lr),
        }
    }

    /// Close a training step. Call once after every layer was updated.
    pub fn finish_step(&mut self) {
        match self {
            OptimizerState::Sgd(_) => {}
            OptimizerState::Adam(adam) => adam.finish_step(),
        }
    }

    /// Number of completed training steps, for stateful optimizers.
    pub fn steps(&self) -> Option<u64> {
        match self {
            OptimizerState::Sgd(_) => None,
            OptimizerState::Adam(adam) => Some(adam.steps()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Stochastic gradient descent: `w -= lr * g`.
pub struct Sgd;

impl Sgd {
    pub fn update(
        &self,
        mut weights: ArrayViewMut2<'_, f64>,
        grads: &Array2<f64>,
        lr: f64,
    ) -> Result<()> {
        check_dims("gradients", grads.dim(), weights.dim())?;
        weights.scaled_add(-lr, grads);
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Adam with one first/second moment matrix per layer and a step counter shared
/// by all layers.
pub struct Adam {
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: u64,
    m: Vec<Array2<f64>>,
    v: Vec<Array2<f64>>,
}

impl Adam {
    /// Learning rate Adam is usually paired with.
    pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

    /// Allocate zeroed moments shaped like each layer's weights.
    pub fn new(beta1: f64, beta2: f64, eps: f64, layers: &[Layer]) -> Self {
        let m: Vec<_> = layers
            .iter()
            .map(|l| Array2::zeros(l.weights().dim()))
            .collect();
        let v = m.clone();
        Self {
            beta1,
            beta2,
            eps,
            t: 0,
            m,
            v,
        }
    }

    #[inline]
    pub fn steps(&self) -> u64 {
        self.t
    }

    /// First and second moments of layer `layer_idx`.
    pub fn moments(&self, layer_idx: usize) -> Option<(&Array2<f64>, &Array2<f64>)> {
        Some((self.m.get(layer_idx)?, self.v.get(layer_idx)?))
    }

    /// One Adam update of layer `layer_idx`, bias-corrected with the current step.
    ///
    /// Fails if no moments were allocated for `layer_idx` or if shapes disagree.
    pub fn update(
        &mut self,
        layer_idx: usize,
        weights: ArrayViewMut2<'_, f64>,
        grads: &Array2<f64>,
        lr: f64,
    ) -> Result<()> {
        let (Some(m), Some(v)) = (self.m.get_mut(layer_idx), self.v.get_mut(layer_idx)) else {
            return Err(Error::InvalidConfig(format!(
                "adam has no moments for layer {layer_idx} ({} allocated); \
                 build the optimizer state from the final topology",
                self.m.len()
            )));
        };
        check_dims("weights", weights.dim(), m.dim())?;
        check_dims("gradients", grads.dim(), m.dim())?;

        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.eps);
        let step = (self.t + 1) as f64;
        let corr1 = 1.0 - beta1.powf(step);
        let corr2 = 1.0 - beta2.powf(step);

        Zip::from(weights)
            .and(grads)
            .and(m)
            .and(v)
            .for_each(|w, &g, m, v| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / corr1;
                let v_hat = *v / corr2;
                *w -= lr * m_hat / (v_hat.sqrt() + eps);
            });

        Ok(())
    }

    #[inline]
    pub fn finish_step(&mut self) {
        self.t += 1;
    }
}

fn check_dims(what: &str, got: (usize, usize), expected: (usize, usize)) -> Result<()> {
    if got != expected {
        return Err(Error::InvalidShape(format!(
            "{what} shape {}x{} does not match {}x{}",
            got.0, got.1, expected.0, expected.1
        )));
    }
    Ok(())
}
