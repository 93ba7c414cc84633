use std::fmt;
use std::sync::Arc;

use log::warn;
use ndarray::{Array1, Array2, Axis};

use crate::error::check_len;
use crate::{Error, Layer, Loss, Optimizer, OptimizerState, Result};

/// A non-finite loss observed while training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonFinite {
    /// Zero-based epoch index. Log lines count epochs from 1.
    pub epoch: usize,
    /// Index of the example in the caller's dataset.
    pub example: usize,
    pub loss: f64,
}

/// Callback invoked by the training loops for every [`NonFinite`] loss.
pub type NonFiniteHook = Arc<dyn Fn(&NonFinite) + Send + Sync>;

/// A stack of dense layers plus everything needed to train it.
///
/// Layer `0` is applied to the raw input. Consecutive layers chain:
/// `layers[i].input_size() == layers[i - 1].output_size()`.
#[derive(Clone)]
pub struct Network {
    layers: Vec<Layer>,
    learning_rate: f64,
    l2: f64,
    loss: Loss,
    optimizer: Optimizer,
    state: OptimizerState,
    non_finite_hook: Option<NonFiniteHook>,
}

/// Per-example gradients produced by [`Network::gradients`].
///
/// `weights[i]` already contains the L2 term `l2 * W[i]`. `biases[i]` is the
/// layer's error signal.
#[derive(Debug, Clone)]
pub struct Gradients {
    loss: f64,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
}

impl Gradients {
    /// Loss of the example, including the L2 penalty.
    #[inline]
    pub fn loss(&self) -> f64 {
        self.loss
    }

    #[inline]
    pub fn weights(&self, layer_idx: usize) -> &Array2<f64> {
        &self.weights[layer_idx]
    }

    #[inline]
    pub fn biases(&self, layer_idx: usize) -> &Array1<f64> {
        &self.biases[layer_idx]
    }
}

impl Network {
    pub(crate) fn from_layers(
        layers: Vec<Layer>,
        learning_rate: f64,
        l2: f64,
        loss: Loss,
        optimizer: Optimizer,
    ) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one layer".to_owned(),
            ));
        }
        validate_learning_rate(learning_rate)?;
        validate_l2(l2)?;
        let state = optimizer.state(&layers)?;
        Ok(Self {
            layers,
            learning_rate,
            l2,
            loss,
            optimizer,
            state,
            non_finite_hook: None,
        })
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_size)
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Layer::output_size)
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        validate_learning_rate(learning_rate)?;
        self.learning_rate = learning_rate;
        Ok(())
    }

    #[inline]
    pub fn l2(&self) -> f64 {
        self.l2
    }

    pub fn set_l2(&mut self, l2: f64) -> Result<()> {
        validate_l2(l2)?;
        self.l2 = l2;
        Ok(())
    }

    #[inline]
    pub fn loss(&self) -> Loss {
        self.loss
    }

    #[inline]
    pub fn set_loss(&mut self, loss: Loss) {
        self.loss = loss;
    }

    #[inline]
    pub fn optimizer(&self) -> Optimizer {
        self.optimizer
    }

    #[inline]
    pub fn optimizer_state(&self) -> &OptimizerState {
        &self.state
    }

    /// Switch optimizers. Any previous optimizer state is discarded.
    pub fn set_optimizer(&mut self, optimizer: Optimizer) -> Result<()> {
        self.state = optimizer.state(&self.layers)?;
        self.optimizer = optimizer;
        Ok(())
    }

    /// Append a layer after the current output layer.
    ///
    /// The layer's input size must equal the current output size. Optimizer state is
    /// re-allocated for the new topology.
    pub fn push_layer(&mut self, layer: Layer) -> Result<()> {
        if layer.input_size() != self.output_size() {
            return Err(Error::InvalidShape(format!(
                "layer input_size {} does not match previous output_size {}",
                layer.input_size(),
                self.output_size()
            )));
        }
        self.layers.push(layer);
        match self.optimizer.state(&self.layers) {
            Ok(state) => {
                self.state = state;
                Ok(())
            }
            Err(e) => {
                self.layers.pop();
                Err(e)
            }
        }
    }

    /// Install a callback for non-finite losses seen by `train` / `train_batch`.
    pub fn set_non_finite_hook(&mut self, hook: NonFiniteHook) {
        self.non_finite_hook = Some(hook);
    }

    pub fn clear_non_finite_hook(&mut self) {
        self.non_finite_hook = None;
    }

    /// Returns true if every weight and bias is finite.
    pub fn is_finite(&self) -> bool {
        self.layers.iter().all(Layer::is_finite)
    }

    /// `0.5 * l2 * sum(w^2)` over every weight of every layer.
    pub fn l2_penalty(&self) -> f64 {
        if self.l2 == 0.0 {
            return 0.0;
        }
        let sum_sq: f64 = self.layers.iter().map(Layer::sum_sq_weights).sum();
        0.5 * self.l2 * sum_sq
    }

    /// Inference for a single sample. Nothing is cached.
    pub fn forward(&self, input: &Array1<f64>) -> Result<Array1<f64>> {
        check_len("input", input.len(), self.input_size())?;

        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        Ok(current)
    }

    /// Forward pass that keeps every layer's post-activation output.
    ///
    /// `outputs[i]` is the output of layer `i`; the last entry is the network output.
    pub fn detailed_forward(&self, input: &Array1<f64>) -> Result<Vec<Array1<f64>>> {
        check_len("input", input.len(), self.input_size())?;

        let mut outputs: Vec<Array1<f64>> = Vec::with_capacity(self.layers.len());
        for (idx, layer) in self.layers.iter().enumerate() {
            let out = if idx == 0 {
                layer.forward(input)
            } else {
                layer.forward(&outputs[idx - 1])
            };
            outputs.push(out);
        }
        Ok(outputs)
    }

    /// Loss and parameter gradients for one example, without touching the network.
    pub fn gradients(&self, input: &Array1<f64>, target: &Array1<f64>) -> Result<Gradients> {
        check_len("target", target.len(), self.output_size())?;
        let outputs = self.detailed_forward(input)?;

        let last = self.layers.len() - 1;
        let prediction = &outputs[last];
        let loss = self.loss.compute(prediction, target)? + self.l2_penalty();

        // Error signals, right to left. The output layer takes the loss gradient
        // as is; hidden layers scale the propagated error by their activation
        // derivative at the cached output.
        let mut errors: Vec<Array1<f64>> = vec![Array1::zeros(0); self.layers.len()];
        errors[last] = self.loss.gradient(prediction, target)?;
        for idx in (0..last).rev() {
            let propagated = self.layers[idx + 1].weights().dot(&errors[idx + 1]);
            let local = self.layers[idx]
                .activation()
                .derivative_from_output(&outputs[idx]);
            errors[idx] = propagated * &local;
        }

        let mut weights = Vec::with_capacity(self.layers.len());
        for (idx, layer) in self.layers.iter().enumerate() {
            let layer_input = if idx == 0 { input } else { &outputs[idx - 1] };
            let mut grad = outer(layer_input, &errors[idx]);
            if self.l2 != 0.0 {
                grad.scaled_add(self.l2, layer.weights());
            }
            weights.push(grad);
        }

        Ok(Gradients {
            loss,
            weights,
            biases: errors,
        })
    }

    /// Apply one step of gradients.
    ///
    /// Weights go through the optimizer, biases take a plain SGD step with the
    /// network learning rate. Shapes are checked before anything is mutated.
    pub fn apply_gradients(&mut self, grads: &Gradients) -> Result<()> {
        check_len("gradients", grads.weights.len(), self.layers.len())?;
        check_len("bias gradients", grads.biases.len(), self.layers.len())?;
        for (idx, layer) in self.layers.iter().enumerate() {
            if grads.weights[idx].dim() != layer.weights().dim() {
                return Err(Error::InvalidShape(format!(
                    "layer {idx} weight gradient shape {:?} does not match weights {:?}",
                    grads.weights[idx].dim(),
                    layer.weights().dim()
                )));
            }
            check_len("bias gradient", grads.biases[idx].len(), layer.output_size())?;
        }

        let lr = self.learning_rate;
        for (idx, layer) in self.layers.iter_mut().enumerate() {
            self.state
                .update(idx, layer.weights_mut(), &grads.weights[idx], lr)?;
            layer.biases_mut().scaled_add(-lr, &grads.biases[idx]);
        }
        self.state.finish_step();

        Ok(())
    }

    /// One full training step on a single example.
    ///
    /// Returns the loss (including the L2 penalty) computed before the update.
    pub fn backward(&mut self, input: &Array1<f64>, target: &Array1<f64>) -> Result<f64> {
        let grads = self.gradients(input, target)?;
        self.apply_gradients(&grads)?;
        Ok(grads.loss)
    }

    pub(crate) fn report_non_finite(&self, epoch: usize, example: usize, loss: f64) {
        if loss.is_finite() {
            return;
        }
        warn!("non-finite loss {loss} at epoch {epoch}, example {example}");
        if let Some(hook) = &self.non_finite_hook {
            hook(&NonFinite {
                epoch,
                example,
                loss,
            });
        }
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("layers", &self.layers)
            .field("learning_rate", &self.learning_rate)
            .field("l2", &self.l2)
            .field("loss", &self.loss)
            .field("optimizer", &self.optimizer)
            .field("non_finite_hook", &self.non_finite_hook.is_some())
            .finish()
    }
}

/// `a ⊗ b`, shape `(a.len(), b.len())`.
fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    a.view()
        .insert_axis(Axis(1))
        .dot(&b.view().insert_axis(Axis(0)))
}

pub(crate) fn validate_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and > 0, got {learning_rate}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_l2(l2: f64) -> Result<()> {
    if !(l2.is_finite() && l2 >= 0.0) {
        return Err(Error::InvalidConfig(format!(
            "l2 must be finite and >= 0, got {l2}"
        )));
    }
    Ok(())
}
