//! Network builder.
//!
//! `NetworkBuilder` is the recommended way to define a network. Layers are declared
//! with explicit input and output sizes, so a broken chain is reported by the
//! `add_layer` call that introduced it. Parameters and optimizer state are only
//! allocated in `build_*`, once the topology is final.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::network::{validate_l2, validate_learning_rate};
use crate::{Activation, Adam, Error, Init, Layer, Loss, Network, Optimizer, Result};

/// Learning rate used when none is set and the optimizer is SGD.
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
struct LayerSpec {
    input_size: usize,
    output_size: usize,
    activation: Activation,
    init: Init,
}

#[derive(Debug, Clone)]
/// Builder for a `Network`.
///
/// Example:
///
/// ```rust
/// use rust_fcnn::{Activation, Init, Loss, NetworkBuilder, Optimizer};
///
/// # fn main() -> rust_fcnn::Result<()> {
/// let net = NetworkBuilder::new(2)?
///     .add_layer(2, 8, Activation::ReLU, Init::Xavier)?
///     .add_layer(8, 1, Activation::Sigmoid, Init::Xavier)?
///     .loss(Loss::BinaryCrossEntropy)
///     .optimizer(Optimizer::adam())
///     .build_with_seed(0)?;
/// assert_eq!(net.num_layers(), 2);
/// # Ok(())
/// # }
/// ```
pub struct NetworkBuilder {
    input_size: usize,
    layers: Vec<LayerSpec>,
    learning_rate: Option<f64>,
    l2: f64,
    loss: Loss,
    optimizer: Optimizer,
}

impl NetworkBuilder {
    /// Start building a network that accepts inputs of length `input_size`.
    pub fn new(input_size: usize) -> Result<Self> {
        if input_size == 0 {
            return Err(Error::InvalidConfig("input_size must be > 0".to_owned()));
        }
        Ok(Self {
            input_size,
            layers: Vec::new(),
            learning_rate: None,
            l2: 0.0,
            loss: Loss::default(),
            optimizer: Optimizer::default(),
        })
    }

    /// Convenience constructor from a sizes list + activations.
    ///
    /// `sizes` includes input and output dimensions, so its length must be at least 2.
    /// `activations` must have length `sizes.len() - 1`. Every layer uses `init`.
    pub fn from_sizes(sizes: &[usize], activations: &[Activation], init: Init) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::InvalidConfig(
                "sizes must include input and output dims".to_owned(),
            ));
        }
        if activations.len() != sizes.len() - 1 {
            return Err(Error::InvalidConfig(format!(
                "activations length {} does not match sizes.len() - 1 ({})",
                activations.len(),
                sizes.len() - 1
            )));
        }

        let mut b = Self::new(sizes[0])?;
        for (w, &act) in sizes.windows(2).zip(activations) {
            b = b.add_layer(w[0], w[1], act, init)?;
        }
        Ok(b)
    }

    /// Append a dense layer.
    ///
    /// `input_size` must equal the previous layer's `output_size` (or the network
    /// input size for the first layer).
    pub fn add_layer(
        mut self,
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: Init,
    ) -> Result<Self> {
        if output_size == 0 {
            return Err(Error::InvalidConfig(
                "layer output_size must be > 0".to_owned(),
            ));
        }
        let expected = self
            .layers
            .last()
            .map_or(self.input_size, |l| l.output_size);
        if input_size != expected {
            return Err(Error::InvalidShape(format!(
                "layer {} input_size {input_size} does not match previous output size {expected}",
                self.layers.len()
            )));
        }

        self.layers.push(LayerSpec {
            input_size,
            output_size,
            activation,
            init,
        });
        Ok(self)
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    /// L2 regularization coefficient (`0` disables it).
    pub fn l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    pub fn optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Network> {
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one layer".to_owned(),
            ));
        }
        let learning_rate = self.learning_rate.unwrap_or(match self.optimizer {
            Optimizer::Sgd => DEFAULT_LEARNING_RATE,
            Optimizer::Adam { .. } => Adam::DEFAULT_LEARNING_RATE,
        });
        validate_learning_rate(learning_rate)?;
        validate_l2(self.l2)?;
        self.optimizer.validate()?;

        let mut layers = Vec::with_capacity(self.layers.len());
        for spec in &self.layers {
            let layer = Layer::new_with_rng(
                spec.input_size,
                spec.output_size,
                spec.activation,
                spec.init,
                rng,
            )?;
            layers.push(layer);
        }

        debug!(
            "built network: input_size={} layers={} lr={learning_rate} l2={} loss={:?} optimizer={:?}",
            self.input_size,
            layers.len(),
            self.l2,
            self.loss,
            self.optimizer
        );
        Network::from_layers(layers, learning_rate, self.l2, self.loss, self.optimizer)
    }
}
