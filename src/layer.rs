use ndarray::{Array1, Array2, ArrayViewMut1, ArrayViewMut2};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::{Activation, Error, Result};

/// Weight initialization scheme.
///
/// Initializers only touch the weight matrix; biases stay at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Init {
    /// Gaussian `N(0, 1)` scaled by `0.01`.
    Random,
    /// Uniform in `[-sqrt(6 / (rows + cols)), sqrt(6 / (rows + cols))]`.
    #[default]
    Xavier,
    /// All zeros. Every unit in a layer then receives the same update, so the
    /// network cannot break symmetry; meant for tests.
    Zero,
}

impl Init {
    /// Fill `layer`'s weights in place.
    pub fn init<R: Rng + ?Sized>(self, layer: &mut Layer, rng: &mut R) {
        let (rows, cols) = layer.weights.dim();
        match self {
            Init::Random => {
                layer.weights.mapv_inplace(|_| {
                    let z: f64 = StandardNormal.sample(&mut *rng);
                    0.01 * z
                });
            }
            Init::Xavier => {
                let limit = (6.0 / (rows + cols) as f64).sqrt();
                let dist = Uniform::new_inclusive(-limit, limit);
                layer.weights.mapv_inplace(|_| dist.sample(&mut *rng));
            }
            Init::Zero => layer.weights.fill(0.0),
        }
    }
}

/// One dense layer: `activation(Wᵗ x + b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Shape `(input_size, output_size)`.
    weights: Array2<f64>,
    biases: Array1<f64>,
    activation: Activation,
}

impl Layer {
    /// Zero-initialized layer.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer sizes must be > 0, got input_size={input_size} output_size={output_size}"
            )));
        }
        Ok(Self {
            weights: Array2::zeros((input_size, output_size)),
            biases: Array1::zeros(output_size),
            activation,
        })
    }

    /// Layer whose weights are filled by `init`; biases start at zero.
    pub fn new_with_rng<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: Init,
        rng: &mut R,
    ) -> Result<Self> {
        let mut layer = Self::new(input_size, output_size, activation)?;
        init.init(&mut layer, rng);
        Ok(layer)
    }

    /// Build a layer from explicit parameters.
    ///
    /// Validates `biases.len() == weights.ncols()`, non-empty shapes and that all
    /// parameters are finite.
    pub fn from_parts(
        weights: Array2<f64>,
        biases: Array1<f64>,
        activation: Activation,
    ) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidShape(format!(
                "weights must be non-empty, got {rows}x{cols}"
            )));
        }
        if biases.len() != cols {
            return Err(Error::InvalidShape(format!(
                "biases len {} does not match weights cols {cols}",
                biases.len()
            )));
        }
        if weights.iter().chain(biases.iter()).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData("layer parameters must be finite".to_owned()));
        }
        Ok(Self {
            weights,
            biases,
            activation,
        })
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Mutable view of the weights. Values can change, the shape cannot.
    #[inline]
    pub fn weights_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.weights.view_mut()
    }

    #[inline]
    pub fn biases(&self) -> &Array1<f64> {
        &self.biases
    }

    #[inline]
    pub fn biases_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.biases.view_mut()
    }

    /// Replace weights and biases with same-shaped, finite values.
    ///
    /// Fails without modifying the layer otherwise.
    pub fn set_parameters(&mut self, weights: Array2<f64>, biases: Array1<f64>) -> Result<()> {
        if weights.dim() != self.weights.dim() {
            return Err(Error::InvalidShape(format!(
                "weights shape {:?} does not match layer shape {:?}",
                weights.dim(),
                self.weights.dim()
            )));
        }
        if biases.len() != self.biases.len() {
            return Err(Error::InvalidShape(format!(
                "biases len {} does not match layer output_size {}",
                biases.len(),
                self.biases.len()
            )));
        }
        if weights.iter().chain(biases.iter()).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData("layer parameters must be finite".to_owned()));
        }
        self.weights = weights;
        self.biases = biases;
        Ok(())
    }

    /// Forward pass for a single sample: `activation(Wᵗ · input + b)`.
    ///
    /// The caller guarantees `input.len() == self.input_size()`.
    #[inline]
    pub(crate) fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        debug_assert_eq!(input.len(), self.input_size());
        let linear = self.weights.t().dot(input) + &self.biases;
        self.activation.activate(&linear)
    }

    #[inline]
    pub(crate) fn sum_sq_weights(&self) -> f64 {
        self.weights.iter().map(|w| w * w).sum()
    }

    #[inline]
    pub(crate) fn is_finite(&self) -> bool {
        self.weights
            .iter()
            .chain(self.biases.iter())
            .all(|v| v.is_finite())
    }
}
