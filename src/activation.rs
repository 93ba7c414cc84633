//! Activation functions.
//!
//! A dense layer computes a pre-activation value `z = Wᵗ x + b` and then applies an
//! activation function: `y = activation(z)`.
//!
//! The network caches the *post-activation* outputs `y` during the detailed forward
//! pass. Backprop turns an upstream error into a local one with
//! [`Activation::derivative_from_output`], which expresses the derivative in terms of
//! `y` so no separate `z` buffer is retained.

use ndarray::Array1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Activation applied to a whole layer output.
pub enum Activation {
    Sigmoid,
    Tanh,
    ReLU,
    /// Shift-stabilized softmax over the layer output.
    ///
    /// Its derivative is the diagonal approximation `y * (1 - y)`, not the full
    /// Jacobian. Paired with `Loss::CrossEntropy` this does not reduce to
    /// `predicted - target`.
    Softmax,
    Identity,
}

impl Activation {
    /// Apply the activation to a pre-activation vector.
    pub fn activate(self, z: &Array1<f64>) -> Array1<f64> {
        match self {
            Activation::Sigmoid => z.mapv(sigmoid),
            Activation::Tanh => z.mapv(f64::tanh),
            Activation::ReLU => z.mapv(|x| x.max(0.0)),
            Activation::Softmax => softmax(z),
            Activation::Identity => z.clone(),
        }
    }

    /// Derivative of the activation evaluated at `z`.
    ///
    /// - Sigmoid: `σ(z)(1 - σ(z))`, in `[0, 0.25]`
    /// - Tanh: `1 - tanh(z)^2`, in `(0, 1]`
    /// - ReLU: `1` if `z > 0` else `0`
    /// - Softmax: `s(1 - s)` with `s = softmax(z)`
    pub fn derivative(self, z: &Array1<f64>) -> Array1<f64> {
        match self {
            Activation::Sigmoid => z.mapv(|x| {
                let s = sigmoid(x);
                s * (1.0 - s)
            }),
            Activation::Tanh => z.mapv(|x| {
                let t = x.tanh();
                1.0 - t * t
            }),
            Activation::ReLU => z.mapv(relu_grad),
            Activation::Softmax => softmax(z).mapv(|s| s * (1.0 - s)),
            Activation::Identity => Array1::ones(z.len()),
        }
    }

    /// Derivative of the activation expressed in terms of the cached
    /// post-activation output `y`.
    pub fn derivative_from_output(self, y: &Array1<f64>) -> Array1<f64> {
        match self {
            Activation::Sigmoid | Activation::Softmax => y.mapv(|s| s * (1.0 - s)),
            Activation::Tanh => y.mapv(|t| 1.0 - t * t),
            Activation::ReLU => y.mapv(relu_grad),
            Activation::Identity => Array1::ones(y.len()),
        }
    }
}

#[inline]
fn relu_grad(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

fn softmax(z: &Array1<f64>) -> Array1<f64> {
    if z.is_empty() {
        return Array1::zeros(0);
    }
    let max = z.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = z.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}
