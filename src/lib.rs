//! A small fully-connected neural network crate.
//!
//! `rust-fcnn` trains feed-forward networks of dense layers with per-example
//! backpropagation. Scalars are `f64`; vectors and matrices are `ndarray` arrays.
//!
//! # Data layout and shapes
//!
//! - One sample is an [`ndarray::Array1<f64>`].
//! - Layer weights have shape `(input_size, output_size)`; a layer computes
//!   `activation(Wᵗ x + b)`.
//! - Every public entry point checks lengths and returns [`Error::InvalidShape`]
//!   on mismatch instead of panicking.
//!
//! # Training
//!
//! Each training step runs a forward pass, computes the loss (plus
//! `0.5 * l2 * sum(w^2)` when L2 is enabled), backpropagates, and updates weights
//! through the configured [`Optimizer`]. Biases always take a plain SGD step.
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade: training progress at `info`/`debug`,
//! batch details at `trace`, non-finite losses at `warn`. Install any logger
//! (e.g. `env_logger`) to see it.
//!
//! # Quick start
//!
//! ```rust
//! use ndarray::array;
//! use rust_fcnn::{Activation, Init, NetworkBuilder};
//!
//! # fn main() -> rust_fcnn::Result<()> {
//! let xs = vec![array![0.0, 0.0], array![0.0, 1.0], array![1.0, 0.0], array![1.0, 1.0]];
//! let ys = vec![array![0.0], array![1.0], array![1.0], array![0.0]];
//!
//! let mut net = NetworkBuilder::new(2)?
//!     .add_layer(2, 4, Activation::Tanh, Init::Xavier)?
//!     .add_layer(4, 1, Activation::Sigmoid, Init::Xavier)?
//!     .learning_rate(0.1)
//!     .build_with_seed(0)?;
//!
//! let history = net.train(100, &xs, &ys)?;
//! assert_eq!(history.len(), 100);
//! let _y = net.forward(&xs[1])?;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod error;
pub mod layer;
pub mod loss;
pub mod network;
pub mod optim;
pub mod train;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::Activation;
pub use builder::{NetworkBuilder, DEFAULT_LEARNING_RATE};
pub use error::{Error, Result};
pub use layer::{Init, Layer};
pub use loss::Loss;
pub use network::{Gradients, Network, NonFinite, NonFiniteHook};
pub use optim::{Adam, Optimizer, OptimizerState, Sgd};

#[cfg(feature = "serde")]
pub use serde_model::{SerializedLayer, SerializedWeights};
