//! Weight persistence (feature: `serde`).
//!
//! The on-disk format holds only parameters, in network order:
//!
//! ```json
//! { "layers": [ { "weights": [[0.1, 0.2], [0.3, 0.4]], "biases": [0.0, 0.0] } ] }
//! ```
//!
//! Weight matrices are row-major with shape `(input_size, output_size)`. Topology,
//! activations and optimizer state are not stored: weights are loaded into an
//! already-built network with the same topology.
//!
//! Loading validates every layer before replacing anything, so a rejected file
//! leaves the network untouched.

use std::path::Path;

use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{Error, Layer, Network, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedWeights {
    pub layers: Vec<SerializedLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayer {
    /// Row-major `(input_size, output_size)`.
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl From<&Layer> for SerializedLayer {
    fn from(layer: &Layer) -> Self {
        Self {
            weights: layer
                .weights()
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
            biases: layer.biases().to_vec(),
        }
    }
}

impl From<&Network> for SerializedWeights {
    fn from(network: &Network) -> Self {
        Self {
            layers: network.layers().iter().map(SerializedLayer::from).collect(),
        }
    }
}

impl SerializedLayer {
    /// Convert into arrays, checking them against `live`'s shape.
    fn to_arrays(&self, idx: usize, live: &Layer) -> Result<(Array2<f64>, Array1<f64>)> {
        let rows = self.weights.len();
        let cols = self.weights.first().map_or(0, Vec::len);
        let (live_rows, live_cols) = live.weights().dim();

        if rows != live_rows || cols != live_cols {
            return Err(Error::InvalidShape(format!(
                "layer {idx}: stored weights {rows}x{cols} do not match network weights \
                 {live_rows}x{live_cols}"
            )));
        }
        if let Some(r) = self.weights.iter().position(|row| row.len() != cols) {
            return Err(Error::InvalidShape(format!(
                "layer {idx}: weight row {r} has len {}, expected {cols}",
                self.weights[r].len()
            )));
        }
        if self.biases.len() != live.output_size() {
            return Err(Error::InvalidShape(format!(
                "layer {idx}: stored biases len {} does not match network biases len {}",
                self.biases.len(),
                live.output_size()
            )));
        }

        let flat: Vec<f64> = self.weights.iter().flatten().copied().collect();
        if flat.iter().chain(&self.biases).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(format!(
                "layer {idx}: parameters must be finite"
            )));
        }
        let weights = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| Error::InvalidShape(format!("layer {idx}: {e}")))?;
        Ok((weights, Array1::from(self.biases.clone())))
    }
}

impl Network {
    /// Serialize all weights and biases to a pretty-printed JSON string.
    pub fn weights_to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&SerializedWeights::from(self))?)
    }

    /// Replace every layer's parameters with `weights`.
    ///
    /// Fails without modifying the network if the layer count or any layer shape
    /// differs from the current topology.
    pub fn apply_weights(&mut self, weights: &SerializedWeights) -> Result<()> {
        if weights.layers.len() != self.num_layers() {
            return Err(Error::InvalidShape(format!(
                "stored layer count {} does not match network layer count {}",
                weights.layers.len(),
                self.num_layers()
            )));
        }

        let arrays = weights
            .layers
            .iter()
            .zip(self.layers())
            .enumerate()
            .map(|(idx, (stored, live))| stored.to_arrays(idx, live))
            .collect::<Result<Vec<_>>>()?;

        for (idx, (w, b)) in arrays.into_iter().enumerate() {
            if let Some(layer) = self.layer_mut(idx) {
                layer.weights_mut().assign(&w);
                layer.biases_mut().assign(&b);
            }
        }
        Ok(())
    }

    /// Load weights from a JSON string produced by [`Network::weights_to_json`].
    pub fn load_weights_from_json(&mut self, s: &str) -> Result<()> {
        let weights: SerializedWeights = serde_json::from_str(s)?;
        self.apply_weights(&weights)
    }

    /// Save all weights and biases to a JSON file.
    pub fn save_weights<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        std::fs::write(p, self.weights_to_json()?)?;
        debug!("saved {} layers to {}", self.num_layers(), p.display());
        Ok(())
    }

    /// Load weights and biases from a JSON file into this network.
    pub fn load_weights<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)?;
        self.load_weights_from_json(&s)?;
        debug!("loaded {} layers from {}", self.num_layers(), p.display());
        Ok(())
    }
}
