use log::{debug, info, trace, warn};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::check_len;
use crate::{Error, Network, Result};

impl Network {
    /// Train on every example of every epoch, in order.
    ///
    /// Returns the mean per-example loss of each epoch. All inputs and targets are
    /// validated before the first update.
    pub fn train(
        &mut self,
        epochs: usize,
        inputs: &[Array1<f64>],
        targets: &[Array1<f64>],
    ) -> Result<Vec<f64>> {
        self.validate_training_data(inputs, targets)?;
        validate_epochs(epochs)?;

        info!(
            "training: epochs={epochs} examples={} lr={} l2={}",
            inputs.len(),
            self.learning_rate(),
            self.l2()
        );

        let mut history = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let mut total_loss = 0.0;
            for (idx, (input, target)) in inputs.iter().zip(targets).enumerate() {
                let loss = self.backward(input, target)?;
                self.report_non_finite(epoch, idx, loss);
                total_loss += loss;
            }

            let avg_loss = total_loss / inputs.len() as f64;
            debug!("epoch {}/{epochs}: loss={avg_loss}", epoch + 1);
            history.push(avg_loss);
        }

        info!("training done: final loss={:?}", history.last());
        Ok(history)
    }

    /// Mini-batch training with a fresh random permutation every epoch.
    ///
    /// Each epoch runs `floor(N / batch_size)` full batches; a trailing remainder
    /// shorter than `batch_size` is skipped. The recorded epoch loss is the summed
    /// loss divided by the full dataset size `N`, skipped examples included.
    pub fn train_batch<R: Rng + ?Sized>(
        &mut self,
        epochs: usize,
        batch_size: usize,
        inputs: &[Array1<f64>],
        targets: &[Array1<f64>],
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        self.validate_training_data(inputs, targets)?;
        validate_epochs(epochs)?;
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }

        let n = inputs.len();
        let num_batches = n / batch_size;
        if n % batch_size != 0 {
            warn!(
                "{} of {n} examples do not fill a batch of {batch_size} and are skipped each epoch",
                n % batch_size
            );
        }
        info!(
            "batch training: epochs={epochs} examples={n} batch_size={batch_size} batches={num_batches}"
        );

        let mut history = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let mut indices: Vec<usize> = (0..n).collect();
            indices.shuffle(rng);

            let mut total_loss = 0.0;
            for (batch_idx, batch) in indices.chunks_exact(batch_size).enumerate() {
                let mut batch_loss = 0.0;
                for &idx in batch {
                    let loss = self.backward(&inputs[idx], &targets[idx])?;
                    self.report_non_finite(epoch, idx, loss);
                    batch_loss += loss;
                }
                trace!("epoch {} batch {batch_idx}: loss={batch_loss}", epoch + 1);
                total_loss += batch_loss;
            }

            let avg_loss = total_loss / n as f64;
            debug!("epoch {}/{epochs}: loss={avg_loss}", epoch + 1);
            history.push(avg_loss);
        }

        info!("batch training done: final loss={:?}", history.last());
        Ok(history)
    }

    /// [`Network::train_batch`] with a `StdRng` seeded from `seed`.
    pub fn train_batch_with_seed(
        &mut self,
        epochs: usize,
        batch_size: usize,
        inputs: &[Array1<f64>],
        targets: &[Array1<f64>],
        seed: u64,
    ) -> Result<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.train_batch(epochs, batch_size, inputs, targets, &mut rng)
    }

    /// Forward every input.
    pub fn predict(&self, inputs: &[Array1<f64>]) -> Result<Vec<Array1<f64>>> {
        inputs.iter().map(|x| self.forward(x)).collect()
    }

    /// Mean loss over a dataset, without the L2 penalty and without updating.
    pub fn evaluate(&self, inputs: &[Array1<f64>], targets: &[Array1<f64>]) -> Result<f64> {
        self.validate_training_data(inputs, targets)?;

        let mut total = 0.0;
        for (input, target) in inputs.iter().zip(targets) {
            let output = self.forward(input)?;
            total += self.loss().compute(&output, target)?;
        }
        Ok(total / inputs.len() as f64)
    }

    fn validate_training_data(
        &self,
        inputs: &[Array1<f64>],
        targets: &[Array1<f64>],
    ) -> Result<()> {
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        for (input, target) in inputs.iter().zip(targets) {
            check_len("input", input.len(), self.input_size())?;
            check_len("target", target.len(), self.output_size())?;
        }
        Ok(())
    }
}

fn validate_epochs(epochs: usize) -> Result<()> {
    if epochs == 0 {
        return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
    }
    Ok(())
}
