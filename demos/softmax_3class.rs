use std::sync::Arc;

use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rust_fcnn::{Activation, Init, Loss, NetworkBuilder, NonFinite};

fn argmax(v: &Array1<f64>) -> usize {
    v.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &x)| {
            if x > best.1 {
                (i, x)
            } else {
                best
            }
        })
        .0
}

fn main() -> rust_fcnn::Result<()> {
    env_logger::init();

    // Tiny synthetic 3-class dataset in 2D.
    // Each class is a uniform blob around a different center.
    let mut rng = StdRng::seed_from_u64(0);

    let centers = [[-1.0, -1.0], [1.0, -1.0], [0.0, 1.0]];
    let n_per_class = 64;
    let mut xs = Vec::with_capacity(3 * n_per_class);
    let mut ys = Vec::with_capacity(3 * n_per_class);

    for (class, center) in centers.iter().enumerate() {
        for _ in 0..n_per_class {
            let x0 = center[0] + rng.gen_range(-0.3..0.3);
            let x1 = center[1] + rng.gen_range(-0.3..0.3);
            xs.push(array![x0, x1]);

            let mut one_hot = Array1::<f64>::zeros(3);
            one_hot[class] = 1.0;
            ys.push(one_hot);
        }
    }

    let mut net = NetworkBuilder::new(2)?
        .add_layer(2, 16, Activation::Tanh, Init::Xavier)?
        .add_layer(16, 3, Activation::Softmax, Init::Xavier)?
        .loss(Loss::CrossEntropy)
        .learning_rate(0.01)
        .build_with_seed(0)?;

    net.set_non_finite_hook(Arc::new(|event: &NonFinite| {
        eprintln!(
            "non-finite loss at epoch {} example {}",
            event.epoch, event.example
        );
    }));

    let history = net.train_batch(100, 32, &xs, &ys, &mut rng)?;
    println!("train_loss={}", history[history.len() - 1]);

    let correct = net
        .predict(&xs)?
        .iter()
        .zip(&ys)
        .filter(|(p, t)| argmax(p) == argmax(t))
        .count();
    println!("accuracy={:.3}", correct as f64 / xs.len() as f64);

    Ok(())
}
