use ndarray::array;

use rust_fcnn::{Activation, Init, Network, NetworkBuilder, Optimizer};

fn build(seed: u64) -> rust_fcnn::Result<Network> {
    NetworkBuilder::new(2)?
        .add_layer(2, 8, Activation::Tanh, Init::Xavier)?
        .add_layer(8, 1, Activation::Sigmoid, Init::Xavier)?
        .optimizer(Optimizer::adam())
        .learning_rate(0.01)
        .build_with_seed(seed)
}

fn main() -> rust_fcnn::Result<()> {
    env_logger::init();

    let xs = vec![
        array![0.0, 0.0],
        array![0.0, 1.0],
        array![1.0, 0.0],
        array![1.0, 1.0],
    ];
    let ys = vec![array![0.0], array![1.0], array![1.0], array![0.0]];

    let mut net = build(0)?;
    net.train_batch_with_seed(500, 2, &xs, &ys, 0)?;

    let path = std::env::temp_dir().join("rust_fcnn_weights.json");
    net.save_weights(&path)?;

    // Same topology, different initial weights: loading restores the trained model.
    let mut loaded = build(1)?;
    loaded.load_weights(&path)?;
    println!("saved and loaded weights: {}", path.display());

    for x in &xs {
        println!(
            "x={x} trained={:.4} loaded={:.4}",
            net.forward(x)?[0],
            loaded.forward(x)?[0]
        );
    }

    Ok(())
}
