use ndarray::array;

use rust_fcnn::{Activation, Init, NetworkBuilder};

fn main() -> rust_fcnn::Result<()> {
    env_logger::init();

    // Classic XOR dataset.
    let xs = vec![
        array![0.0, 0.0],
        array![0.0, 1.0],
        array![1.0, 0.0],
        array![1.0, 1.0],
    ];
    let ys = vec![array![0.0], array![1.0], array![1.0], array![0.0]];

    // 2 -> 4 -> 1 network, tanh hidden layer, sigmoid output.
    let mut net = NetworkBuilder::new(2)?
        .add_layer(2, 4, Activation::Tanh, Init::Xavier)?
        .add_layer(4, 1, Activation::Sigmoid, Init::Xavier)?
        .learning_rate(0.1)
        .build_with_seed(0)?;

    let history = net.train(2_000, &xs, &ys)?;
    println!(
        "first_loss={} final_loss={} train_mse={}",
        history[0],
        history[history.len() - 1],
        net.evaluate(&xs, &ys)?
    );

    for (x, y) in xs.iter().zip(net.predict(&xs)?) {
        println!("x={x} y={:.4}", y[0]);
    }

    Ok(())
}
