use ndarray::{array, Array1};

use rust_fcnn::{Activation, Init, Loss, Network, NetworkBuilder, Optimizer};

fn xor() -> (Vec<Array1<f64>>, Vec<Array1<f64>>) {
    let xs = vec![
        array![0.0, 0.0],
        array![0.0, 1.0],
        array![1.0, 0.0],
        array![1.0, 1.0],
    ];
    let ys = vec![array![0.0], array![1.0], array![1.0], array![0.0]];
    (xs, ys)
}

fn xor_net(seed: u64) -> Network {
    NetworkBuilder::new(2)
        .unwrap()
        .add_layer(2, 4, Activation::Tanh, Init::Xavier)
        .unwrap()
        .add_layer(4, 1, Activation::Sigmoid, Init::Xavier)
        .unwrap()
        .loss(Loss::Mse)
        .optimizer(Optimizer::Sgd)
        .learning_rate(0.1)
        .build_with_seed(seed)
        .unwrap()
}

fn separates_xor(net: &Network) -> bool {
    let (xs, ys) = xor();
    xs.iter().zip(&ys).all(|(x, y)| {
        let out = net.forward(x).unwrap()[0];
        (out > 0.5) == (y[0] > 0.5)
    })
}

#[test]
fn sgd_learns_xor() {
    let (xs, ys) = xor();

    // A small net occasionally settles in a poor local minimum, so require most
    // seeds to succeed instead of pinning a single one.
    let mut learned = 0;
    for seed in 0..5 {
        let mut net = xor_net(seed);
        let history = net.train(2_000, &xs, &ys).unwrap();
        assert_eq!(history.len(), 2_000);
        assert!(history.iter().all(|l| l.is_finite()));
        assert!(net.is_finite());

        if separates_xor(&net) {
            assert!(history[1_999] < history[0]);
            learned += 1;
        }
    }
    assert!(learned >= 3, "only {learned}/5 seeds learned XOR");
}

#[test]
fn sigmoid_mlp_reaches_low_loss_on_xor() {
    let (xs, ys) = xor();

    for seed in 0..5 {
        let mut net = NetworkBuilder::new(2)
            .unwrap()
            .add_layer(2, 3, Activation::Sigmoid, Init::Xavier)
            .unwrap()
            .add_layer(3, 1, Activation::Sigmoid, Init::Xavier)
            .unwrap()
            .learning_rate(0.1)
            .build_with_seed(seed)
            .unwrap();
        net.train(2_000, &xs, &ys).unwrap();

        let loss = net.evaluate(&xs, &ys).unwrap();
        assert!(loss < 0.05, "seed {seed}: loss {loss}");
        assert!(separates_xor(&net), "seed {seed} misclassifies XOR");
    }
}

#[test]
fn training_is_reproducible_for_a_fixed_seed() {
    let (xs, ys) = xor();
    let mut a = xor_net(11);
    let mut b = xor_net(11);

    let ha = a.train_batch_with_seed(50, 2, &xs, &ys, 3).unwrap();
    let hb = b.train_batch_with_seed(50, 2, &xs, &ys, 3).unwrap();
    assert_eq!(ha, hb);
    assert_eq!(a.layers(), b.layers());
}
