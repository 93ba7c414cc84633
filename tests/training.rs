use std::sync::{Arc, Mutex};

use ndarray::{array, Array1};

use rust_fcnn::{Activation, Error, Init, Loss, Network, NetworkBuilder, NonFinite, Optimizer};

fn net(optimizer: Optimizer, learning_rate: f64) -> Network {
    NetworkBuilder::new(2)
        .unwrap()
        .add_layer(2, 3, Activation::Tanh, Init::Xavier)
        .unwrap()
        .add_layer(3, 1, Activation::Sigmoid, Init::Xavier)
        .unwrap()
        .optimizer(optimizer)
        .learning_rate(learning_rate)
        .build_with_seed(42)
        .unwrap()
}

fn total_loss(net: &Network, input: &Array1<f64>, target: &Array1<f64>) -> f64 {
    net.loss().compute(&net.forward(input).unwrap(), target).unwrap() + net.l2_penalty()
}

#[test]
fn a_small_step_reduces_the_loss_on_its_example() {
    let input = array![0.5, -0.25];
    let target = array![1.0];

    for l2 in [0.0, 0.01] {
        let mut n = net(Optimizer::Sgd, 0.01);
        n.set_l2(l2).unwrap();
        let before = total_loss(&n, &input, &target);
        let reported = n.backward(&input, &target).unwrap();
        assert!((reported - before).abs() < 1e-12);
        assert!(total_loss(&n, &input, &target) < before);

        // The loss reported by the next step is measured before its own update.
        let again = n.backward(&input, &target).unwrap();
        assert!(again < reported);
    }
}

#[test]
fn batch_training_skips_the_trailing_remainder() {
    let xs: Vec<_> = (0..5).map(|i| array![i as f64 * 0.1, 1.0]).collect();
    let ys: Vec<_> = (0..5).map(|i| array![(i % 2) as f64]).collect();

    let mut n = net(Optimizer::adam(), 0.001);
    n.train_batch_with_seed(3, 2, &xs, &ys, 0).unwrap();
    // 2 full batches of 2 per epoch; the fifth example never trains.
    assert_eq!(n.optimizer_state().steps(), Some(12));

    let mut whole = net(Optimizer::adam(), 0.001);
    whole.train_batch_with_seed(2, 5, &xs, &ys, 0).unwrap();
    assert_eq!(whole.optimizer_state().steps(), Some(10));

    // A batch larger than the dataset trains on nothing.
    let mut none = net(Optimizer::adam(), 0.001);
    let before = none.clone();
    let history = none.train_batch_with_seed(2, 6, &xs, &ys, 0).unwrap();
    assert_eq!(history, vec![0.0, 0.0]);
    assert_eq!(none.layers(), before.layers());
}

#[test]
fn batch_epoch_loss_is_divided_by_the_full_dataset_size() {
    // Identical examples and a negligible learning rate keep every per-example
    // loss at the same value `l`; 4 of 5 examples train, so the epoch loss is 4l/5.
    let xs = vec![array![0.3, -0.6]; 5];
    let ys = vec![array![1.0]; 5];
    let mut n = net(Optimizer::Sgd, 1e-12);
    let l = n.evaluate(&xs[..1], &ys[..1]).unwrap();

    let history = n.train_batch_with_seed(1, 2, &xs, &ys, 9).unwrap();
    assert!((history[0] - 4.0 * l / 5.0).abs() < 1e-9);

    let history = n.train(1, &xs, &ys).unwrap();
    assert!((history[0] - l).abs() < 1e-9);
}

#[test]
fn batch_order_depends_on_the_rng() {
    let xs: Vec<_> = (0..8).map(|i| array![i as f64 / 8.0, 1.0 - i as f64 / 8.0]).collect();
    let ys: Vec<_> = (0..8).map(|i| array![(i % 2) as f64]).collect();

    let mut a = net(Optimizer::Sgd, 0.1);
    let mut b = net(Optimizer::Sgd, 0.1);
    a.train_batch_with_seed(3, 4, &xs, &ys, 1).unwrap();
    b.train_batch_with_seed(3, 4, &xs, &ys, 2).unwrap();
    // Different shuffles visit examples in a different order.
    assert_ne!(a.layers(), b.layers());
}

#[test]
fn non_finite_losses_reach_the_hook() {
    let seen: Arc<Mutex<Vec<NonFinite>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut n = net(Optimizer::Sgd, 0.1);
    n.set_non_finite_hook(Arc::new(move |event: &NonFinite| {
        sink.lock().unwrap().push(*event);
    }));

    let xs = vec![array![0.0, 1.0], array![f64::NAN, 1.0]];
    let ys = vec![array![1.0], array![0.0]];
    let history = n.train(2, &xs, &ys).unwrap();

    assert!(history[0].is_nan());
    assert!(!n.is_finite());
    // Epochs and examples are reported zero-based. Once the weights are NaN,
    // every example of the second epoch is non-finite too.
    let events = seen.lock().unwrap();
    let at: Vec<_> = events.iter().map(|e| (e.epoch, e.example)).collect();
    assert_eq!(at, vec![(0, 1), (1, 0), (1, 1)]);
    assert!(events.iter().all(|e| e.loss.is_nan()));
}

#[test]
fn zero_init_keeps_hidden_units_symmetric() {
    let mut n = NetworkBuilder::new(2)
        .unwrap()
        .add_layer(2, 3, Activation::Tanh, Init::Zero)
        .unwrap()
        .add_layer(3, 1, Activation::Sigmoid, Init::Zero)
        .unwrap()
        .learning_rate(0.5)
        .build_with_seed(0)
        .unwrap();

    let xs = vec![array![0.0, 1.0], array![1.0, 0.0], array![1.0, 1.0]];
    let ys = vec![array![1.0], array![1.0], array![0.0]];
    n.train(20, &xs, &ys).unwrap();

    let hidden = n.layer(0).unwrap();
    let out = n.layer(1).unwrap();
    for r in 0..2 {
        for c in 1..3 {
            assert!((hidden.weights()[[r, c]] - hidden.weights()[[r, 0]]).abs() < 1e-12);
        }
    }
    for r in 1..3 {
        assert!((out.weights()[[r, 0]] - out.weights()[[0, 0]]).abs() < 1e-12);
    }
}

#[test]
fn cross_entropy_training_raises_the_true_class_probability() {
    let mut n = NetworkBuilder::new(2)
        .unwrap()
        .add_layer(2, 6, Activation::Tanh, Init::Xavier)
        .unwrap()
        .add_layer(6, 3, Activation::Softmax, Init::Xavier)
        .unwrap()
        .loss(Loss::CrossEntropy)
        .learning_rate(0.01)
        .build_with_seed(5)
        .unwrap();

    let x = array![0.2, -0.4];
    let t = array![0.0, 1.0, 0.0];
    let p0 = n.forward(&x).unwrap()[1];
    for _ in 0..10 {
        n.backward(&x, &t).unwrap();
    }
    let p1 = n.forward(&x).unwrap()[1];
    assert!(p1 > p0, "p0={p0} p1={p1}");
    let out = n.forward(&x).unwrap();
    assert!((out.sum() - 1.0).abs() < 1e-12);
}

#[test]
fn errors_are_classified() {
    let mut n = net(Optimizer::Sgd, 0.1);
    let xs = vec![array![0.0, 1.0]];
    let ys = vec![array![1.0]];

    assert!(matches!(n.train(0, &xs, &ys), Err(Error::InvalidConfig(_))));
    assert!(matches!(n.train(1, &xs, &[]), Err(Error::InvalidData(_))));
    assert!(matches!(
        n.train(1, &[array![1.0]], &ys),
        Err(Error::InvalidShape(_))
    ));
    assert!(matches!(
        n.forward(&array![1.0, 2.0, 3.0]),
        Err(Error::InvalidShape(_))
    ));
}
