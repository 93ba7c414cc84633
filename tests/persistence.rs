#![cfg(feature = "serde")]

use ndarray::array;

use rust_fcnn::{Activation, Error, Init, Network, NetworkBuilder, Optimizer};

fn net(seed: u64, hidden: usize) -> Network {
    NetworkBuilder::new(3)
        .unwrap()
        .add_layer(3, hidden, Activation::ReLU, Init::Xavier)
        .unwrap()
        .add_layer(hidden, 2, Activation::Softmax, Init::Xavier)
        .unwrap()
        .optimizer(Optimizer::adam())
        .build_with_seed(seed)
        .unwrap()
}

#[test]
fn saved_weights_reload_into_a_fresh_network() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");

    let mut trained = net(0, 4);
    let xs = vec![array![0.1, 0.2, 0.3], array![0.9, -0.5, 0.0]];
    let ys = vec![array![1.0, 0.0], array![0.0, 1.0]];
    trained.train(5, &xs, &ys).unwrap();
    trained.save_weights(&path).unwrap();

    let mut restored = net(1, 4);
    restored.load_weights(&path).unwrap();

    assert_eq!(restored.layers(), trained.layers());
    for x in &xs {
        assert_eq!(restored.forward(x).unwrap(), trained.forward(x).unwrap());
    }
}

#[test]
fn saved_file_holds_one_entry_per_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");
    net(0, 4).save_weights(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let layers = value["layers"].as_array().unwrap();
    assert_eq!(layers.len(), 2);

    // Layer 0 weights are (input_size, output_size) = 3 x 4.
    let w0 = layers[0]["weights"].as_array().unwrap();
    assert_eq!(w0.len(), 3);
    assert!(w0.iter().all(|row| row.as_array().unwrap().len() == 4));
    assert_eq!(layers[0]["biases"].as_array().unwrap().len(), 4);
    assert_eq!(layers[1]["biases"].as_array().unwrap().len(), 2);
}

#[test]
fn topology_mismatch_leaves_the_network_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");
    net(0, 5).save_weights(&path).unwrap();

    let mut target = net(1, 4);
    let before = target.clone();
    let err = target.load_weights(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidShape(_)));
    assert_eq!(target.layers(), before.layers());
}

#[test]
fn missing_or_corrupt_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut n = net(0, 4);

    let missing = dir.path().join("nope.json");
    assert!(matches!(n.load_weights(&missing), Err(Error::Io(_))));

    let corrupt = dir.path().join("corrupt.json");
    std::fs::write(&corrupt, "{\"layers\": [").unwrap();
    assert!(matches!(n.load_weights(&corrupt), Err(Error::Json(_))));

    let wrong_schema = dir.path().join("schema.json");
    std::fs::write(&wrong_schema, "{\"weights\": []}").unwrap();
    assert!(matches!(n.load_weights(&wrong_schema), Err(Error::Json(_))));
}
