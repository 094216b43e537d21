#![allow(dead_code)]

use digit_recognizer::{
    layers::DenseLayer,
    network::FeedForward,
    policy::Policy,
    storage::Example,
};

pub const INPUT: [f64; 2] = [0.05, 0.10];
pub const TARGET: [f64; 2] = [0.01, 0.99];

/// The 2-2-2 network with hand picked weights used as a numeric reference.
pub fn two_two_two() -> FeedForward {
    FeedForward::from_layers(
        Policy::Sigmoid,
        vec![
            DenseLayer::from_parts(2, 2, vec![0.15, 0.25, 0.20, 0.30], vec![0.35, 0.35]).unwrap(),
            DenseLayer::from_parts(2, 2, vec![0.40, 0.50, 0.45, 0.55], vec![0.60, 0.60]).unwrap(),
        ],
    )
    .unwrap()
}

/// One example per class, each lighting up a different input.
pub fn one_hot_examples(classes: usize) -> Vec<Example> {
    (0..classes)
        .map(|c| {
            let mut input = vec![0.; classes];
            input[c] = 1.;
            Example::labelled(input, c, classes)
        })
        .collect()
}

pub fn assert_close(expected: &[f64], actual: &[f64], eps: f64) {
    assert_eq!(expected.len(), actual.len());
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        assert!(
            (e - a).abs() <= eps,
            "Element {} differs: expected {}, got {}",
            i,
            e,
            a
        );
    }
}
