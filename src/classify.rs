use rand::Rng;
use serde::{Deserialize, Serialize};

/// The digit a network settled on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub digit: usize,
    pub confidence: f64,
    pub probabilities: Vec<f64>,
}

/// Selects the index of the largest value. On ties the lowest index wins.
/// Returns None for an empty slice.
pub fn arg_max(values: &[f64]) -> Option<usize> {
    let (first, rest) = values.split_first()?;
    let mut max = *first;
    let mut idx = 0;
    for (i, v) in rest.iter().enumerate() {
        if *v > max {
            max = *v;
            idx = i + 1;
        }
    }
    Some(idx)
}

/// Turns a network output into a prediction.
///
/// # Panics
/// Panics if `output` is empty.
pub fn classify(output: &[f64]) -> Prediction {
    let digit = arg_max(output).expect("Cannot classify an empty output");
    Prediction {
        digit,
        confidence: output[digit],
        probabilities: output.to_vec(),
    }
}

/// A prediction together with where it came from.
/// A fallback is never the work of a model and must not be presented as one.
#[derive(Clone, Debug, PartialEq)]
pub enum Guess {
    /// Produced by a loaded model.
    Model(Prediction),
    /// A random stand-in used while no model is available.
    Fallback(Prediction),
}

impl Guess {
    pub fn prediction(&self) -> &Prediction {
        match self {
            Guess::Model(p) | Guess::Fallback(p) => p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Guess::Fallback(_))
    }

    /// A random digit with a confidence in [0.5, 1), the remaining probability
    /// being split evenly among the other `classes - 1` digits.
    pub fn random<R: Rng>(rng: &mut R, classes: usize) -> Guess {
        assert!(classes > 1, "A guess needs at least two classes");
        let digit = rng.gen_range(0, classes);
        let confidence = 0.5 + rng.gen::<f64>() * 0.5;
        let rest = (1. - confidence) / (classes - 1) as f64;
        let probabilities = (0..classes)
            .map(|i| if i == digit { confidence } else { rest })
            .collect();

        Guess::Fallback(Prediction {
            digit,
            confidence,
            probabilities,
        })
    }
}
