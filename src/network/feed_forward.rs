use std::convert::TryFrom;
use std::error;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Network, ShapeError};
use crate::layers::{DenseLayer, LayerGrads};
use crate::policy::Policy;

/// This struct represents a neural network and supports giving predictions based on provided input
/// as well as computing the gradients needed to train it.
/// Additionally, it can be both saved to and loaded from a file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "NetworkUnvalidated", try_from = "NetworkUnvalidated")]
pub struct FeedForward {
    policy: Policy,
    layers: Vec<DenseLayer>,
}

/// Everything computed during a single forward pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Forward {
    /// Weighted inputs of every layer.
    pub weighted: Vec<Vec<f64>>,
    /// Activations of every layer, preceded by the network input.
    pub activations: Vec<Vec<f64>>,
    /// Network output after the policy's terminal has been applied.
    pub output: Vec<f64>,
}

impl Forward {
    /// Activations of the last layer, before the terminal.
    pub fn last(&self) -> &[f64] {
        self.activations.last().map_or(&[][..], |a| a.as_slice())
    }
}

/// Gradients of all of the parameters of a network.
#[derive(Clone, Debug, PartialEq)]
pub struct Grads {
    layers: Vec<LayerGrads>,
}

impl Grads {
    pub fn new(net: &FeedForward) -> Self {
        Self {
            layers: net.layers.iter().map(LayerGrads::zeroed).collect(),
        }
    }

    pub fn layers(&self) -> &[LayerGrads] {
        &self.layers
    }

    /// Multiply every gradient by `k`.
    pub fn scale(&mut self, k: f64) {
        for l in &mut self.layers {
            l.weights.iter_mut().chain(l.biases.iter_mut()).for_each(|g| *g *= k);
        }
    }

    /// Resets the gradients to zero.
    pub fn reset(&mut self) {
        self.layers.iter_mut().for_each(|l| l.fill(0.));
    }
}

impl FeedForward {
    /// Assemble a network from layers, checking that every layer accepts the output of the previous one.
    pub fn from_layers(policy: Policy, layers: Vec<DenseLayer>) -> Result<Self, ConsError> {
        NetworkUnvalidated { policy, layers }.validate()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)?;
        let network: Self = serde_json::from_str(&s)?;
        Ok(network)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string(&self)?)?;
        Ok(())
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Sizes of every layer, starting with the input.
    pub fn sizes(&self) -> Vec<usize> {
        std::iter::once(self.in_size())
            .chain(self.layers.iter().map(|l| l.size()))
            .collect()
    }
}

impl Network for FeedForward {
    fn forward(&self, input: &[f64]) -> Result<Forward, ShapeError> {
        ShapeError::check(self.in_size(), input.len())?;

        let count = self.layers.len();
        let mut weighted = Vec::with_capacity(count);
        let mut activations = Vec::with_capacity(count + 1);
        activations.push(input.to_vec());

        for (i, l) in self.layers.iter().enumerate() {
            let a_func = self.policy.activation(i, count);
            let mut wi = vec![0.; l.size()];
            let mut a = vec![0.; l.size()];
            l.eval(&activations[i], &a_func, &mut wi, &mut a);
            weighted.push(wi);
            activations.push(a);
        }

        let output = self.policy.terminal().apply(&activations[count]);
        Ok(Forward {
            weighted,
            activations,
            output,
        })
    }

    fn calc_gradients(&self, trace: &Forward, output_gradients: &[f64], grads: &mut Grads) {
        let count = self.layers.len();
        assert_eq!(trace.weighted.len(), count);
        assert_eq!(grads.layers.len(), count);
        assert_eq!(output_gradients.len(), self.out_size());

        let mut in_grads = output_gradients.to_vec();
        for (i, (layer, lg)) in self
            .layers
            .iter()
            .zip(grads.layers.iter_mut())
            .enumerate()
            .rev()
        {
            let a_func = self.policy.activation(i, count);
            let mut out_grads = vec![0.; layer.in_size()];
            layer.calc_gradients(
                &a_func,
                &trace.activations[i],
                &trace.weighted[i],
                &trace.activations[i + 1],
                &in_grads,
                lg,
                &mut out_grads,
            );
            in_grads = out_grads;
        }
    }

    fn grads(&self) -> Grads {
        Grads::new(self)
    }

    fn for_each_param_mut<F>(&mut self, mut func: F)
    where
        F: FnMut(usize, &mut [f64], &mut [f64]),
    {
        for (i, l) in self.layers.iter_mut().enumerate() {
            let (w, b) = l.params_mut();
            func(i, w, b);
        }
    }

    fn policy(&self) -> Policy {
        self.policy
    }

    fn in_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.in_size())
    }

    fn out_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size())
    }
}

impl From<FeedForward> for NetworkUnvalidated {
    fn from(net: FeedForward) -> Self {
        NetworkUnvalidated {
            policy: net.policy,
            layers: net.layers,
        }
    }
}

/// When deserializing, we first construct this object, validate that its structure is correct and convert to Network
#[derive(Clone, Serialize, Deserialize)]
struct NetworkUnvalidated {
    policy: Policy,
    layers: Vec<DenseLayer>,
}

impl NetworkUnvalidated {
    fn validate(self) -> Result<FeedForward, ConsError> {
        if self.layers.is_empty() {
            return Err(ConsError::Empty);
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].size() != pair[1].in_size() {
                return Err(ConsError::Incompatible {
                    index: i + 1,
                    received_input: pair[0].size(),
                    expected_input: pair[1].in_size(),
                });
            }
        }
        Ok(FeedForward {
            policy: self.policy,
            layers: self.layers,
        })
    }
}

impl TryFrom<NetworkUnvalidated> for FeedForward {
    type Error = ConsError;
    fn try_from(value: NetworkUnvalidated) -> Result<Self, Self::Error> {
        value.validate()
    }
}

/// An Error during the construction of a network.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsError {
    /// A layer is incompatible with the previous one
    Incompatible {
        index: usize,
        received_input: usize,
        expected_input: usize,
    },
    /// The wrong number of weights had been given.
    WeightCount { weights: usize, expected: usize },
    /// The wrong number of biases had been given.
    BiasCount { biases: usize, expected: usize },
    /// A declared size disagrees with the parameters describing it.
    SizeMismatch {
        field: &'static str,
        declared: usize,
        actual: usize,
    },
    /// A weight matrix has rows of different lengths.
    Ragged { field: &'static str, row: usize },
    /// Output `index` is labelled with a different class.
    ClassOrder { index: usize, label: i64 },
    /// Layers must have at least a single input and a single neuron.
    ZeroSize,
    Empty,
}
impl error::Error for ConsError {}
impl fmt::Display for ConsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsError::Incompatible {
                index,
                received_input,
                expected_input,
            } => write!(
                f,
                "Layer {} is incompatible with layer {}:\n\tExpected input length of {} but received {}.",
                index,
                index - 1,
                expected_input,
                received_input,
            ),
            ConsError::WeightCount { weights, expected } => write!(
                f,
                "Expected {} weights but {} were provided.",
                expected, weights
            ),
            ConsError::BiasCount { biases, expected } => write!(
                f,
                "Expected {} biases but {} were provided.",
                expected, biases
            ),
            ConsError::SizeMismatch {
                field,
                declared,
                actual,
            } => write!(
                f,
                "'{}' has size {} but the model declares {}.",
                field, actual, declared
            ),
            ConsError::Ragged { field, row } => {
                write!(f, "Row {} of '{}' has a different length.", row, field)
            }
            ConsError::ClassOrder { index, label } => write!(
                f,
                "Output {} is labelled as class {}, classes must be listed in output order.",
                index, label
            ),
            ConsError::ZeroSize => f.write_str("Layer sizes must be positive."),
            ConsError::Empty => {
                f.write_str("The network must have at least a single layer, but it was empty.")
            }
        }?;
        f.write_str(" Error occured while attempting to construct a network.")?;
        Ok(())
    }
}
