use serde::{Deserialize, Serialize};

use crate::a_funcs::{softmax, Activation, Identity, ReLU, Sigmoid};
use crate::loss_funcs::{CrossEntropy, Loss, SquaredError};

/// Describes how a network turns weighted inputs into its output and how its error is measured.
/// A network keeps the same policy for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// ReLU hidden layers, a linear last layer followed by softmax, cross entropy loss.
    /// This is what pretrained models use.
    ReluSoftmax,
    /// Sigmoid on every layer, the raw activations are the output, squared error loss.
    /// This is what networks trained from scratch use.
    Sigmoid,
}

/// What happens to the output of the last layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    /// Normalize into a probability distribution.
    Softmax,
    /// Pass through unchanged. The values don't sum to one.
    Raw,
}

impl Policy {
    pub fn hidden(self) -> Activation {
        match self {
            Policy::ReluSoftmax => ReLU.into(),
            Policy::Sigmoid => Sigmoid.into(),
        }
    }

    pub fn last(self) -> Activation {
        match self {
            Policy::ReluSoftmax => Identity.into(),
            Policy::Sigmoid => Sigmoid.into(),
        }
    }

    /// Activation of layer `idx` in a network with `count` layers.
    pub fn activation(self, idx: usize, count: usize) -> Activation {
        if idx + 1 == count {
            self.last()
        } else {
            self.hidden()
        }
    }

    pub fn terminal(self) -> Terminal {
        match self {
            Policy::ReluSoftmax => Terminal::Softmax,
            Policy::Sigmoid => Terminal::Raw,
        }
    }

    pub fn loss(self) -> Loss {
        match self {
            Policy::ReluSoftmax => CrossEntropy.into(),
            Policy::Sigmoid => SquaredError.into(),
        }
    }
}

impl Terminal {
    pub fn apply(self, last: &[f64]) -> Vec<f64> {
        match self {
            Terminal::Softmax => softmax(last),
            Terminal::Raw => last.to_vec(),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Sigmoid
    }
}
