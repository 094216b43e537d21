pub mod construction;
pub mod feed_forward;

pub use self::construction::LinearBuilder;
pub use self::feed_forward::{ConsError, FeedForward, Forward, Grads};

use crate::policy::Policy;

use std::error;
use std::fmt;

/// Trait all neural network architectures must implement
pub trait Network {
    /// Run a forward pass, retaining every intermediate value needed for training.
    fn forward(&self, input: &[f64]) -> Result<Forward, ShapeError>;

    /// Predict the value corresponding to `input`.
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, ShapeError> {
        Ok(self.forward(input)?.output)
    }

    /// Accumulates the parameter gradients for the pass recorded in `trace` into `grads`.
    /// `output_gradients` are the loss gradients with respect to the last layer's activations.
    fn calc_gradients(&self, trace: &Forward, output_gradients: &[f64], grads: &mut Grads);

    /// Creates a zeroed gradient buffer matching the network's parameters.
    fn grads(&self) -> Grads;

    /// Calls `func` with the weights and the biases of every layer along with the index of the layer.
    fn for_each_param_mut<F>(&mut self, func: F)
    where
        F: FnMut(usize, &mut [f64], &mut [f64]);

    /// Returns the activation and loss policy of the network.
    fn policy(&self) -> Policy;

    /// Returns input size of the network
    fn in_size(&self) -> usize;

    /// Return output size of the network
    fn out_size(&self) -> usize;
}

/// Lets a network be trained in place through a mutable borrow.
impl<N: Network> Network for &mut N {
    fn forward(&self, input: &[f64]) -> Result<Forward, ShapeError> {
        (**self).forward(input)
    }

    fn calc_gradients(&self, trace: &Forward, output_gradients: &[f64], grads: &mut Grads) {
        (**self).calc_gradients(trace, output_gradients, grads)
    }

    fn grads(&self) -> Grads {
        (**self).grads()
    }

    fn for_each_param_mut<F>(&mut self, func: F)
    where
        F: FnMut(usize, &mut [f64], &mut [f64]),
    {
        (**self).for_each_param_mut(func)
    }

    fn policy(&self) -> Policy {
        (**self).policy()
    }

    fn in_size(&self) -> usize {
        (**self).in_size()
    }

    fn out_size(&self) -> usize {
        (**self).out_size()
    }
}

/// A vector didn't have the length the network expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeError {
    pub expected: usize,
    pub received: usize,
}

impl ShapeError {
    /// Returns Err if `received` differs from `expected`.
    pub fn check(expected: usize, received: usize) -> Result<(), ShapeError> {
        if expected == received {
            Ok(())
        } else {
            Err(ShapeError { expected, received })
        }
    }
}

impl error::Error for ShapeError {}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected a vector of length {} but received one of length {}.",
            self.expected, self.received
        )
    }
}
