pub use gradient_descent::GradientDescent;
pub mod gradient_descent;

use crate::{
    loss_funcs::LossFunc,
    network::{FeedForward, Grads, Network, ShapeError},
};
use std::ops::{Deref, DerefMut};

pub trait Optimizer {
    /// Process the provided input and target, accumulating gradients. Returns the loss.
    fn process(&mut self, input: &[f64], target: &[f64]) -> Result<f64, ShapeError>;

    /// Update model weights based on collected data.
    fn update_model(&mut self);

    /// Get input size of the network.
    fn in_size(&self) -> usize;

    /// Get output size of the network.
    fn out_size(&self) -> usize;
}

/// This trait provides interface which must be implemented by optimization
/// algorithms so that they can be used by the DefaultOptimizer.
pub trait OptimizerAlg {
    /// Modifies the weights based on the gradients such that a minimum can be reached.
    fn update_weights(&mut self, weights: &mut [f64], gradients: &[f64]);
}

/// Performs a single step of stochastic gradient descent on `network`, in place.
/// Returns the loss of the network's output before the step.
pub fn train(
    network: &mut FeedForward,
    input: &[f64],
    target: &[f64],
    l_rate: f64,
) -> Result<f64, ShapeError> {
    let mut grads = network.grads();
    let loss = accumulate(network, &mut grads, input, target)?;
    apply(network, &mut GradientDescent::new(l_rate), &grads);
    Ok(loss)
}

/// Forward pass, loss and backpropagation for a single example.
fn accumulate<N: Network>(
    network: &N,
    grads: &mut Grads,
    input: &[f64],
    target: &[f64],
) -> Result<f64, ShapeError> {
    ShapeError::check(network.out_size(), target.len())?;
    let trace = network.forward(input)?;

    let loss_func = network.policy().loss();
    let loss = loss_func.eval(&trace.output, target);
    let mut output_grads = vec![0.; target.len()];
    loss_func.gradients(&trace.output, target, &mut output_grads);

    network.calc_gradients(&trace, &output_grads, grads);
    Ok(loss)
}

fn apply<N: Network, O: OptimizerAlg>(network: &mut N, alg: &mut O, grads: &Grads) {
    let layers = grads.layers();
    network.for_each_param_mut(|i, weights, biases| {
        alg.update_weights(weights, &layers[i].weights);
        alg.update_weights(biases, &layers[i].biases);
    });
}

/// Couples a network with an optimization algorithm. Gradients are accumulated by
/// [process](Optimizer::process) and averaged and applied by [update_model](Optimizer::update_model).
#[derive(Debug, Clone)]
pub struct DefaultOptimizer<N = FeedForward, O = GradientDescent> {
    optimizer: O,
    network: N,
    grads: Grads,
    n: usize,
}

impl<N, O> DefaultOptimizer<N, O>
where
    N: Network,
{
    pub fn new(network: N, optimizer: O) -> Self {
        Self {
            optimizer,
            grads: network.grads(),
            network,
            n: 0,
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn into_network(self) -> N {
        self.network
    }
}

impl<N, O> Optimizer for DefaultOptimizer<N, O>
where
    O: OptimizerAlg,
    N: Network,
{
    fn process(&mut self, input: &[f64], target: &[f64]) -> Result<f64, ShapeError> {
        let loss = accumulate(&self.network, &mut self.grads, input, target)?;
        self.n += 1;
        Ok(loss)
    }

    fn update_model(&mut self) {
        if self.n == 0 {
            log::warn!("Attempted to update the model without processing any gradients.")
        } else {
            // We have to average the gradients
            if self.n > 1 {
                self.grads.scale(1. / self.n as f64);
            }
            apply(&mut self.network, &mut self.optimizer, &self.grads);
            self.grads.reset();
            self.n = 0;
        }
    }

    fn in_size(&self) -> usize {
        self.network.in_size()
    }

    fn out_size(&self) -> usize {
        self.network.out_size()
    }
}

impl<N, O> Deref for DefaultOptimizer<N, O> {
    type Target = N;

    fn deref(&self) -> &Self::Target {
        &self.network
    }
}

impl<N, O> DerefMut for DefaultOptimizer<N, O> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.network
    }
}
