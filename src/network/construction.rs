use super::{ConsError, FeedForward};
use crate::initializer::Initializer;
use crate::layers::DenseLayer;
use crate::policy::Policy;

/// Builder for networks where every layer is fully connected to the previous one.
///
/// ```
/// use digit_recognizer::{initializer::Uniform, network::LinearBuilder, policy::Policy};
///
/// let network = LinearBuilder::new(16384)
///     .layer(128)
///     .layer(64)
///     .layer(10)
///     .build(Policy::Sigmoid, Uniform::new(0))
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct LinearBuilder {
    in_size: usize,
    sizes: Vec<usize>,
}

impl LinearBuilder {
    pub fn new(in_size: usize) -> Self {
        LinearBuilder {
            in_size,
            sizes: Vec::new(),
        }
    }

    /// Adds a single layer with `size` neurons to the network.
    pub fn layer(mut self, size: usize) -> Self {
        self.sizes.push(size);
        self
    }

    /// Adds all of the layers provided by the `sizes` argument.
    pub fn layers<T>(mut self, sizes: T) -> Self
    where
        T: IntoIterator<Item = usize>,
    {
        self.sizes.extend(sizes);
        self
    }

    /// Builds the network, drawing every weight and then every bias of each layer from `init`.
    /// Returns Err if no layers had been provided or a size is zero.
    pub fn build<I>(self, policy: Policy, mut init: I) -> Result<FeedForward, ConsError>
    where
        I: Initializer,
    {
        if self.sizes.is_empty() {
            return Err(ConsError::Empty);
        }
        if self.in_size == 0 || self.sizes.contains(&0) {
            return Err(ConsError::ZeroSize);
        }

        let mut in_size = self.in_size;
        let mut layers = Vec::with_capacity(self.sizes.len());
        for size in self.sizes {
            layers.push(DenseLayer::new(&mut init, in_size, size));
            in_size = size;
        }
        FeedForward::from_layers(policy, layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializer::{Uniform, WeightInit};
    use crate::network::Network;

    #[test]
    fn builds_requested_topology() {
        let net = LinearBuilder::new(4)
            .layers(vec![3, 2])
            .build(Policy::Sigmoid, Uniform::new(1))
            .unwrap();
        assert_eq!(net.sizes(), vec![4, 3, 2]);
        assert_eq!(net.layers()[0].weights().len(), 12);
        assert_eq!(net.layers()[1].biases().len(), 2);
        assert_eq!(net.policy(), Policy::Sigmoid);
    }

    #[test]
    fn weights_come_before_biases() {
        let init = WeightInit::new((0..9).map(f64::from));
        let net = LinearBuilder::new(2)
            .layer(2)
            .layer(1)
            .build(Policy::Sigmoid, init)
            .unwrap();
        assert_eq!(net.layers()[0].weights(), &[0., 1., 2., 3.]);
        assert_eq!(net.layers()[0].biases(), &[4., 5.]);
        assert_eq!(net.layers()[1].weights(), &[6., 7.]);
        assert_eq!(net.layers()[1].biases(), &[8.]);
    }

    #[test]
    fn rejects_bad_topology() {
        assert_eq!(
            LinearBuilder::new(2)
                .build(Policy::Sigmoid, Uniform::new(0))
                .unwrap_err(),
            ConsError::Empty
        );
        assert_eq!(
            LinearBuilder::new(2)
                .layer(0)
                .build(Policy::Sigmoid, Uniform::new(0))
                .unwrap_err(),
            ConsError::ZeroSize
        );
    }
}
