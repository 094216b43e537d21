use crate::{
    a_funcs::{ActivFunc, Activation},
    initializer::Initializer,
    network::ConsError,
};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Your run of the mill fully connected (dense) layer.
/// Weights are stored row-major with one row per input, so `weights[i * size + j]`
/// connects input `i` to neuron `j`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "DenseParts")]
pub struct DenseLayer {
    in_size: usize,
    size: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

/// Gradients of a single dense layer's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGrads {
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl LayerGrads {
    pub fn zeroed(layer: &DenseLayer) -> Self {
        Self {
            weights: vec![0.; layer.weights.len()],
            biases: vec![0.; layer.biases.len()],
        }
    }

    pub fn fill(&mut self, val: f64) {
        self.weights.iter_mut().for_each(|g| *g = val);
        self.biases.iter_mut().for_each(|g| *g = val);
    }
}

impl DenseLayer {
    pub fn new<I>(mut init: I, in_size: usize, size: usize) -> Self
    where
        I: Initializer,
    {
        let weights = (0..in_size * size)
            .map(|_| init.get(in_size, size))
            .collect();
        let biases = (0..size).map(|_| init.get(in_size, size)).collect();

        Self {
            in_size,
            size,
            weights,
            biases,
        }
    }

    /// Assemble a layer from explicit parameters.
    pub fn from_parts(
        in_size: usize,
        size: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Self, ConsError> {
        if in_size == 0 || size == 0 {
            return Err(ConsError::ZeroSize);
        }
        if weights.len() != in_size * size {
            return Err(ConsError::WeightCount {
                weights: weights.len(),
                expected: in_size * size,
            });
        }
        if biases.len() != size {
            return Err(ConsError::BiasCount {
                biases: biases.len(),
                expected: size,
            });
        }

        Ok(Self {
            in_size,
            size,
            weights,
            biases,
        })
    }

    /// Evaluate the layer, writing the weighted inputs and activations into the provided buffers.
    pub fn eval(
        &self,
        input: &[f64],
        a_func: &Activation,
        weighted_inputs: &mut [f64],
        activations: &mut [f64],
    ) {
        // assert dominance
        assert_eq!(input.len(), self.in_size);
        assert_eq!(weighted_inputs.len(), self.size);
        assert_eq!(activations.len(), self.size);

        weighted_inputs.copy_from_slice(&self.biases);
        for (inp, row) in input.iter().zip(self.weights.chunks_exact(self.size)) {
            if *inp == 0. {
                continue;
            }
            for (wi, w) in weighted_inputs.iter_mut().zip(row) {
                *wi += inp * w;
            }
        }

        for (wi, o) in weighted_inputs.iter().zip(activations.iter_mut()) {
            *o = a_func.evaluate(*wi);
        }
    }

    /// Accumulate the gradients of the layer's parameters into `grads`.
    /// `in_grads` are the loss gradients with respect to this layer's activations and
    /// `out_grads` will be filled with the gradients with respect to the layer's input.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_gradients(
        &self,
        a_func: &Activation,
        input: &[f64],
        weighted_inputs: &[f64],
        activations: &[f64],
        in_grads: &[f64],
        grads: &mut LayerGrads,
        out_grads: &mut [f64],
    ) {
        // assert dominance
        assert_eq!(input.len(), self.in_size);
        assert_eq!(weighted_inputs.len(), self.size);
        assert_eq!(activations.len(), self.size);
        assert_eq!(in_grads.len(), self.size);
        assert_eq!(out_grads.len(), self.in_size);
        assert_eq!(grads.weights.len(), self.weights.len());
        assert_eq!(grads.biases.len(), self.size);

        let delta: Vec<f64> = weighted_inputs
            .iter()
            .zip(activations)
            .zip(in_grads)
            .map(|((wi, a), g)| a_func.derivative(*wi, *a) * g)
            .collect();

        for (bd, d) in grads.biases.iter_mut().zip(&delta) {
            *bd += *d;
        }

        for (((wds, row), inp), od) in grads
            .weights
            .chunks_exact_mut(self.size)
            .zip(self.weights.chunks_exact(self.size))
            .zip(input)
            .zip(out_grads.iter_mut())
        {
            let mut acc = 0.;
            for ((wd, w), d) in wds.iter_mut().zip(row).zip(&delta) {
                *wd += inp * d;
                acc += w * d;
            }
            *od = acc;
        }
    }

    pub fn in_size(&self) -> usize {
        self.in_size
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Mutable access to the weights and biases at the same time.
    pub fn params_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.weights, &mut self.biases)
    }

    /// Iterate over the weight matrix one input row at a time.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.weights.chunks_exact(self.size)
    }
}

/// The serialized form of a layer, checked before becoming a [DenseLayer](self::DenseLayer).
#[derive(Deserialize)]
struct DenseParts {
    in_size: usize,
    size: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl TryFrom<DenseParts> for DenseLayer {
    type Error = ConsError;

    fn try_from(p: DenseParts) -> Result<Self, Self::Error> {
        DenseLayer::from_parts(p.in_size, p.size, p.weights, p.biases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{a_funcs::Identity, initializer::WeightInit, layers::tests::check};

    fn create_layer() -> DenseLayer {
        let init = (1..=12).map(f64::from).chain(std::iter::repeat(0.).take(3));
        DenseLayer::new(WeightInit::new(init), 4, 3)
    }

    const INPUTS: [f64; 4] = [1., 2., 3., 4.];
    const TOLERANCE: f64 = 0.0001;

    #[test]
    fn dense_eval() {
        let layer = create_layer();
        let mut weighted = [0.; 3];
        let mut output = [0.; 3];
        layer.eval(&INPUTS, &Identity.into(), &mut weighted, &mut output);
        let expected = &[70., 80., 90.];

        check(expected, &output, TOLERANCE, "output");
    }

    #[test]
    fn dense_eval_adds_biases() {
        let layer = DenseLayer::from_parts(2, 2, vec![1., 0., 0., 1.], vec![0.5, -0.5]).unwrap();
        let mut weighted = [0.; 2];
        let mut output = [0.; 2];
        layer.eval(&[2., 3.], &Identity.into(), &mut weighted, &mut output);
        check(&[2.5, 2.5], &output, TOLERANCE, "output");
    }

    /// Computes the various derivatives to be tested.
    /// The derivatives are returned in this order [weight_deriv, bias_deriv, out_deriv]
    fn derivs() -> [Vec<f64>; 3] {
        let layer = create_layer();
        let a_func = Activation::from(Identity);
        let mut grads = LayerGrads::zeroed(&layer);

        let mut weighted = [0.; 3];
        let mut activations = [0.; 3];
        let in_grads = [0.1, 0.2, 0.3];
        let mut out_grads = [0.; 4];

        layer.eval(&INPUTS, &a_func, &mut weighted, &mut activations);
        layer.calc_gradients(
            &a_func,
            &INPUTS,
            &weighted,
            &activations,
            &in_grads,
            &mut grads,
            &mut out_grads,
        );

        [grads.weights, grads.biases, out_grads.to_vec()]
    }

    #[test]
    fn dense_backprop_weights() {
        let output = &derivs()[0];
        let expected = [0.1, 0.2, 0.3, 0.2, 0.4, 0.6, 0.3, 0.6, 0.9, 0.4, 0.8, 1.2];
        check(&expected, output, TOLERANCE, "weight derivatives");
    }

    #[test]
    fn dense_backprop_bias() {
        let output = &derivs()[1];
        let expected = [0.1, 0.2, 0.3];
        check(&expected, output, TOLERANCE, "bias derivatives");
    }

    #[test]
    fn dense_backprop_output() {
        let output = &derivs()[2];
        let expected = [1.4, 3.2, 5.0, 6.8];
        check(&expected, output, TOLERANCE, "output derivatives");
    }

    #[test]
    fn rejects_wrong_weight_count() {
        let err = DenseLayer::from_parts(2, 2, vec![1., 2., 3.], vec![0., 0.]).unwrap_err();
        assert!(matches!(
            err,
            ConsError::WeightCount {
                weights: 3,
                expected: 4
            }
        ));
    }

    #[test]
    fn deserialization_is_validated() {
        let json = r#"{"in_size":2,"size":1,"weights":[1.0,2.0],"biases":[]}"#;
        assert!(serde_json::from_str::<DenseLayer>(json).is_err());
        let json = r#"{"in_size":2,"size":1,"weights":[1.0,2.0],"biases":[0.5]}"#;
        let layer: DenseLayer = serde_json::from_str(json).unwrap();
        assert_eq!(layer.biases(), &[0.5]);
    }
}
