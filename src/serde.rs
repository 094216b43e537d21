//! The JSON document pretrained models are distributed in.
//!
//! The document describes a fixed three layer network: two ReLU hidden layers and a linear output
//! layer followed by softmax. Weight matrices are arrays of rows, one row per input.

use serde::{Deserialize, Serialize};

use crate::layers::DenseLayer;
use crate::network::{ConsError, FeedForward, Network};
use crate::policy::Policy;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PretrainedModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    pub input_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub output_size: usize,
    /// Informational only, the network always runs with [Policy::ReluSoftmax].
    pub activation: String,
    pub weights1: Vec<Vec<f64>>,
    pub bias1: Vec<f64>,
    pub weights2: Vec<Vec<f64>>,
    pub bias2: Vec<f64>,
    pub weights3: Vec<Vec<f64>>,
    pub bias3: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<i64>>,
}

impl PretrainedModel {
    /// Checks the document against its declared sizes and builds the network it describes.
    pub fn into_network(self) -> Result<FeedForward, ConsError> {
        if self.hidden_sizes.len() != 2 {
            return Err(ConsError::SizeMismatch {
                field: "hidden_sizes",
                declared: 2,
                actual: self.hidden_sizes.len(),
            });
        }
        if let Some(classes) = &self.classes {
            check_classes(classes, self.output_size)?;
        }
        let sizes = [
            self.input_size,
            self.hidden_sizes[0],
            self.hidden_sizes[1],
            self.output_size,
        ];

        let layers = vec![
            layer("weights1", "bias1", sizes[0], sizes[1], self.weights1, self.bias1)?,
            layer("weights2", "bias2", sizes[1], sizes[2], self.weights2, self.bias2)?,
            layer("weights3", "bias3", sizes[2], sizes[3], self.weights3, self.bias3)?,
        ];
        FeedForward::from_layers(Policy::ReluSoftmax, layers)
    }

    /// Describes a three layer [Policy::ReluSoftmax] network as a pretrained model document.
    /// Returns None for any other kind of network.
    pub fn from_network(net: &FeedForward) -> Option<Self> {
        if net.policy() != Policy::ReluSoftmax || net.layers().len() != 3 {
            return None;
        }
        let l = net.layers();
        let rows = |l: &DenseLayer| l.rows().map(|r| r.to_vec()).collect::<Vec<_>>();

        Some(Self {
            model_type: Some("MLPClassifier".to_owned()),
            input_size: net.in_size(),
            hidden_sizes: vec![l[0].size(), l[1].size()],
            output_size: net.out_size(),
            activation: "relu".to_owned(),
            weights1: rows(&l[0]),
            bias1: l[0].biases().to_vec(),
            weights2: rows(&l[1]),
            bias2: l[1].biases().to_vec(),
            weights3: rows(&l[2]),
            bias3: l[2].biases().to_vec(),
            classes: Some((0..net.out_size() as i64).collect()),
        })
    }
}

/// Outputs are read as digits by their index, so the labels must be exactly `0..output_size`.
fn check_classes(classes: &[i64], output_size: usize) -> Result<(), ConsError> {
    if classes.len() != output_size {
        return Err(ConsError::SizeMismatch {
            field: "classes",
            declared: output_size,
            actual: classes.len(),
        });
    }
    match classes.iter().enumerate().find(|(i, c)| **c != *i as i64) {
        Some((index, &label)) => Err(ConsError::ClassOrder { index, label }),
        None => Ok(()),
    }
}

fn layer(
    w_field: &'static str,
    b_field: &'static str,
    in_size: usize,
    size: usize,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
) -> Result<DenseLayer, ConsError> {
    if weights.len() != in_size {
        return Err(ConsError::SizeMismatch {
            field: w_field,
            declared: in_size,
            actual: weights.len(),
        });
    }
    if let Some(row) = weights.iter().position(|r| r.len() != size) {
        return Err(ConsError::Ragged {
            field: w_field,
            row,
        });
    }
    if biases.len() != size {
        return Err(ConsError::SizeMismatch {
            field: b_field,
            declared: size,
            actual: biases.len(),
        });
    }
    DenseLayer::from_parts(in_size, size, weights.concat(), biases)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> PretrainedModel {
        PretrainedModel {
            model_type: None,
            input_size: 3,
            hidden_sizes: vec![2, 2],
            output_size: 2,
            activation: "relu".to_owned(),
            weights1: vec![vec![0.1, -0.2], vec![0.3, 0.4], vec![-0.5, 0.6]],
            bias1: vec![0.01, -0.02],
            weights2: vec![vec![0.7, -0.8], vec![0.9, 1.0]],
            bias2: vec![0.03, 0.04],
            weights3: vec![vec![-1.1, 1.2], vec![1.3, -1.4]],
            bias3: vec![0.05, -0.06],
            classes: None,
        }
    }

    #[test]
    fn builds_relu_softmax_network() {
        let net = doc().into_network().unwrap();
        assert_eq!(net.policy(), Policy::ReluSoftmax);
        assert_eq!(net.sizes(), vec![3, 2, 2, 2]);
        assert_eq!(net.layers()[0].weights(), &[0.1, -0.2, 0.3, 0.4, -0.5, 0.6]);
    }

    #[test]
    fn document_round_trip() {
        let net = doc().into_network().unwrap();
        let back = PretrainedModel::from_network(&net).unwrap();
        assert_eq!(back.weights1, doc().weights1);
        assert_eq!(back.bias3, doc().bias3);
        assert_eq!(back.into_network().unwrap(), net);
    }

    #[test]
    fn shape_is_checked() {
        let mut d = doc();
        d.weights2[1].pop();
        assert_eq!(
            d.into_network(),
            Err(ConsError::Ragged {
                field: "weights2",
                row: 1
            })
        );

        let mut d = doc();
        d.input_size = 4;
        assert!(matches!(
            d.into_network(),
            Err(ConsError::SizeMismatch {
                field: "weights1",
                ..
            })
        ));

        let mut d = doc();
        d.bias3.push(0.);
        assert!(d.into_network().is_err());
    }

    #[test]
    fn classes_must_match_outputs() {
        let mut d = doc();
        d.classes = Some(vec![0, 1]);
        assert!(d.into_network().is_ok());

        let mut d = doc();
        d.classes = Some(vec![1, 0]);
        assert_eq!(
            d.into_network(),
            Err(ConsError::ClassOrder { index: 0, label: 1 })
        );

        let mut d = doc();
        d.classes = Some(vec![0, 1, 2]);
        assert!(matches!(
            d.into_network(),
            Err(ConsError::SizeMismatch {
                field: "classes",
                ..
            })
        ));
    }

    #[test]
    fn optional_fields() {
        let json = serde_json::to_string(&doc()).unwrap();
        assert!(!json.contains("classes"));
        let parsed: PretrainedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc());
    }
}
