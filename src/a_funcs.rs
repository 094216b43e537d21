use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

#[enum_dispatch]
pub trait ActivFunc {
    fn evaluate(&self, x: f64) -> f64;
    /// Derivative at the point where `inp` was the weighted input and `out` the activation.
    fn derivative(&self, inp: f64, out: f64) -> f64;
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Sigmoid;
impl ActivFunc for Sigmoid {
    fn evaluate(&self, x: f64) -> f64 {
        1. / (1. + (-x).exp())
    }
    fn derivative(&self, _: f64, out: f64) -> f64 {
        out * (1. - out)
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Identity;
impl ActivFunc for Identity {
    fn evaluate(&self, x: f64) -> f64 {
        x
    }
    fn derivative(&self, _: f64, _: f64) -> f64 {
        1.
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct ReLU;
impl ActivFunc for ReLU {
    fn evaluate(&self, x: f64) -> f64 {
        f64::max(x, 0.)
    }
    fn derivative(&self, inp: f64, _out: f64) -> f64 {
        if inp > 0. {
            1.
        } else {
            0.
        }
    }
}

/// The activation functions a layer can be evaluated with.
#[enum_dispatch(ActivFunc)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Activation {
    Sigmoid,
    Identity,
    ReLU,
}

/// Numerically stable softmax, `exp(x - max(x)) / sum(exp(x - max(x)))`.
pub fn softmax(x: &[f64]) -> Vec<f64> {
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = x.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|v| v / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_derivative_uses_activation() {
        let a = Sigmoid.evaluate(0.);
        assert_eq!(a, 0.5);
        assert_eq!(Sigmoid.derivative(123., a), 0.25);
    }

    #[test]
    fn relu_clamps_negative() {
        let f = Activation::from(ReLU);
        assert_eq!(f.evaluate(-3.), 0.);
        assert_eq!(f.evaluate(2.5), 2.5);
        assert_eq!(f.derivative(-3., 0.), 0.);
        assert_eq!(f.derivative(2.5, 2.5), 1.);
    }

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[1000., 1001., 999., -5.]);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.).abs() < 1e-12);
        assert!(p.iter().all(|v| (0. ..=1.).contains(v)));
        assert!(p[1] > p[0] && p[0] > p[2]);
    }
}
