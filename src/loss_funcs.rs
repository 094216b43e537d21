use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub trait LossFunc {
    /// Calculate the loss of `val` against `target`.
    fn eval(&self, val: &[f64], target: &[f64]) -> f64;
    /// Write the gradients of the loss into `deriv`.
    ///
    /// The gradients are taken with respect to the input of the network's terminal,
    /// which is the output of the last layer.
    fn gradients(&self, val: &[f64], target: &[f64], deriv: &mut [f64]);
}

/// Halved squared error, `0.5 * sum((target - val)^2)`.
/// Its gradient is simply `val - target`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SquaredError;

impl LossFunc for SquaredError {
    fn eval(&self, val: &[f64], target: &[f64]) -> f64 {
        assert_eq!(val.len(), target.len());
        val.iter()
            .zip(target)
            .map(|(v, t)| {
                let diff = t - v;
                0.5 * diff * diff
            })
            .sum()
    }

    fn gradients(&self, val: &[f64], target: &[f64], deriv: &mut [f64]) {
        assert_eq!(val.len(), target.len());
        assert_eq!(val.len(), deriv.len());
        for ((val, target), deriv) in val.iter().zip(target).zip(deriv) {
            *deriv = val - target;
        }
    }
}

/// Cross entropy of a softmax distribution. `val` must already be the softmax output,
/// the gradient returned is the combined softmax and cross entropy gradient `val - target`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CrossEntropy;

impl LossFunc for CrossEntropy {
    fn eval(&self, val: &[f64], target: &[f64]) -> f64 {
        assert_eq!(val.len(), target.len());
        val.iter()
            .zip(target)
            .filter(|(_, t)| **t != 0.)
            .map(|(v, t)| -t * v.max(f64::MIN_POSITIVE).ln())
            .sum()
    }

    fn gradients(&self, val: &[f64], target: &[f64], deriv: &mut [f64]) {
        assert_eq!(val.len(), target.len());
        assert_eq!(val.len(), deriv.len());
        for ((val, target), deriv) in val.iter().zip(target).zip(deriv) {
            *deriv = val - target;
        }
    }
}

#[enum_dispatch(LossFunc)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Loss {
    SquaredError,
    CrossEntropy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_error() {
        let val = [0.75, 0.25];
        let target = [1., 0.];
        assert_eq!(SquaredError.eval(&val, &target), 0.0625);

        let mut deriv = [0.; 2];
        SquaredError.gradients(&val, &target, &mut deriv);
        assert_eq!(deriv, [-0.25, 0.25]);
    }

    #[test]
    fn cross_entropy_ignores_cold_classes() {
        let val = [0.5, 0.25, 0.25];
        let target = [0., 1., 0.];
        let loss = Loss::from(CrossEntropy).eval(&val, &target);
        assert!((loss - 4f64.ln()).abs() < 1e-12);
    }
}
