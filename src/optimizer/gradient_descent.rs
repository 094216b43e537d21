use super::*;

/// Gradient descent simply steps the weights against their derivatives.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientDescent {
    l_rate: f64,
}

impl OptimizerAlg for GradientDescent {
    fn update_weights(&mut self, weights: &mut [f64], gradients: &[f64]) {
        assert_eq!(weights.len(), gradients.len());
        let k = -self.l_rate;
        for (w, d) in weights.iter_mut().zip(gradients) {
            *w += k * *d;
        }
    }
}

impl GradientDescent {
    pub fn new(l_rate: f64) -> Self {
        Self { l_rate }
    }

    pub fn l_rate(&self) -> f64 {
        self.l_rate
    }
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self { l_rate: 0.1 }
    }
}
