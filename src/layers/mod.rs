pub mod dense_layer;

pub use dense_layer::{DenseLayer, LayerGrads};

#[cfg(test)]
pub(crate) mod tests {
    /// Compares two arrays with the given error tolerance. Returns None if either of the arrays contains NaN.
    pub(crate) fn is_equal_ish(left: &[f64], right: &[f64], tolerance: f64) -> Option<bool> {
        assert_eq!(left.len(), right.len());
        let err = left
            .iter()
            .zip(right)
            .map(|(l, r)| f64::abs(l - r))
            .try_fold(0., |a, b| {
                if let Some(ord) = a.partial_cmp(&b) {
                    Some(match ord {
                        std::cmp::Ordering::Less => b,
                        std::cmp::Ordering::Equal => a,
                        std::cmp::Ordering::Greater => a,
                    })
                } else {
                    None
                }
            });
        err.map(|e| e < tolerance)
    }

    pub(crate) fn check(expected: &[f64], output: &[f64], tolerance: f64, id: &str) {
        let diag = || format!("expected: {:?}\nreceived: {:?}", expected, output);

        if let Some(eq) = is_equal_ish(expected, output, tolerance) {
            if eq {
                return;
            } else {
                panic!("Evaluation produced incorrect {}.\n{}", id, diag())
            }
        } else {
            panic!("Evaluation produced a NaN\n{}", diag())
        }
    }
}
