use rand::distributions::Uniform as UniformDist;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of initial parameter values. Layers ask for their weights row by row and then
/// for their biases, `in_size` and `size` describe the layer being initialized.
pub trait Initializer {
    fn get(&mut self, in_size: usize, size: usize) -> f64;
}

impl<T: Initializer + ?Sized> Initializer for &mut T {
    fn get(&mut self, in_size: usize, size: usize) -> f64 {
        (**self).get(in_size, size)
    }
}

/// Draws every weight and bias independently and uniformly from [-1, 1].
pub struct Uniform {
    rng: SmallRng,
    dist: UniformDist<f64>,
}

impl Uniform {
    pub fn new(seed: u64) -> Uniform {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Uniform {
        Self::with_rng(SmallRng::from_entropy())
    }

    fn with_rng(rng: SmallRng) -> Uniform {
        Uniform {
            rng,
            dist: UniformDist::new_inclusive(-1., 1.),
        }
    }
}

impl Initializer for Uniform {
    fn get(&mut self, _in_size: usize, _size: usize) -> f64 {
        self.rng.sample(&self.dist)
    }
}

/// This initializer accepts an iterator over f64 values and uses them to initialize the weights.
/// Panics if a weight is requested but the iterator returns None.
pub struct WeightInit<T: Iterator<Item = f64>> {
    iter: T,
}
impl<I: Iterator<Item = f64>> WeightInit<I> {
    pub fn new<T: IntoIterator<Item = f64, IntoIter = I>>(weights: T) -> Self {
        Self {
            iter: weights.into_iter(),
        }
    }
}

impl<I: Iterator<Item = f64>> Initializer for WeightInit<I> {
    fn get(&mut self, _in_size: usize, _size: usize) -> f64 {
        self.iter.next().expect("Ran out of weights")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stays_in_range() {
        let mut init = Uniform::new(7);
        let values: Vec<f64> = (0..1000).map(|_| init.get(3, 2)).collect();
        assert!(values.iter().all(|v| (-1. ..=1.).contains(v)));
        assert!(values.iter().any(|v| *v < 0.) && values.iter().any(|v| *v > 0.));
    }

    #[test]
    fn uniform_is_reproducible() {
        let mut a = Uniform::new(42);
        let mut b = Uniform::new(42);
        for _ in 0..10 {
            assert_eq!(a.get(1, 1), b.get(1, 1));
        }
    }
}
