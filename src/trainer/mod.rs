//! Multi-epoch training over a collection of examples.
//!
//! Training is divided into chunks of a few epochs so that a host can regain control
//! between them. See [Trainer::chunks].

pub mod logger;
pub use logger::{LogCrate, LogFile, Logger, MockLogger};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use std::error;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::classify::arg_max;
use crate::config::TrainingConfig;
use crate::loss_funcs::LossFunc;
use crate::network::{FeedForward, Network, ShapeError};
use crate::optimizer::{DefaultOptimizer, GradientDescent, Optimizer};
use crate::storage::Example;

/// Reported after every chunk of epochs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub epochs_done: usize,
    pub epochs_total: usize,
    /// Mean loss of the last epoch in the chunk.
    pub loss: f64,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.epochs_done >= self.epochs_total
    }
}

/// How well a network does on a set of examples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    /// Fraction of examples whose predicted class matches the target.
    pub accuracy: f64,
}

/// Drives gradient descent over the examples, one epoch at a time.
#[derive(Debug)]
pub struct Trainer<N = FeedForward> {
    optimizer: DefaultOptimizer<N, GradientDescent>,
    logger: Box<dyn Logger>,
    examples: Vec<Example>,
    config: TrainingConfig,
    order: Vec<usize>,
    rng: SmallRng,
    epoch: usize,
}

impl<N: Network> Trainer<N> {
    /// Checks that there is something to train on and that every example fits the network.
    /// The network is left untouched when an error is returned.
    pub fn new(network: N, examples: Vec<Example>, config: TrainingConfig) -> Result<Self, TrainError> {
        validate(&network, &examples)?;
        log::debug!(
            "Training on {} examples for {} epochs",
            examples.len(),
            config.epochs
        );

        Ok(Self {
            optimizer: DefaultOptimizer::new(network, GradientDescent::new(config.learning_rate)),
            logger: Box::new(LogCrate),
            order: (0..examples.len()).collect(),
            rng: SmallRng::seed_from_u64(config.seed),
            examples,
            config,
            epoch: 0,
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Number of epochs completed so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Process a batch of examples and update the model, returns the summed loss.
    /// Although this function is public, you should probably make use of [chunks](Self::chunks)
    /// as it provides a nicer interface.
    pub fn do_batch(&mut self, batch: &[usize]) -> f64 {
        let mut acc = 0.;
        for &idx in batch {
            let ex = &self.examples[idx];
            acc += self
                .optimizer
                .process(&ex.input, &ex.target)
                .expect("Examples are validated when the trainer is created");
        }
        self.optimizer.update_model();
        acc
    }

    /// Process every example once, returns the average loss.
    pub fn do_epoch(&mut self) -> f64 {
        if self.config.shuffle {
            self.order.shuffle(&mut self.rng);
        }
        let order = std::mem::take(&mut self.order);
        let mut acc = 0.;
        for batch in order.chunks(self.config.batch_size.max(1)) {
            acc += self.do_batch(batch);
        }
        self.order = order;

        let loss = acc / self.examples.len() as f64;
        self.logger.epoch_loss(self.epoch, loss);
        self.epoch += 1;
        loss
    }

    /// Run `epochs` epochs at once. Returns the loss of the last one.
    pub fn train(&mut self, epochs: usize) -> Option<f64> {
        let mut last = None;
        for _ in 0..epochs {
            last = Some(self.do_epoch());
        }
        last
    }

    /// Iterate through the configured epochs, `chunk_size` of them per step.
    /// The model is consistent between steps, so the iterator may be dropped at any point
    /// and training resumed later by calling this method again.
    pub fn chunks(&mut self) -> Chunks<'_, N> {
        Chunks { inner: self }
    }

    /// Mean loss and accuracy of the current model on `examples`.
    pub fn test(&self, examples: &[Example]) -> Result<Evaluation, TrainError> {
        evaluate(self.optimizer.network(), examples)
    }

    pub fn into_network(self) -> N {
        self.optimizer.into_network()
    }
}

impl<N> Deref for Trainer<N> {
    type Target = DefaultOptimizer<N, GradientDescent>;

    fn deref(&self) -> &Self::Target {
        &self.optimizer
    }
}

impl<N> DerefMut for Trainer<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.optimizer
    }
}

pub struct Chunks<'a, N> {
    inner: &'a mut Trainer<N>,
}

impl<'a, N: Network> Iterator for Chunks<'a, N> {
    type Item = Progress;

    fn next(&mut self) -> Option<Self::Item> {
        let t = &mut *self.inner;
        let total = t.config.epochs;
        if t.epoch >= total {
            return None;
        }

        let n = t.config.chunk_size.max(1).min(total - t.epoch);
        let loss = t.train(n)?;
        let progress = Progress {
            epochs_done: t.epoch,
            epochs_total: total,
            loss,
        };
        t.logger.chunk(&progress);
        log::info!("Epoch {}/{}, loss: {:.6}", t.epoch, total, loss);
        Some(progress)
    }
}

fn validate<N: Network>(network: &N, examples: &[Example]) -> Result<(), TrainError> {
    if examples.is_empty() {
        return Err(TrainError::NoExamples);
    }
    for (index, ex) in examples.iter().enumerate() {
        ShapeError::check(network.in_size(), ex.input.len())
            .and_then(|_| ShapeError::check(network.out_size(), ex.target.len()))
            .map_err(|error| TrainError::Shape { index, error })?;
    }
    Ok(())
}

/// Mean loss and accuracy of `network` on `examples`, using the loss of the network's policy.
pub fn evaluate<N: Network>(network: &N, examples: &[Example]) -> Result<Evaluation, TrainError> {
    validate(network, examples)?;

    let loss_func = network.policy().loss();
    let mut loss = 0.;
    let mut correct = 0;
    for (index, ex) in examples.iter().enumerate() {
        let output = network
            .predict(&ex.input)
            .map_err(|error| TrainError::Shape { index, error })?;
        loss += loss_func.eval(&output, &ex.target);
        if arg_max(&output) == ex.label() {
            correct += 1;
        }
    }

    let n = examples.len() as f64;
    Ok(Evaluation {
        loss: loss / n,
        accuracy: correct as f64 / n,
    })
}

/// Reasons training could not start.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainError {
    /// There were no examples to train on.
    NoExamples,
    /// The example at `index` doesn't fit the network.
    Shape { index: usize, error: ShapeError },
}

impl error::Error for TrainError {}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainError::NoExamples => f.write_str("No training examples. Draw and label some digits first."),
            TrainError::Shape { index, error } => {
                write!(f, "Training example {} doesn't fit the network. {}", index, error)
            }
        }
    }
}
