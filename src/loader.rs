//! Loading pretrained models and answering predictions with them.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use std::error;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::classify::{classify, Guess, Prediction};
use crate::config::RecognizerConfig;
use crate::network::{ConsError, FeedForward, Network, ShapeError};
use crate::serde::PretrainedModel;

/// Default file name of a pretrained model.
pub const DEFAULT_MODEL: &str = "digit_model.json";

/// Holds a pretrained model once it has been successfully loaded.
pub struct ModelLoader {
    model: Option<FeedForward>,
    source: Option<PathBuf>,
    fallback: Option<SmallRng>,
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader {
    pub fn new() -> Self {
        Self {
            model: None,
            source: None,
            fallback: None,
        }
    }

    /// A loader set up as `config` describes. No model is loaded yet.
    pub fn from_config(config: &RecognizerConfig) -> Self {
        let loader = Self::new();
        if config.fallback {
            loader.with_fallback(None)
        } else {
            loader
        }
    }

    /// Whether [guess](Self::guess) may answer without a model.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Allow [guess](Self::guess) to answer with a random [Guess::Fallback] while no model is loaded.
    pub fn with_fallback(mut self, seed: Option<u64>) -> Self {
        self.fallback = Some(match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        });
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&FeedForward> {
        self.model.as_ref()
    }

    /// Path of the file the current model was read from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Loads a pretrained model from a JSON file.
    /// On failure any previously loaded model is kept.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let path = path.as_ref();
        let res = fs::read_to_string(path)
            .map_err(LoadError::Io)
            .and_then(|s| parse(&s));
        match res {
            Ok(model) => {
                self.install(model);
                self.source = Some(path.to_owned());
                Ok(())
            }
            Err(e) => {
                log::error!("Error loading model from {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Loads a pretrained model from an in-memory JSON document.
    pub fn load_str(&mut self, json: &str) -> Result<(), LoadError> {
        let model = parse(json).map_err(|e| {
            log::error!("Error loading model: {}", e);
            e
        })?;
        self.install(model);
        self.source = None;
        Ok(())
    }

    /// Loads a pretrained model from any reader.
    pub fn load_reader<R: Read>(&mut self, mut reader: R) -> Result<(), LoadError> {
        let mut s = String::new();
        reader.read_to_string(&mut s).map_err(LoadError::Io)?;
        self.load_str(&s)
    }

    fn install(&mut self, model: FeedForward) {
        log::info!(
            "Model loaded successfully, layer sizes: {:?}, policy: {:?}",
            model.sizes(),
            model.policy()
        );
        self.model = Some(model);
    }

    /// Classifies `input` with the loaded model.
    pub fn predict(&self, input: &[f64]) -> Result<Prediction, PredictError> {
        let model = self.model.as_ref().ok_or(PredictError::NotReady)?;
        log::debug!(
            "Input length: {}, drawn pixels: {}",
            input.len(),
            input.iter().sum::<f64>()
        );
        let output = model.predict(input)?;
        let prediction = classify(&output);
        log::debug!(
            "Predicted digit: {} Confidence: {:.3}",
            prediction.digit,
            prediction.confidence
        );
        Ok(prediction)
    }

    /// Like [predict](Self::predict), but answers with a tagged random guess when no model is
    /// loaded and the fallback was enabled.
    pub fn guess(&mut self, input: &[f64]) -> Result<Guess, PredictError> {
        match self.predict(input) {
            Ok(p) => Ok(Guess::Model(p)),
            Err(PredictError::NotReady) => match &mut self.fallback {
                Some(rng) => {
                    log::warn!("No model loaded, answering with a random guess");
                    Ok(Guess::random(rng, 10))
                }
                None => Err(PredictError::NotReady),
            },
            Err(e) => Err(e),
        }
    }
}

/// Accepts a pretrained model document, or a network in its native format.
fn parse(json: &str) -> Result<FeedForward, LoadError> {
    match serde_json::from_str::<PretrainedModel>(json) {
        Ok(doc) => doc.into_network().map_err(LoadError::Invalid),
        Err(e) => serde_json::from_str::<FeedForward>(json).map_err(|_| LoadError::Parse(e)),
    }
}

/// Reasons a model could not be loaded.
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be read.
    Io(io::Error),
    /// The file isn't a well formed model document.
    Parse(serde_json::Error),
    /// The document describes an inconsistent network.
    Invalid(ConsError),
}

impl error::Error for LoadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Parse(e) => Some(e),
            LoadError::Invalid(e) => Some(e),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "Failed to load model: {}", e),
            LoadError::Parse(e) => write!(f, "Failed to parse model: {}", e),
            LoadError::Invalid(e) => write!(f, "Invalid model: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    /// No model has been loaded yet.
    NotReady,
    /// The input doesn't match the model.
    Shape(ShapeError),
}

impl error::Error for PredictError {}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::NotReady => f.write_str("Model not loaded"),
            PredictError::Shape(e) => write!(f, "Input doesn't fit the model. {}", e),
        }
    }
}

impl From<ShapeError> for PredictError {
    fn from(e: ShapeError) -> Self {
        PredictError::Shape(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"{
        "input_size": 2,
        "hidden_sizes": [2, 2],
        "output_size": 2,
        "activation": "relu",
        "weights1": [[1.0, 0.0], [0.0, 1.0]],
        "bias1": [0.0, 0.0],
        "weights2": [[1.0, 0.0], [0.0, 1.0]],
        "bias2": [0.0, 0.0],
        "weights3": [[1.0, 0.0], [0.0, 1.0]],
        "bias3": [0.0, 0.0]
    }"#;

    #[test]
    fn not_ready_before_load() {
        let loader = ModelLoader::new();
        assert!(!loader.is_loaded());
        assert_eq!(loader.predict(&[0., 1.]), Err(PredictError::NotReady));
    }

    #[test]
    fn predicts_after_load() {
        let mut loader = ModelLoader::new();
        loader.load_str(TINY).unwrap();
        let p = loader.predict(&[0., 1.]).unwrap();
        assert_eq!(p.digit, 1);
        assert!(p.confidence > 0.5);
    }

    #[test]
    fn malformed_document() {
        let mut loader = ModelLoader::new();
        assert!(matches!(
            loader.load_str("{ not json"),
            Err(LoadError::Parse(_))
        ));
        assert_eq!(loader.predict(&[0., 1.]), Err(PredictError::NotReady));
    }

    #[test]
    fn failed_reload_keeps_model() {
        let mut loader = ModelLoader::new();
        loader.load_str(TINY).unwrap();
        assert!(loader.load("this/file/does/not/exist.json").is_err());
        assert!(loader.is_loaded());
    }

    #[test]
    fn fallback_only_when_enabled() {
        let mut loader = ModelLoader::new();
        assert_eq!(loader.guess(&[0., 1.]), Err(PredictError::NotReady));

        let mut loader = ModelLoader::new().with_fallback(Some(5));
        assert!(loader.guess(&[0., 1.]).unwrap().is_fallback());

        loader.load_str(TINY).unwrap();
        let guess = loader.guess(&[0., 1.]).unwrap();
        assert!(!guess.is_fallback());
        assert_eq!(guess.prediction().digit, 1);
    }

    #[test]
    fn loads_from_reader() {
        let mut loader = ModelLoader::new();
        loader.load_reader(TINY.as_bytes()).unwrap();
        assert!(loader.is_loaded());
        assert_eq!(loader.source(), None);
        assert_eq!(loader.predict(&[1., 0.]).unwrap().digit, 0);
    }

    #[test]
    fn native_format_is_accepted() {
        let mut loader = ModelLoader::new();
        loader.load_str(TINY).unwrap();
        let native = serde_json::to_string(loader.model().unwrap()).unwrap();

        let mut other = ModelLoader::new();
        other.load_str(&native).unwrap();
        assert_eq!(other.model(), loader.model());
    }

    #[test]
    fn inconsistent_document() {
        let mut loader = ModelLoader::new();
        let bad = TINY.replace(r#""bias3": [0.0, 0.0]"#, r#""bias3": [0.0]"#);
        assert!(matches!(loader.load_str(&bad), Err(LoadError::Invalid(_))));
        assert!(!loader.is_loaded());
    }

    #[test]
    fn fallback_follows_config() {
        let mut config = RecognizerConfig::default();
        let mut loader = ModelLoader::from_config(&config);
        assert!(!loader.has_fallback());
        assert_eq!(loader.guess(&[0., 1.]), Err(PredictError::NotReady));

        config.fallback = true;
        let mut loader = ModelLoader::from_config(&config);
        assert!(loader.has_fallback());
        let guess = loader.guess(&[0., 1.]).unwrap();
        assert!(guess.is_fallback());
        assert_eq!(guess.prediction().probabilities.len(), 10);
    }

    #[test]
    fn shape_errors_are_not_hidden_by_fallback() {
        let mut loader = ModelLoader::new().with_fallback(Some(5));
        loader.load_str(TINY).unwrap();
        assert!(matches!(
            loader.guess(&[0., 1., 1.]),
            Err(PredictError::Shape(_))
        ));
    }
}
