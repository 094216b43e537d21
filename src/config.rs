use serde::{Deserialize, Serialize};

use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::DEFAULT_MODEL;

/// Parameters of a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    /// Number of epochs run before control is returned to the caller.
    pub chunk_size: usize,
    pub batch_size: usize,
    /// Visit the examples in a random order every epoch instead of the stored order.
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 100,
            chunk_size: 10,
            batch_size: 1,
            shuffle: false,
            seed: 0,
        }
    }
}

impl TrainingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)?;
        let config = serde_json::from_str(&s)?;
        Ok(config)
    }
}

/// Describes the recognizer as a whole: where its model lives, its shape and where examples are kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub model_path: PathBuf,
    pub input_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub output_size: usize,
    /// Answer with a tagged random guess while no model is loaded.
    pub fallback: bool,
    pub store_dir: PathBuf,
    pub training: TrainingConfig,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL),
            input_size: 128 * 128,
            hidden_sizes: vec![128, 64],
            output_size: 10,
            fallback: false,
            store_dir: PathBuf::from("."),
            training: TrainingConfig::default(),
        }
    }
}

impl RecognizerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)?;
        let config = serde_json::from_str(&s)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: RecognizerConfig =
            serde_json::from_str(r#"{ "hidden_sizes": [32], "training": { "epochs": 5 } }"#)
                .unwrap();
        assert_eq!(config.input_size, 16384);
        assert_eq!(config.hidden_sizes, vec![32]);
        assert_eq!(config.model_path, PathBuf::from("digit_model.json"));
        assert_eq!(config.training.epochs, 5);
        assert_eq!(config.training.chunk_size, 10);
        assert_eq!(config.training.learning_rate, 0.1);
    }

    #[test]
    fn read_from_file() {
        let dir = std::env::temp_dir().join(format!("digit-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("training.json");
        fs::write(&path, r#"{ "learning_rate": 0.25, "shuffle": true }"#).unwrap();
        let training = TrainingConfig::from_file(&path).unwrap();
        assert_eq!(training.learning_rate, 0.25);
        assert!(training.shuffle);
        assert_eq!(training.epochs, 100);

        let path = dir.join("recognizer.json");
        fs::write(&path, r#"{ "fallback": true, "store_dir": "drawings" }"#).unwrap();
        let config = RecognizerConfig::from_file(&path).unwrap();
        assert!(config.fallback);
        assert_eq!(config.store_dir, PathBuf::from("drawings"));

        assert!(TrainingConfig::from_file(dir.join("missing.json")).is_err());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn empty_document() {
        let config: TrainingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TrainingConfig::default());
    }
}
