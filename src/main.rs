use std::{env, fs, process};

use anyhow::{bail, Context};
use log::info;
use serde::Deserialize;

use digit_recognizer::{
    config::RecognizerConfig,
    initializer::Uniform,
    loader::ModelLoader,
    network::LinearBuilder,
    policy::Policy,
    storage::{JsonFileStore, TrainingSet},
    trainer::Trainer,
};

const USAGE: &str = "usage:
    digits predict <model.json> <input.json> [config.json]
    digits train <config.json>
    digits stats <store-dir>";

/// A drawing, either as a flat array or as a single row matrix.
#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["predict", model, input] => predict(model, input, None),
        ["predict", model, input, config] => predict(model, input, Some(*config)),
        ["train", config] => train(config),
        ["stats", dir] => stats(dir),
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    }
}

fn predict(model: &str, input: &str, config: Option<&str>) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => RecognizerConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path))?,
        None => RecognizerConfig::default(),
    };
    let mut loader = ModelLoader::from_config(&config);
    if let Err(e) = loader.load(model) {
        if !loader.has_fallback() {
            return Err(e.into());
        }
    }

    let s = fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?;
    let doc: Input = serde_json::from_str(&s)?;
    let input = match doc {
        Input::Flat(v) => v,
        Input::Nested(mut rows) if rows.len() == 1 => rows.remove(0),
        Input::Nested(rows) => bail!("Expected a single row, found {}", rows.len()),
    };

    let guess = loader.guess(&input)?;
    let prediction = guess.prediction();
    println!(
        "digit: {} confidence: {:.3}{}",
        prediction.digit,
        prediction.confidence,
        if guess.is_fallback() { " (fallback guess)" } else { "" }
    );
    for (digit, p) in prediction.probabilities.iter().enumerate() {
        println!("  {}: {:.4}", digit, p);
    }
    Ok(())
}

fn train(config: &str) -> anyhow::Result<()> {
    let config = RecognizerConfig::from_file(config)
        .with_context(|| format!("Failed to read config {}", config))?;
    let set = TrainingSet::open(JsonFileStore::new(&config.store_dir))?;
    let (examples, _) = set.into_inner();

    let network = LinearBuilder::new(config.input_size)
        .layers(config.hidden_sizes.iter().copied())
        .layer(config.output_size)
        .build(Policy::Sigmoid, Uniform::new(config.training.seed))?;
    info!("Built network with layer sizes {:?}", network.sizes());

    let mut trainer = Trainer::new(network, examples, config.training.clone())?;
    for progress in trainer.chunks() {
        println!(
            "epoch {}/{} loss: {:.6}",
            progress.epochs_done, progress.epochs_total, progress.loss
        );
    }

    let eval = trainer.test(trainer.examples())?;
    println!(
        "training set loss: {:.6} accuracy: {:.1}%",
        eval.loss,
        eval.accuracy * 100.
    );

    trainer
        .into_network()
        .save(&config.model_path)
        .with_context(|| format!("Failed to save model to {}", config.model_path.display()))?;
    info!("Model saved to {}", config.model_path.display());
    Ok(())
}

fn stats(dir: &str) -> anyhow::Result<()> {
    let set = TrainingSet::open(JsonFileStore::new(dir))?;
    println!("{} examples", set.len());
    for (digit, count) in set.counts(10).iter().enumerate() {
        println!("  {}: {}", digit, count);
    }
    Ok(())
}
