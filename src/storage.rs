use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Key under which the training examples are persisted.
pub const STORAGE_KEY: &str = "digitTrainingData";

/// A single labelled drawing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Example {
    #[serde(serialize_with = "serialize_row", deserialize_with = "deserialize_row")]
    pub input: Vec<f64>,
    #[serde(serialize_with = "serialize_row", deserialize_with = "deserialize_row")]
    pub target: Vec<f64>,
}

impl Example {
    pub fn new(input: Vec<f64>, target: Vec<f64>) -> Self {
        Self { input, target }
    }

    /// Creates an example whose target is the one-hot encoding of `digit` among `classes` classes.
    pub fn labelled(input: Vec<f64>, digit: usize, classes: usize) -> Self {
        assert!(digit < classes, "Digit {} is out of range", digit);
        let mut target = vec![0.; classes];
        target[digit] = 1.;
        Self { input, target }
    }

    /// Index of the hot entry of the target.
    pub fn label(&self) -> Option<usize> {
        crate::classify::arg_max(&self.target)
    }
}

/// Vectors are stored as single row matrices, `[[...]]`. Flat arrays are accepted as well.
#[derive(Deserialize)]
#[serde(untagged)]
enum Row {
    Nested(Vec<Vec<f64>>),
    Flat(Vec<f64>),
}

fn serialize_row<S>(row: &[f64], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    [row].serialize(s)
}

fn deserialize_row<'de, D>(d: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Row::deserialize(d)? {
        Row::Flat(row) => Ok(row),
        // `[]` parses as an empty matrix, read it as an empty row.
        Row::Nested(rows) if rows.is_empty() => Ok(Vec::new()),
        Row::Nested(mut rows) => {
            if rows.len() == 1 {
                Ok(rows.remove(0))
            } else {
                Err(<D::Error as serde::de::Error>::custom(format!(
                    "expected a single row, received {}",
                    rows.len()
                )))
            }
        }
    }
}

/// Somewhere the collected training examples are kept between sessions.
pub trait ExampleStore {
    fn load(&self) -> Result<Vec<Example>, StoreError>;
    fn save(&mut self, examples: &[Example]) -> Result<(), StoreError>;
}

/// Keeps the examples in memory only.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    examples: Vec<Example>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl ExampleStore for MemoryStore {
    fn load(&self) -> Result<Vec<Example>, StoreError> {
        Ok(self.examples.clone())
    }

    fn save(&mut self, examples: &[Example]) -> Result<(), StoreError> {
        self.examples = examples.to_vec();
        Ok(())
    }
}

/// Stores the examples as a JSON array in `<dir>/digitTrainingData.json`.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", STORAGE_KEY)),
        }
    }

    /// Store using an exact file path instead of the well known name.
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExampleStore for JsonFileStore {
    /// A missing file is an empty collection.
    fn load(&self) -> Result<Vec<Example>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling file first and renames it over the target, so a failed write
    /// never leaves a truncated collection behind.
    fn save(&mut self, examples: &[Example]) -> Result<(), StoreError> {
        let json = serde_json::to_string(examples)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// The ordered collection of training examples, written through to a store on every change.
#[derive(Debug)]
pub struct TrainingSet<S: ExampleStore> {
    examples: Vec<Example>,
    store: S,
}

impl<S: ExampleStore> TrainingSet<S> {
    /// Reads the examples already present in `store`.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let examples = store.load()?;
        log::info!("Loaded {} training examples", examples.len());
        Ok(Self { examples, store })
    }

    /// Appends an example and persists the whole collection.
    /// If the store can't be written the collection is left as it was.
    pub fn push(&mut self, example: Example) -> Result<(), StoreError> {
        let mut next = self.examples.clone();
        next.push(example);
        self.store.save(&next)?;
        self.examples = next;
        Ok(())
    }

    /// Removes every example, in memory and in the store.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.save(&[])?;
        self.examples.clear();
        Ok(())
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Number of examples per label, indexed by digit.
    pub fn counts(&self, classes: usize) -> Vec<usize> {
        let mut counts = vec![0; classes];
        for label in self.examples.iter().filter_map(Example::label) {
            if label < classes {
                counts[label] += 1;
            }
        }
        counts
    }

    pub fn into_inner(self) -> (Vec<Example>, S) {
        (self.examples, self.store)
    }
}

/// Error encountered when reading or writing stored examples.
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl error::Error for StoreError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Parse(e) => Some(e),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Could not access stored examples: {}", e),
            StoreError::Parse(e) => write!(f, "Stored examples are malformed: {}", e),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Parse(e)
    }
}
