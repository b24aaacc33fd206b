use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classification::domain::face_classifier::FaceClassifier;
use crate::recognition::domain::embedding::Embedding;
use crate::shared::constants::EMBEDDING_MODEL_VERSION;

const FORMAT_VERSION: u32 = 1;
const METRIC: &str = "euclidean";

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("cannot fit a classifier without samples")]
    Empty,
    #[error("n_neighbors must be between 1 and the number of samples ({samples}), got {k}")]
    InvalidNeighbors { k: usize, samples: usize },
    #[error("embedding has {found} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("unsupported classifier file: {0}")]
    UnsupportedFormat(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid classifier JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One training example: an actor label and a face embedding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledEmbedding {
    pub label: String,
    pub embedding: Embedding,
}

impl LabeledEmbedding {
    pub fn new(label: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            label: label.into(),
            embedding,
        }
    }
}

/// On-disk layout of a trained classifier.
#[derive(Serialize, Deserialize)]
struct ClassifierFile {
    format_version: u32,
    n_neighbors: usize,
    metric: String,
    embedding_model: String,
    samples: Vec<LabeledEmbedding>,
}

/// k-nearest-neighbor classifier over face embeddings.
///
/// Prediction takes the `k` training samples closest in Euclidean distance
/// and returns the label with the most votes (uniform weights). Vote ties
/// go to the lexicographically smallest label; distance ties keep training
/// order.
#[derive(Clone, Debug, PartialEq)]
pub struct KnnClassifier {
    n_neighbors: usize,
    embedding_model: String,
    dim: usize,
    samples: Vec<LabeledEmbedding>,
}

impl KnnClassifier {
    pub fn fit(samples: Vec<LabeledEmbedding>, n_neighbors: usize) -> Result<Self, ClassifierError> {
        let first = samples.first().ok_or(ClassifierError::Empty)?;
        let dim = first.embedding.dim();
        if let Some(bad) = samples.iter().find(|s| s.embedding.dim() != dim) {
            return Err(ClassifierError::DimensionMismatch {
                expected: dim,
                found: bad.embedding.dim(),
            });
        }
        if n_neighbors == 0 || n_neighbors > samples.len() {
            return Err(ClassifierError::InvalidNeighbors {
                k: n_neighbors,
                samples: samples.len(),
            });
        }
        Ok(Self {
            n_neighbors,
            embedding_model: EMBEDDING_MODEL_VERSION.to_string(),
            dim,
            samples,
        })
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Identifier of the model that produced the training embeddings.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Whether the training embeddings came from the embedder this build
    /// runs; distances across different embedders are meaningless.
    pub fn matches_current_embedder(&self) -> bool {
        self.embedding_model == EMBEDDING_MODEL_VERSION
    }

    pub fn classify(&self, embedding: &Embedding) -> Result<String, ClassifierError> {
        if embedding.dim() != self.dim {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.dim,
                found: embedding.dim(),
            });
        }

        let mut ranked: Vec<(f64, &str)> = self
            .samples
            .iter()
            .map(|s| (s.embedding.euclidean_distance(embedding), s.label.as_str()))
            .collect();
        // sort_by is stable: equal distances keep training order
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut votes: BTreeMap<&str, usize> = BTreeMap::new();
        for &(_, label) in ranked.iter().take(self.n_neighbors) {
            *votes.entry(label).or_default() += 1;
        }

        votes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(label, _)| label.to_string())
            .ok_or(ClassifierError::Empty)
    }

    pub fn save(&self, path: &Path) -> Result<(), ClassifierError> {
        let io_err = |source| ClassifierError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = ClassifierFile {
            format_version: FORMAT_VERSION,
            n_neighbors: self.n_neighbors,
            metric: METRIC.to_string(),
            embedding_model: self.embedding_model.clone(),
            samples: self.samples.clone(),
        };
        let json = serde_json::to_string(&file).map_err(|e| ClassifierError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let text = fs::read_to_string(path).map_err(|e| ClassifierError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: ClassifierFile =
            serde_json::from_str(&text).map_err(|e| ClassifierError::Json {
                path: path.to_path_buf(),
                source: e,
            })?;

        if file.format_version != FORMAT_VERSION {
            return Err(ClassifierError::UnsupportedFormat(format!(
                "format_version {} (expected {FORMAT_VERSION})",
                file.format_version
            )));
        }
        if file.metric != METRIC {
            return Err(ClassifierError::UnsupportedFormat(format!(
                "metric {:?} (expected {METRIC:?})",
                file.metric
            )));
        }

        let mut classifier = Self::fit(file.samples, file.n_neighbors)?;
        classifier.embedding_model = file.embedding_model;
        Ok(classifier)
    }
}

impl FaceClassifier for KnnClassifier {
    fn predict(&self, embedding: &Embedding) -> Result<String, Box<dyn std::error::Error>> {
        Ok(self.classify(embedding)?)
    }

    fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.samples.iter().map(|s| s.label.clone()).collect();
        labels.sort();
        labels.dedup();
        labels
    }
}
