//! taxolabel configuration module
//!
//! Config loading priority:
//! 1. CLI flags (applied by the caller on top of the loaded config)
//! 2. `.taxolabel.json` in the working directory
//! 3. Built-in defaults, which reproduce the original single-file run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{LabelError, Result};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = ".taxolabel.json";

/// Default companies table (rewritten in place)
pub const DEFAULT_COMPANIES_PATH: &str = "ml_insurance_challenge.csv";
/// Default taxonomy table
pub const DEFAULT_TAXONOMY_PATH: &str = "insurance_taxonomy - insurance_taxonomy.csv";

/// Similarity cutoff; a score equal to it is assigned
pub const DEFAULT_THRESHOLD: f32 = 0.32;

/// Default sentence-transformer for the fastembed backend (English, 384d).
/// The 0.32 threshold was tuned against this model's scores.
pub const DEFAULT_FASTEMBED_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default Model2Vec model ID (English, 256d)
pub const DEFAULT_MODEL2VEC_MODEL_ID: &str = "minishlab/potion-base-8M";

/// Which embedding runtime encodes the texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// ONNX sentence-transformers through fastembed
    #[default]
    FastEmbed,
    /// Static Model2Vec embeddings
    Model2Vec,
}

impl EmbeddingBackend {
    pub fn default_model_id(self) -> &'static str {
        match self {
            EmbeddingBackend::FastEmbed => DEFAULT_FASTEMBED_MODEL_ID,
            EmbeddingBackend::Model2Vec => DEFAULT_MODEL2VEC_MODEL_ID,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingBackend::FastEmbed => "fastembed",
            EmbeddingBackend::Model2Vec => "model2vec",
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingBackend {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fastembed" => Ok(EmbeddingBackend::FastEmbed),
            "model2vec" => Ok(EmbeddingBackend::Model2Vec),
            other => Err(LabelError::Config(format!(
                "unknown backend '{}' (expected fastembed or model2vec)",
                other
            ))),
        }
    }
}

pub const DEFAULT_BATCH_SIZE: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_companies_path")]
    pub companies_path: PathBuf,

    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: PathBuf,

    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Single-byte field delimiter for both tables
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Model to load; the backend's default when unset
    #[serde(default)]
    pub model_id: Option<String>,

    /// Model2Vec: local model directory, taking priority over `model_id`.
    /// fastembed: model cache directory.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fail on zero-norm embeddings instead of excluding them
    #[serde(default)]
    pub strict_vectors: bool,
}

fn default_companies_path() -> PathBuf {
    PathBuf::from(DEFAULT_COMPANIES_PATH)
}

fn default_taxonomy_path() -> PathBuf {
    PathBuf::from(DEFAULT_TAXONOMY_PATH)
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_delimiter() -> char {
    ','
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            companies_path: default_companies_path(),
            taxonomy_path: default_taxonomy_path(),
            threshold: DEFAULT_THRESHOLD,
            delimiter: default_delimiter(),
            backend: EmbeddingBackend::default(),
            model_id: None,
            model_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
            strict_vectors: false,
        }
    }
}

impl Config {
    /// Load `.taxolabel.json` from `dir`, falling back to defaults.
    ///
    /// A malformed file is reported and ignored rather than aborting the run.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load config, using defaults"
                );
                Self::default()
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LabelError::from_io(path, e))?;
        serde_json::from_str(&content).map_err(|e| LabelError::Config(e.to_string()))
    }

    /// Configured model ID, or the backend's default
    pub fn model_id(&self) -> &str {
        self.model_id
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model_id())
    }

    /// Delimiter as the byte the csv reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(LabelError::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )))
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(-1.0..=1.0).contains(&self.threshold) {
            return Err(LabelError::Config(format!(
                "threshold must be within [-1, 1], got {}",
                self.threshold
            )));
        }
        if self.batch_size == 0 {
            return Err(LabelError::Config("batch_size must be positive".to_string()));
        }
        self.delimiter_byte()?;
        Ok(())
    }
}
