//! Error taxonomy for the labeling pipeline
//!
//! Every stage returns `LabelError`; nothing is recovered locally, the first
//! failure aborts the run.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the loader, embedder, assigner and writer
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{} is missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("embedding failed ({model}): {message}")]
    Embedding { model: String, message: String },

    /// Zero or non-finite norm vector hit while `strict_vectors` is on
    #[error("degenerate {kind} embedding at index {index} (zero or non-finite norm)")]
    DegenerateVector { kind: &'static str, index: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LabelError {
    /// Map an I/O error, folding `NotFound` into its own variant
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            LabelError::NotFound { path }
        } else {
            LabelError::Io { path, source }
        }
    }

    /// Map a csv error; I/O failures stay I/O, everything else is a parse error
    pub fn from_csv(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        let path = path.into();
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(source) => Self::from_io(path, source),
                other => LabelError::Parse {
                    path,
                    message: format!("{:?}", other),
                },
            }
        } else {
            LabelError::Parse {
                path,
                message: err.to_string(),
            }
        }
    }

    /// True for the parse-class failures (malformed text, missing columns)
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            LabelError::Parse { .. } | LabelError::MissingColumn { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
