//! Error types for ingestion, retrieval and evaluation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur across the pipeline.
#[derive(Error, Debug)]
pub enum RagError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A source document could not be read or decoded.
    #[error("Failed to load document '{path}': {reason}")]
    DocumentLoad { path: PathBuf, reason: String },

    /// The corpus directory does not exist or is not a directory.
    #[error("Corpus path '{0}' does not exist or is not a directory")]
    InvalidCorpusPath(PathBuf),

    /// No eligible documents found in the corpus.
    #[error("No eligible documents found in corpus at '{0}'")]
    EmptyCorpus(PathBuf),

    /// The persisted index was built with a different embedding model.
    #[error("Index at '{path}' was built with '{found}', expected '{expected}'")]
    IndexMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Embedding model failure (download, tokenization or inference).
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The benchmark question set is malformed.
    #[error("Invalid question set: {0}")]
    Dataset(String),
}

impl RagError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a document load error with path context.
    pub fn document_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DocumentLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for RagError {
    fn from(err: serde_json::Error) -> Self {
        RagError::LlmParse(err.to_string())
    }
}

impl From<candle_core::Error> for RagError {
    fn from(err: candle_core::Error) -> Self {
        RagError::Embedding(err.to_string())
    }
}
