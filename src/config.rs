//! Configuration for ingestion, retrieval and benchmarking.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "https://api.deepseek.com")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Model name (e.g., "deepseek-chat")
    pub model: String,

    /// Maximum tokens for response
    pub max_tokens: u32,

    /// Temperature for benchmark answers and judging
    pub temperature: f32,

    /// Temperature for one-off questions asked from the CLI
    pub interactive_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.deepseek.com".to_string(),
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
            interactive_temperature: 0.3,
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Hugging Face model id of a sentence-transformers BERT model.
    pub model: String,
    /// Chunks embedded per batch during ingestion.
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            batch_size: 100,
        }
    }
}

/// Text splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Target maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Split separators in priority order. An empty string splits per character.
    pub separators: Vec<String>,
    /// Chunks must be strictly longer than this many characters to be indexed.
    pub min_chunk_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
            min_chunk_chars: 20,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the answer generator.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 20 }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root scanned recursively for source documents.
    pub source_dir: PathBuf,
    /// Directory holding the persisted vector index.
    pub index_dir: PathBuf,
    /// Benchmark question set (JSON array).
    pub questions: PathBuf,
    /// Benchmark result table, rewritten after every item.
    pub results: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data/documents"),
            index_dir: PathBuf::from("data/vector_index"),
            questions: PathBuf::from("benchmark/benchmark_data.json"),
            results: PathBuf::from("benchmark/benchmark_results.csv"),
        }
    }
}

/// Benchmark scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Minimum judge score counted as a pass.
    pub pass_threshold: u8,
    /// Maximum items to evaluate (for quick runs).
    pub max_items: Option<usize>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 3,
            max_items: None,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkConfig,
    pub retrieval: RetrievalConfig,
    pub paths: PathsConfig,
    pub benchmark: BenchmarkConfig,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_API_KEY, LLM_MODEL, INDEX_DIR, ...)
    /// 2. Config file ($MEVZUAT_RAG_CONFIG or ~/.config/mevzuat-rag/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from_file(&path)?,
            _ => Config::default(),
        };

        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;

        serde_yaml::from_str(&content)
            .map_err(|e| RagError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_base) = lookup("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Some(api_key) = lookup("LLM_API_KEY").or_else(|| lookup("DEEPSEEK_API_KEY")) {
            self.llm.api_key = api_key;
        }

        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Some(tokens) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.llm.max_tokens = tokens;
        }

        if let Some(temp) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.llm.temperature = temp;
        }

        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Some(dir) = lookup("SOURCE_DIR") {
            self.paths.source_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("INDEX_DIR") {
            self.paths.index_dir = PathBuf::from(dir);
        }

        if let Some(top_k) = lookup("TOP_K").and_then(|v| v.parse().ok()) {
            self.retrieval.top_k = top_k;
        }
    }

    /// Get the config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = env::var("MEVZUAT_RAG_CONFIG") {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("", "", "mevzuat-rag")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate structural invariants of the chunking, retrieval and scoring settings.
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(RagError::InvalidConfig(
                "chunking.chunk_size must be greater than zero".to_string(),
            ));
        }

        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }

        if chunking.separators.is_empty() {
            return Err(RagError::InvalidConfig(
                "chunking.separators must list at least one separator".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(RagError::InvalidConfig(
                "embedding.batch_size must be greater than zero".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(RagError::InvalidConfig(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }

        if !(1..=5).contains(&self.benchmark.pass_threshold) {
            return Err(RagError::InvalidConfig(format!(
                "benchmark.pass_threshold must be between 1 and 5, got {}",
                self.benchmark.pass_threshold
            )));
        }

        Ok(())
    }

    /// Validate that the chat model credentials are present.
    pub fn validate_llm(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(RagError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.api_key.is_empty() {
            return Err(RagError::Config(
                "LLM API key is required. Set LLM_API_KEY (or DEEPSEEK_API_KEY) environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(RagError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        Ok(())
    }
}
