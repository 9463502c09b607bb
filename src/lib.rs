//! Mevzuat RAG - retrieval-augmented question answering over university
//! regulation documents, with an LLM-judged benchmark.
//!
//! # Overview
//!
//! The pipeline has two halves:
//! 1. **Ingestion** (offline): documents are split into overlapping chunks,
//!    embedded with a local sentence-transformer and written to an on-disk
//!    vector index.
//! 2. **Evaluation** (online): for each benchmark question the top-k chunks
//!    are retrieved, an answer is generated from them, and a judge model
//!    scores the answer against a reference.
//!
//! # Quick Start
//!
//! ```no_run
//! use mevzuat_rag::{
//!     config::Config,
//!     embeddings::EmbeddingModel,
//!     eval::{BenchmarkRunner, load_questions},
//!     indexer::Indexer,
//!     llm::LlmClient,
//!     search::Retriever,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let embedder = EmbeddingModel::load(&config.embedding.model)?;
//!
//!     // Rebuild the index from the document tree
//!     let summary = Indexer::new(&embedder, &config).rebuild(
//!         &config.paths.source_dir,
//!         &config.paths.index_dir,
//!         |progress| println!("{}%", progress.percent()),
//!     )?;
//!     println!("{}", summary);
//!
//!     // Evaluate
//!     let retriever = Retriever::open(&config.paths.index_dir, &embedder)?;
//!     let client = LlmClient::new(config.llm.clone());
//!     let items = load_questions(&config.paths.questions)?;
//!
//!     let report = BenchmarkRunner::new(&retriever, &client, &client)
//!         .output(&config.paths.results)
//!         .run(&items)
//!         .await;
//!     report.print_summary();
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Chunker**: recursive separator-based splitting with overlap
//! - **Indexer**: full-rebuild ingestion into the vector store
//! - **Retriever**: cosine top-k search over the loaded index
//! - **AnswerGenerator**: grounded prompting with an error sentinel
//! - **Judge**: rubric scoring with a tolerant reply parser
//! - **BenchmarkRunner**: sequential evaluation with per-item snapshots

pub mod answer;
pub mod chunker;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod eval;
pub mod indexer;
pub mod llm;
pub mod search;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use answer::AnswerGenerator;
pub use chunker::{Chunk, Chunker};
pub use config::Config;
pub use document::Document;
pub use embeddings::{Embedder, EmbeddingModel};
pub use error::{RagError, Result};
pub use indexer::{Indexer, IngestionSummary};
pub use llm::{ChatModel, LlmClient};
pub use search::{Retriever, SearchHit};
pub use store::VectorIndex;
