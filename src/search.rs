//! Top-k similarity search over the vector index.

use crate::chunker::Chunk;
use crate::embeddings::{Embedder, cosine_similarity};
use crate::error::{RagError, Result};
use crate::store::VectorIndex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A retrieved chunk and its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity (higher is closer).
    pub score: f32,
}

/// Answers similarity queries against a loaded index.
///
/// The embedder must be the model the index was built with; [`Retriever::open`]
/// enforces this from the manifest.
pub struct Retriever<'a, E: Embedder> {
    index: VectorIndex,
    embedder: &'a E,
}

impl<'a, E: Embedder> Retriever<'a, E> {
    /// Wrap an already loaded index.
    pub fn new(index: VectorIndex, embedder: &'a E) -> Self {
        Self { index, embedder }
    }

    /// Load the index at `dir`.
    ///
    /// A missing index yields a retriever that returns no hits.
    pub fn open(dir: &Path, embedder: &'a E) -> Result<Self> {
        let Some(index) = VectorIndex::open(dir)? else {
            tracing::warn!(
                "No index at {}; searches will return nothing. Run ingestion first.",
                dir.display()
            );
            return Ok(Self::new(
                VectorIndex::from_entries(embedder.model_id(), embedder.dimension(), Vec::new()),
                embedder,
            ));
        };

        let manifest = index.manifest();
        if manifest.embedding_model != embedder.model_id() {
            return Err(RagError::IndexMismatch {
                path: dir.to_path_buf(),
                expected: embedder.model_id().to_string(),
                found: manifest.embedding_model.clone(),
            });
        }

        if manifest.dimension != embedder.dimension() {
            return Err(RagError::IndexMismatch {
                path: dir.to_path_buf(),
                expected: format!("{} dimensions", embedder.dimension()),
                found: format!("{} dimensions", manifest.dimension),
            });
        }

        tracing::info!("Loaded index with {} chunks from {}", index.len(), dir.display());
        Ok(Self::new(index, embedder))
    }

    /// Number of chunks available for search.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Return up to `k` chunks ordered by decreasing similarity to `query`.
    ///
    /// Equal scores keep index order, so repeated calls return the same sequence.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query)?;

        let mut hits: Vec<SearchHit> = self
            .index
            .entries()
            .iter()
            .map(|entry| SearchHit {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);

        Ok(hits)
    }
}
