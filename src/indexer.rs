//! Ingestion: rebuild the vector index from the source document tree.
//!
//! Every run is a full rebuild:
//! 1. Delete the previous index (best effort; failure is logged)
//! 2. Discover eligible documents recursively
//! 3. Load, chunk and quality-filter them, skipping unreadable files
//! 4. Embed chunks in fixed-size batches, appending each batch to a new index
//! 5. Publish the manifest

use crate::chunker::{Chunk, Chunker};
use crate::config::Config;
use crate::document::{Document, discover_documents};
use crate::embeddings::Embedder;
use crate::error::{RagError, Result};
use crate::store::{IndexEntry, IndexWriter, remove_index};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Counts describing one ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub files_found: usize,
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub chunks_created: usize,
    pub chunks_dropped: usize,
    pub chunks_indexed: usize,
    /// Whether a previous index was deleted.
    pub replaced_previous: bool,
}

impl fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files found, {} loaded, {} skipped; {} chunks created, {} dropped by the quality filter, {} indexed",
            self.files_found,
            self.files_loaded,
            self.files_skipped,
            self.chunks_created,
            self.chunks_dropped,
            self.chunks_indexed
        )
    }
}

/// Progress of the embedding phase, reported after every batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub embedded: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Completed share in whole percent, capped at 100.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            (self.embedded * 100 / self.total).min(100)
        }
    }
}

/// Builds the vector index.
pub struct Indexer<'a, E: Embedder> {
    embedder: &'a E,
    chunker: Chunker,
    batch_size: usize,
}

impl<'a, E: Embedder> Indexer<'a, E> {
    /// Create an indexer from configuration.
    pub fn new(embedder: &'a E, config: &Config) -> Self {
        Self {
            embedder,
            chunker: Chunker::new(&config.chunking),
            batch_size: config.embedding.batch_size.max(1),
        }
    }

    /// Rebuild the index at `index_dir` from documents under `source_dir`.
    ///
    /// Fails with [`RagError::EmptyCorpus`] when no eligible document yields
    /// a usable chunk; the index is then left absent.
    pub fn rebuild(
        &self,
        source_dir: &Path,
        index_dir: &Path,
        mut on_batch: impl FnMut(BatchProgress),
    ) -> Result<IngestionSummary> {
        let mut summary = IngestionSummary::default();

        match remove_index(index_dir) {
            Ok(true) => {
                info!("Removed previous index at {}", index_dir.display());
                summary.replaced_previous = true;
            }
            Ok(false) => {}
            Err(e) => warn!("Could not remove previous index, proceeding anyway: {}", e),
        }

        let files = discover_documents(source_dir)?;
        summary.files_found = files.len();
        if files.is_empty() {
            return Err(RagError::EmptyCorpus(source_dir.to_path_buf()));
        }
        info!("Found {} documents under {}", files.len(), source_dir.display());

        let mut chunks: Vec<Chunk> = Vec::new();
        for path in &files {
            let document = match Document::load(path) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    summary.files_skipped += 1;
                    continue;
                }
            };

            if !document.has_text() {
                warn!("Skipping {}: no extractable text", path.display());
                summary.files_skipped += 1;
                continue;
            }

            summary.files_loaded += 1;
            let produced = self.chunker.chunk_document(&document);
            let produced_count = produced.len();
            let kept: Vec<Chunk> = produced
                .into_iter()
                .filter(|chunk| self.chunker.passes_quality(chunk))
                .collect();

            summary.chunks_created += produced_count;
            summary.chunks_dropped += produced_count - kept.len();
            chunks.extend(kept);
        }

        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus(source_dir.to_path_buf()));
        }

        let mut writer =
            IndexWriter::create(index_dir, self.embedder.model_id(), self.embedder.dimension())?;

        let total = chunks.len();
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;

            let entries: Vec<IndexEntry> = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
                .collect();
            writer.append(&entries)?;

            on_batch(BatchProgress {
                embedded: writer.len(),
                total,
            });
        }

        let manifest = writer.finish()?;
        summary.chunks_indexed = manifest.entry_count;
        info!("Ingestion finished: {}", summary);

        Ok(summary)
    }
}
