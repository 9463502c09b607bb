//! On-disk vector index.
//!
//! An index directory holds two files:
//! - `entries.bin`: a stream of bincode-encoded [`IndexEntry`] values,
//!   appended batch by batch during ingestion.
//! - `manifest.json`: model id, dimension and entry count, written last.
//!
//! A directory without a manifest is treated as no index at all, so a crashed
//! ingestion never leaves something that looks ready.

use crate::chunker::Chunk;
use crate::error::{RagError, Result};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Filename of the entry stream.
pub const ENTRIES_FILENAME: &str = "entries.bin";

/// Filename of the manifest.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// A chunk and its embedding.
#[derive(Debug, Clone, Encode, Decode)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Metadata describing a complete index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Embedding model the vectors were produced with.
    pub embedding_model: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Number of entries in `entries.bin`.
    pub entry_count: usize,
}

impl Manifest {
    /// Read the manifest of the index at `dir`, if one exists.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| RagError::io(&path, e))?;
        let manifest = serde_json::from_str(&content)
            .map_err(|e| RagError::Serialization(format!("{}: {}", path.display(), e)))?;
        Ok(Some(manifest))
    }
}

/// Delete the index at `dir`. Returns `false` when there was nothing to delete.
pub fn remove_index(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(dir).map_err(|e| RagError::io(dir, e))?;
    Ok(true)
}

/// Writes a fresh index, one batch at a time.
pub struct IndexWriter {
    dir: PathBuf,
    writer: BufWriter<File>,
    embedding_model: String,
    dimension: usize,
    entry_count: usize,
}

impl IndexWriter {
    /// Start a new index at `dir`, truncating any entry stream left there.
    pub fn create(dir: &Path, embedding_model: &str, dimension: usize) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| RagError::io(dir, e))?;

        let manifest_path = dir.join(MANIFEST_FILENAME);
        if manifest_path.exists() {
            fs::remove_file(&manifest_path).map_err(|e| RagError::io(&manifest_path, e))?;
        }

        let entries_path = dir.join(ENTRIES_FILENAME);
        let file = File::create(&entries_path).map_err(|e| RagError::io(&entries_path, e))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            writer: BufWriter::new(file),
            embedding_model: embedding_model.to_string(),
            dimension,
            entry_count: 0,
        })
    }

    /// Append a batch of entries.
    pub fn append(&mut self, entries: &[IndexEntry]) -> Result<()> {
        let config = bincode::config::standard();

        for entry in entries {
            if entry.embedding.len() != self.dimension {
                return Err(RagError::Embedding(format!(
                    "expected {} dimensions, got {}",
                    self.dimension,
                    entry.embedding.len()
                )));
            }

            bincode::encode_into_std_write(entry, &mut self.writer, config)
                .map_err(|e| RagError::Serialization(e.to_string()))?;
        }

        self.entry_count += entries.len();
        Ok(())
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.entry_count
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Flush the entry stream and publish the manifest.
    pub fn finish(mut self) -> Result<Manifest> {
        let entries_path = self.dir.join(ENTRIES_FILENAME);
        self.writer
            .flush()
            .map_err(|e| RagError::io(&entries_path, e))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| RagError::io(&entries_path, e))?;

        let manifest = Manifest {
            embedding_model: self.embedding_model,
            dimension: self.dimension,
            entry_count: self.entry_count,
        };

        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| RagError::Serialization(e.to_string()))?;
        write_atomic(&self.dir.join(MANIFEST_FILENAME), |file| {
            file.write_all(&json)
                .map_err(|e| RagError::io(&self.dir, e))
        })?;

        Ok(manifest)
    }
}

/// A fully loaded index, held in memory for brute-force search.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: Manifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index directly from entries (no disk involved).
    pub fn from_entries(embedding_model: &str, dimension: usize, entries: Vec<IndexEntry>) -> Self {
        Self {
            manifest: Manifest {
                embedding_model: embedding_model.to_string(),
                dimension,
                entry_count: entries.len(),
            },
            entries,
        }
    }

    /// Load the index at `dir`. Returns `None` when no complete index exists.
    pub fn open(dir: &Path) -> Result<Option<Self>> {
        let Some(manifest) = Manifest::read(dir)? else {
            return Ok(None);
        };

        let entries_path = dir.join(ENTRIES_FILENAME);
        let file = File::open(&entries_path).map_err(|e| RagError::io(&entries_path, e))?;
        let mut reader = BufReader::new(file);
        let config = bincode::config::standard();

        let mut entries = Vec::with_capacity(manifest.entry_count);
        for _ in 0..manifest.entry_count {
            let entry: IndexEntry = bincode::decode_from_std_read(&mut reader, config)
                .map_err(|e| {
                    RagError::Serialization(format!("{}: {}", entries_path.display(), e))
                })?;
            entries.push(entry);
        }

        Ok(Some(Self { manifest, entries }))
    }

    /// Index metadata.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace `path` with the output of `write`, never exposing a partial file.
///
/// The content is written to a temporary file in the same directory and
/// renamed over the target.
pub(crate) fn write_atomic(
    path: &Path,
    write: impl FnOnce(&mut File) -> Result<()>,
) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| RagError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| RagError::io(parent, e))?;
    write(tmp.as_file_mut())?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| RagError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| RagError::io(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(text: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: Chunk {
                text: text.to_string(),
                source: "data/yonetmelik.pdf".to_string(),
                page: 1,
                position: 0,
            },
            embedding,
        }
    }

    fn write_index(dir: &Path, count: usize) -> Manifest {
        let mut writer = IndexWriter::create(dir, "test/model", 2).unwrap();
        for i in 0..count {
            writer
                .append(&[entry(&format!("parça {}", i), vec![i as f32, 1.0])])
                .unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_write_and_open() {
        let dir = TempDir::new().unwrap();
        let index_dir = dir.path().join("index");

        let manifest = write_index(&index_dir, 3);
        assert_eq!(manifest.entry_count, 3);

        let index = VectorIndex::open(&index_dir).unwrap().unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.manifest(), &manifest);
        assert_eq!(index.entries()[2].chunk.text, "parça 2");
        assert_eq!(index.entries()[2].embedding, vec![2.0, 1.0]);
    }

    #[test]
    fn test_open_missing_index_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(VectorIndex::open(&dir.path().join("absent")).unwrap().is_none());
    }

    #[test]
    fn test_unfinished_index_is_none() {
        let dir = TempDir::new().unwrap();
        let mut writer = IndexWriter::create(dir.path(), "test/model", 2).unwrap();
        writer.append(&[entry("yarım", vec![1.0, 0.0])]).unwrap();
        drop(writer);

        assert!(VectorIndex::open(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_rebuild_replaces_previous_entries() {
        let dir = TempDir::new().unwrap();
        let index_dir = dir.path().join("index");

        write_index(&index_dir, 5);
        assert!(remove_index(&index_dir).unwrap());
        write_index(&index_dir, 2);

        let index = VectorIndex::open(&index_dir).unwrap().unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_remove_missing_index() {
        let dir = TempDir::new().unwrap();
        assert!(!remove_index(&dir.path().join("absent")).unwrap());
    }

    #[test]
    fn test_append_rejects_wrong_dimension() {
        let dir = TempDir::new().unwrap();
        let mut writer = IndexWriter::create(dir.path(), "test/model", 2).unwrap();
        let result = writer.append(&[entry("bozuk", vec![1.0, 2.0, 3.0])]);
        assert!(matches!(result, Err(RagError::Embedding(_))));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.txt");

        write_atomic(&path, |f| f.write_all(b"ilk").map_err(|e| RagError::io("t", e))).unwrap();
        write_atomic(&path, |f| f.write_all(b"ikinci").map_err(|e| RagError::io("t", e))).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ikinci");
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
