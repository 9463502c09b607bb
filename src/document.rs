//! Source document loading.
//!
//! Documents are represented as a collection of pages. PDFs keep their
//! physical pages; plain text files are treated as a single page.

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions accepted as source documents.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// A single page in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number.
    pub number: usize,
    /// Text content of the page.
    pub content: String,
}

impl Page {
    /// Create a new page.
    pub fn new(number: usize, content: String) -> Self {
        Self { number, content }
    }

    /// Whether the page carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// A loaded source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document name (file stem).
    pub name: String,
    /// Original file path.
    pub path: PathBuf,
    /// Pages in the document.
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new document with given name and pages.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, pages: Vec<Page>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            pages,
        }
    }

    /// Create a single-page document from raw text.
    pub fn from_text(path: impl Into<PathBuf>, content: String) -> Self {
        let path = path.into();
        let name = document_name(&path);
        Self::new(name, path, vec![Page::new(1, content)])
    }

    /// Load a document, choosing the reader by file extension.
    pub fn load(path: &Path) -> Result<Self> {
        match extension_of(path).as_deref() {
            Some("pdf") => Self::from_pdf_file(path),
            Some("txt") | Some("md") => Self::from_text_file(path),
            other => Err(RagError::document_load(
                path,
                format!("unsupported extension {:?}", other.unwrap_or("")),
            )),
        }
    }

    /// Load a text file as a single-page document.
    pub fn from_text_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
        Ok(Self::from_text(path, content))
    }

    /// Load a PDF, one page per physical page.
    ///
    /// The extractor panics on some malformed files; that is reported as a
    /// load failure like any other.
    pub fn from_pdf_file(path: &Path) -> Result<Self> {
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_by_pages(path))
            .map_err(|_| RagError::document_load(path, "PDF extractor panicked"))?
            .map_err(|e| RagError::document_load(path, e.to_string()))?;

        if extracted.is_empty() {
            return Err(RagError::document_load(path, "PDF has no pages"));
        }

        let pages = extracted
            .into_iter()
            .enumerate()
            .map(|(i, content)| Page::new(i + 1, content))
            .collect();

        Ok(Self::new(document_name(path), path, pages))
    }

    /// Get total number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether any page carries text.
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(Page::has_text)
    }
}

/// Recursively list eligible source files under `root`, sorted by path.
pub fn discover_documents(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(RagError::InvalidCorpusPath(root.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable directory entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported(path))
        .collect();

    files.sort();
    Ok(files)
}

/// Whether the file extension is one we can load.
pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn document_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}
