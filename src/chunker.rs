//! Recursive character splitting with overlap.
//!
//! Text is split on the highest-priority separator present in it. Pieces
//! below the target size are merged back greedily into chunks; pieces that
//! are still too large are split again with the next separator. When a chunk
//! is emitted, its trailing pieces (up to the overlap budget) seed the next
//! chunk. Lengths are measured in characters, not bytes.

use crate::config::ChunkConfig;
use crate::document::Document;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A bounded segment of document text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Chunk {
    /// Chunk text content.
    pub text: String,
    /// Path of the source document.
    pub source: String,
    /// 1-indexed page the chunk was cut from.
    pub page: usize,
    /// Position of the chunk within its document.
    pub position: usize,
}

impl Chunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits documents into overlapping chunks and drops low-quality fragments.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    min_chunk_chars: usize,
}

impl Chunker {
    /// Create a chunker from configuration.
    pub fn new(config: &ChunkConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators: config.separators.clone(),
            min_chunk_chars: config.min_chunk_chars,
        }
    }

    /// Chunk every page of a document, numbering chunks across pages.
    ///
    /// The quality filter is not applied here; see [`Chunker::passes_quality`].
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let source = document.path.display().to_string();

        document
            .pages
            .iter()
            .filter(|page| page.has_text())
            .flat_map(|page| {
                self.split_text(&page.content)
                    .into_iter()
                    .map(move |text| (page.number, text))
            })
            .enumerate()
            .map(|(position, (page, text))| Chunk {
                text,
                source: source.clone(),
                page,
                position,
            })
            .collect()
    }

    /// Whether a chunk is long enough to be worth indexing.
    pub fn passes_quality(&self, chunk: &Chunk) -> bool {
        !chunk.text.trim().is_empty() && chunk.char_len() > self.min_chunk_chars
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge_pieces(&fitting));
                fitting.clear();
            }

            if finer.is_empty() {
                // Nothing left to split on; the piece stays oversized.
                if let Some(text) = trimmed(piece) {
                    chunks.push(text);
                }
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge_pieces(&fitting));
        }

        chunks
    }

    /// Greedily merge small pieces into chunks of at most `chunk_size`
    /// characters, carrying up to `chunk_overlap` characters forward.
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(text) = join_window(&window) {
                    chunks.push(text);
                }

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if let Some(text) = join_window(&window) {
            chunks.push(text);
        }

        chunks
    }
}

/// Split on `separator`, attaching each separator to the piece that follows
/// it. An empty separator splits into single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;

    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

fn join_window(window: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    trimmed(&joined)
}

fn trimmed(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
