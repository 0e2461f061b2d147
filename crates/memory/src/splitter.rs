//! Recursive character text splitting for ingestion.
//!
//! Text is split on the first separator that occurs in it (paragraphs, then
//! lines, then words, then characters). Pieces shorter than the chunk size
//! are merged greedily, carrying up to `chunk_overlap` characters of the
//! previous chunk into the next. Pieces that are still too long are split
//! again with the remaining separators.

use agentloom_core::embedding::Document;
use tracing::warn;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into chunks of at most `chunk_size` characters where the
/// separators allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(100, 1)
    }
}

impl TextSplitter {
    /// A zero chunk size is raised to 1; an overlap that is not smaller than
    /// the chunk size is clamped below it.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let clamped = chunk_overlap.min(chunk_size - 1);
        if clamped != chunk_overlap {
            warn!(chunk_size, chunk_overlap, "Chunk overlap clamped to {clamped}");
        }
        Self {
            chunk_size,
            chunk_overlap: clamped,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    /// Split every document, copying its metadata onto each chunk.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .map(|chunk| Document::new(chunk).with_metadata(doc.metadata.clone()))
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, rest) = pick_separator(text, separators);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|piece| !piece.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if rest.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, rest));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if !current.is_empty() && total + len + sep_len > self.chunk_size {
                if let Some(chunk) = join(&current, separator) {
                    chunks.push(chunk);
                }
                while total > self.chunk_overlap
                    || (!current.is_empty() && total + len + sep_len > self.chunk_size)
                {
                    let first_len = char_len(current[0]) + if current.len() > 1 { sep_len } else { 0 };
                    total -= first_len;
                    current.remove(0);
                }
            }

            current.push(piece.as_str());
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }

        if let Some(chunk) = join(&current, separator) {
            chunks.push(chunk);
        }
        chunks
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (*separator, &[]);
        }
        if text.contains(separator) {
            return (*separator, &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn join(pieces: &[&str], separator: &str) -> Option<String> {
    let joined = pieces.join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
