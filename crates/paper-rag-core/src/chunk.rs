//! Word-window text chunker.
//!
//! Splits cleaned document text into overlapping windows of whitespace
//! tokens. Chunks are rebuilt by joining tokens with a single space, so the
//! original inter-token formatting is not preserved.
//!
//! # Algorithm
//!
//! 1. Split the text on whitespace into tokens.
//! 2. Emit tokens `[start, min(start + max_length, N))` as one chunk.
//! 3. Stop if that window reached the last token, otherwise advance
//!    `start` by `max_length - overlap` and repeat.
//!
//! A configuration whose window would never advance is rejected up front
//! with [`RagError::InvalidConfiguration`].
//!
//! # Example
//!
//! ```rust
//! use paper_rag_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("a b c d e", 3, 1).unwrap();
//! assert_eq!(chunks, vec!["a b c", "c d e"]);
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{RagError, Result};
use crate::models::Chunk;

/// Default window length in tokens.
pub const DEFAULT_MAX_LENGTH: usize = 800;
/// Default overlap between consecutive windows, in tokens.
pub const DEFAULT_OVERLAP: usize = 100;

/// Window parameters for [`chunk_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub max_length: usize,
    pub overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkParams {
    /// Number of tokens the window advances per step.
    ///
    /// Fails when the window would not move forward.
    pub fn stride(&self) -> Result<usize> {
        if self.max_length == 0 || self.overlap >= self.max_length {
            return Err(RagError::InvalidConfiguration {
                max_length: self.max_length,
                overlap: self.overlap,
            });
        }
        Ok(self.max_length - self.overlap)
    }
}

/// Clean raw extracted text before chunking.
///
/// Collapses newline runs, then every whitespace run to one space, removes
/// `arXiv:<id>` identifiers left by PDF headers, and trims the result.
pub fn normalize_text(text: &str) -> String {
    static NEWLINES: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    static PAPER_ID: OnceLock<Regex> = OnceLock::new();

    let newlines = NEWLINES.get_or_init(|| Regex::new(r"\n+").expect("valid regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let paper_id = PAPER_ID.get_or_init(|| Regex::new(r"arXiv:\s*\S+").expect("valid regex"));

    let text = newlines.replace_all(text, "\n");
    let text = whitespace.replace_all(&text, " ");
    let text = paper_id.replace_all(&text, "");
    text.trim().to_string()
}

/// Split text into overlapping windows of at most `max_length` tokens.
///
/// Returns an empty vector for text without tokens. The final window may be
/// shorter than `max_length`.
pub fn chunk_text(text: &str, max_length: usize, overlap: usize) -> Result<Vec<String>> {
    let stride = ChunkParams {
        max_length,
        overlap,
    }
    .stride()?;

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + max_length).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += stride;
    }

    Ok(chunks)
}

/// Chunk one document's text into [`Chunk`]s with contiguous indices.
pub fn chunk_document(doc_id: &str, text: &str, params: ChunkParams) -> Result<Vec<Chunk>> {
    let chunks = chunk_text(text, params.max_length, params.overlap)?;
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| Chunk {
            doc_id: doc_id.to_string(),
            chunk_index,
            text,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 800, 100).unwrap().is_empty());
        assert!(chunk_text("   \n\t ", 800, 100).unwrap().is_empty());
    }

    #[test]
    fn test_exact_window_single_chunk() {
        let chunks = chunk_text(&numbered_words(800), 800, 100).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_1700_tokens_three_windows() {
        let chunks = chunk_text(&numbered_words(1700), 800, 100).unwrap();
        assert_eq!(chunks.len(), 3);
        let second: Vec<&str> = chunks[1].split(' ').collect();
        assert_eq!(second.first(), Some(&"w700"));
        assert_eq!(second.last(), Some(&"w1499"));
        let third: Vec<&str> = chunks[2].split(' ').collect();
        assert_eq!(third.first(), Some(&"w1400"));
        assert_eq!(third.last(), Some(&"w1699"));
        assert_eq!(third.len(), 300);
        assert!(chunks.iter().all(|c| c.split(' ').count() <= 800));
    }

    #[test]
    fn test_overlap_equal_to_length_rejected() {
        let err = chunk_text("a b c", 100, 100).unwrap_err();
        assert!(matches!(
            err,
            RagError::InvalidConfiguration {
                max_length: 100,
                overlap: 100
            }
        ));
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            chunk_text("a b c", 0, 0),
            Err(RagError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected_on_empty_text() {
        assert!(chunk_text("", 5, 9).is_err());
    }

    #[test]
    fn test_coverage_and_exact_overlap() {
        for n in [1usize, 2, 9, 10, 11, 37, 100] {
            for (max_length, overlap) in [(10usize, 0usize), (10, 3), (4, 3), (1, 0)] {
                let text = numbered_words(n);
                let chunks = chunk_text(&text, max_length, overlap).unwrap();
                let windows: Vec<Vec<usize>> = chunks
                    .iter()
                    .map(|c| {
                        c.split(' ')
                            .map(|w| w[1..].parse::<usize>().unwrap())
                            .collect()
                    })
                    .collect();

                let mut covered = vec![false; n];
                for w in &windows {
                    assert!(w.len() <= max_length);
                    for &i in w {
                        covered[i] = true;
                    }
                }
                assert!(covered.iter().all(|c| *c), "n={} ml={} ov={}", n, max_length, overlap);

                for pair in windows.windows(2) {
                    let (prev, next) = (&pair[0], &pair[1]);
                    let shared = prev.iter().filter(|i| next.contains(i)).count();
                    assert_eq!(shared, overlap.min(next.len()));
                }
                assert_eq!(windows.last().and_then(|w| w.last()), Some(&(n - 1)));
            }
        }
    }

    #[test]
    fn test_tokens_rejoined_with_single_space() {
        let chunks = chunk_text("alpha\n\n  beta\tgamma", 10, 0).unwrap();
        assert_eq!(chunks, vec!["alpha beta gamma"]);
    }

    #[test]
    fn test_chunk_document_indices_contiguous() {
        let chunks = chunk_document(
            "doc1",
            &numbered_words(50),
            ChunkParams {
                max_length: 10,
                overlap: 2,
            },
        )
        .unwrap();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
            assert_eq!(c.doc_id, "doc1");
        }
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        let raw = "  Attention\n\n\nis all\t\tyou   need \n";
        assert_eq!(normalize_text(raw), "Attention is all you need");
    }

    #[test]
    fn test_normalize_strips_paper_ids() {
        let raw = "arXiv:1706.03762v5 [cs.CL] 6 Dec 2017\nAttention arXiv: 2402.06782 works";
        assert_eq!(normalize_text(raw), "[cs.CL] 6 Dec 2017 Attention  works");
    }

    #[test]
    fn test_normalize_deterministic() {
        let raw = "A\n\nB  arXiv:1234.5678 C";
        assert_eq!(normalize_text(raw), normalize_text(raw));
    }
}
