//! Error taxonomy shared by the chunker, the vector index, and the retriever.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors raised by core operations.
///
/// Every core operation fails atomically: when one of these is returned the
/// receiver is in the same state it was before the call.
#[derive(Debug, Error)]
pub enum RagError {
    /// Chunk window that would never advance, or a zero-length window.
    #[error("invalid chunking configuration: max_length={max_length}, overlap={overlap}")]
    InvalidConfiguration { max_length: usize, overlap: usize },

    /// Index constructed with a non-positive dimension.
    #[error("invalid embedding dimension: {0}")]
    InvalidDimension(usize),

    /// Vector length (or vector/metadata count) disagrees with what the index expects.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted artifacts are missing, unreadable, or inconsistent, or a
    /// search hit does not resolve to a stored record.
    #[error("corrupt vector store: {0}")]
    CorruptStore(String),

    /// Metadata carries `doc_id`, `chunk_index`, or `chunk_id` in its open
    /// map, which would shadow the typed fields once persisted.
    #[error("reserved metadata key in extra fields: {0}")]
    ReservedMetadataKey(String),

    /// An external collaborator (embedding provider, extractor) failed.
    #[error("collaborator failure: {0:#}")]
    CollaboratorFailure(anyhow::Error),

    /// Filesystem error while writing a store.
    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RagError {
    pub(crate) fn corrupt(path: &Path, reason: impl std::fmt::Display) -> Self {
        RagError::CorruptStore(format!("{}: {}", path.display(), reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = RagError::DimensionMismatch {
            expected: 384,
            actual: 385,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 384, got 385");
    }

    #[test]
    fn test_collaborator_failure_keeps_chain() {
        let inner = anyhow::anyhow!("connection refused").context("OpenAI request failed");
        let err = RagError::CollaboratorFailure(inner);
        let msg = err.to_string();
        assert!(msg.contains("OpenAI request failed"));
        assert!(msg.contains("connection refused"));
    }
}
