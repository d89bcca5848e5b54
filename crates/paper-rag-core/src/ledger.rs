//! Metadata ledger: aligns chunk texts with per-vector metadata.
//!
//! The index build stage embeds a flat list of texts and appends the
//! resulting vectors together with a metadata list. Position `i` in the
//! index must describe text `i`, so both lists are produced here in a single
//! pass over documents sorted by id.

use crate::models::{Chunk, Metadata};

/// One document's chunks, as loaded from the chunk stage.
#[derive(Debug, Clone)]
pub struct ChunkedDocument {
    pub doc_id: String,
    /// Where the chunks were read from; recorded as `source_file`.
    pub source: Option<String>,
    pub chunks: Vec<String>,
}

impl ChunkedDocument {
    /// Group [`Chunk`]s of a single document back into a document.
    ///
    /// Chunks are ordered by `chunk_index`.
    pub fn from_chunks(doc_id: &str, mut chunks: Vec<Chunk>) -> Self {
        chunks.sort_by_key(|c| c.chunk_index);
        Self {
            doc_id: doc_id.to_string(),
            source: None,
            chunks: chunks.into_iter().map(|c| c.text).collect(),
        }
    }
}

/// Parallel `(text, metadata)` batches ready for embedding and `add`.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub texts: Vec<String>,
    pub metadata: Vec<Metadata>,
}

impl Ledger {
    /// Build the ledger from a batch of documents.
    ///
    /// Documents are processed in lexical order of `doc_id` regardless of
    /// input order. Each metadata entry carries `doc_id`, `chunk_index`,
    /// the chunk `text`, and `source_file` when the document has a source.
    pub fn build(mut documents: Vec<ChunkedDocument>) -> Self {
        documents.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));

        let total = documents.iter().map(|d| d.chunks.len()).sum();
        let mut ledger = Ledger {
            texts: Vec::with_capacity(total),
            metadata: Vec::with_capacity(total),
        };

        for doc in documents {
            for (chunk_index, text) in doc.chunks.into_iter().enumerate() {
                let mut meta = Metadata::new(doc.doc_id.clone(), chunk_index);
                if let Some(source) = &doc.source {
                    meta = meta.with("source_file", source.as_str());
                }
                meta = meta.with("text", text.as_str());
                ledger.texts.push(text);
                ledger.metadata.push(meta);
            }
        }
        ledger
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Split into `(texts, metadata)` for the embed + add steps.
    pub fn into_parts(self) -> (Vec<String>, Vec<Metadata>) {
        (self.texts, self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, chunks: &[&str]) -> ChunkedDocument {
        ChunkedDocument {
            doc_id: id.to_string(),
            source: Some(format!("chunks/{}.json", id)),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_documents_sorted_by_id() {
        let ledger = Ledger::build(vec![
            doc("2402.00002", &["b0", "b1"]),
            doc("1706.03762", &["a0"]),
            doc("2310.12345", &["c0"]),
        ]);
        let ids: Vec<&str> = ledger.metadata.iter().map(|m| m.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["1706.03762", "2310.12345", "2402.00002", "2402.00002"]);
        assert_eq!(ledger.texts, vec!["a0", "c0", "b0", "b1"]);
    }

    #[test]
    fn test_texts_and_metadata_aligned() {
        let ledger = Ledger::build(vec![doc("b", &["x", "y", "z"]), doc("a", &["p", "q"])]);
        assert_eq!(ledger.len(), 5);
        for (text, meta) in ledger.texts.iter().zip(ledger.metadata.iter()) {
            assert_eq!(meta.text(), Some(text.as_str()));
        }
        let positions: Vec<usize> = ledger.metadata.iter().map(|m| m.chunk_index).collect();
        assert_eq!(positions, vec![0, 1, 0, 1, 2]);
        assert_eq!(ledger.metadata[2].get_str("source_file"), Some("chunks/b.json"));
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let a = Ledger::build(vec![doc("x", &["1"]), doc("y", &["2"])]);
        let b = Ledger::build(vec![doc("y", &["2"]), doc("x", &["1"])]);
        assert_eq!(a.texts, b.texts);
        assert_eq!(a.metadata, b.metadata);
    }

    #[test]
    fn test_empty_documents_contribute_nothing() {
        let ledger = Ledger::build(vec![doc("a", &[]), doc("b", &["only"])]);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.metadata[0].doc_id, "b");
        assert_eq!(ledger.metadata[0].chunk_index, 0);
    }

    #[test]
    fn test_from_chunks_orders_by_index() {
        let chunks = vec![
            Chunk {
                doc_id: "d".into(),
                chunk_index: 1,
                text: "second".into(),
            },
            Chunk {
                doc_id: "d".into(),
                chunk_index: 0,
                text: "first".into(),
            },
        ];
        let doc = ChunkedDocument::from_chunks("d", chunks);
        assert_eq!(doc.chunks, vec!["first", "second"]);
    }
}
