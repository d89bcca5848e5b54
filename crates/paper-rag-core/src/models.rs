//! Core data models shared by the chunking, indexing, and retrieval stages.

use serde::{Deserialize, Serialize};

/// Keys owned by the typed fields of [`Metadata`]. `chunk_id` is the
/// on-disk alias of `chunk_index`.
pub const RESERVED_KEYS: [&str; 3] = ["doc_id", "chunk_index", "chunk_id"];

/// A bounded slice of one document's token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_index: usize,
    pub text: String,
}

/// Per-vector metadata stored alongside each indexed embedding.
///
/// `doc_id` and `chunk_index` are always present. Anything else the
/// pipeline wants to carry (the chunk text for prompt building, a
/// back-reference to the chunk file) travels in `extra` and is persisted
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub doc_id: String,
    #[serde(alias = "chunk_id")]
    pub chunk_index: usize,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Metadata {
    pub fn new(doc_id: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            doc_id: doc_id.into(),
            chunk_index,
            extra: serde_json::Map::new(),
        }
    }

    /// Attach an extra key, replacing any previous value.
    ///
    /// Reserved keys update the typed field instead: `doc_id` takes a
    /// string, `chunk_index`/`chunk_id` a non-negative integer. A reserved
    /// key with a value of the wrong type is dropped.
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let value = value.into();
        match key {
            "doc_id" => {
                if let Some(doc_id) = value.as_str() {
                    self.doc_id = doc_id.to_string();
                }
            }
            "chunk_index" | "chunk_id" => {
                if let Some(index) = value.as_u64().and_then(|n| usize::try_from(n).ok()) {
                    self.chunk_index = index;
                }
            }
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
        self
    }

    /// First reserved key found in `extra`, if any.
    pub fn reserved_extra_key(&self) -> Option<&str> {
        RESERVED_KEYS
            .iter()
            .copied()
            .find(|key| self.extra.contains_key(*key))
    }

    /// String-valued extra field, if present.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    /// The chunk text, when the ledger recorded it.
    pub fn text(&self) -> Option<&str> {
        self.get_str("text")
    }
}

/// A scored match from a search call. Lower distance is more similar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub distance: f32,
    pub metadata: Metadata,
}
