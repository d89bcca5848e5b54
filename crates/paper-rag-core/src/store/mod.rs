//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is the contract the retriever and the index
//! build stage program against: append vectors with aligned metadata, run
//! nearest-neighbor queries, and persist to or restore from a directory.
//! [`FlatIndex`] is the exact brute-force implementation; approximate
//! strategies would be further implementations of the same trait.
//!
//! # Persisted layout
//!
//! An index directory holds two artifacts that are always written and read
//! together:
//!
//! | File | Content |
//! |------|---------|
//! | [`VECTORS_FILE`] | binary header (magic, version, dim, count, SHA-256 of the metadata artifact) + little-endian `f32` rows |
//! | [`METADATA_FILE`] | pretty-printed JSON array, one [`Metadata`] per row |

pub mod flat;

use std::path::Path;

use crate::error::Result;
use crate::models::{Metadata, QueryResult};

pub use flat::FlatIndex;

/// File name of the binary vector artifact inside an index directory.
pub const VECTORS_FILE: &str = "index.vec";
/// File name of the JSON metadata artifact inside an index directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Append-only vector store with aligned per-vector metadata.
///
/// # Concurrency
///
/// Implementations take `&self` and synchronize internally. A call to
/// [`add`](VectorIndex::add) is one critical section covering vectors and
/// metadata together, so concurrent [`search`](VectorIndex::search) calls
/// see either the state before or after it. Multiple writers are not
/// coordinated beyond that: callers that append from several tasks must
/// serialize those appends themselves if they need a particular order.
/// [`persist`](VectorIndex::persist) excludes `add` for its whole duration.
pub trait VectorIndex: Send + Sync {
    /// Dimension every stored vector has.
    fn dim(&self) -> usize;

    /// Number of stored records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `vectors[i]` with `metadata[i]` for every `i`, in order.
    ///
    /// Fails with [`DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// without storing anything if the two slices differ in length or any
    /// vector is not exactly [`dim`](VectorIndex::dim) long.
    fn add(&self, vectors: Vec<Vec<f32>>, metadata: Vec<Metadata>) -> Result<()>;

    /// Return up to `k` nearest records, closest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>>;

    /// Write both artifacts into `dir`, creating it if needed.
    fn persist(&self, dir: &Path) -> Result<()>;

    /// Load an index previously written by [`persist`](VectorIndex::persist).
    fn restore(dir: &Path) -> Result<Self>
    where
        Self: Sized;
}
