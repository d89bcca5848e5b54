//! Query-time retrieval: embed the query, search the index.
//!
//! [`Retriever`] is a pure composition point. It does no caching,
//! re-ranking, or query rewriting; results come back exactly as the index
//! ordered them.
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use paper_rag_core::embedding::EmbeddingProvider;
//! # use paper_rag_core::retriever::Retriever;
//! # use paper_rag_core::store::{FlatIndex, VectorIndex};
//! # async fn demo(provider: Arc<dyn EmbeddingProvider>) -> paper_rag_core::Result<()> {
//! let index = Arc::new(FlatIndex::restore("data/index".as_ref())?);
//! let retriever = Retriever::new(provider, index)?;
//! for hit in retriever.retrieve("what is attention?", 5).await? {
//!     println!("{:.4} {}#{}", hit.distance, hit.metadata.doc_id, hit.metadata.chunk_index);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::embedding::{embed_one, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::models::QueryResult;
use crate::store::VectorIndex;

/// Couples an injected embedding provider with a vector index.
pub struct Retriever<P: ?Sized, I: ?Sized> {
    provider: Arc<P>,
    index: Arc<I>,
}

impl<P, I> Retriever<P, I>
where
    P: EmbeddingProvider + ?Sized,
    I: VectorIndex + ?Sized,
{
    /// Fails with [`RagError::DimensionMismatch`] when the provider's output
    /// dimension differs from the index dimension.
    pub fn new(provider: Arc<P>, index: Arc<I>) -> Result<Self> {
        if provider.dims() != index.dim() {
            return Err(RagError::DimensionMismatch {
                expected: index.dim(),
                actual: provider.dims(),
            });
        }
        Ok(Self { provider, index })
    }

    /// Return the `k` indexed chunks closest to `query`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<QueryResult>> {
        let vector = embed_one(self.provider.as_ref(), query)
            .await
            .map_err(into_rag_error)?;
        let results = self.index.search(&vector, k)?;
        debug!(
            model = self.provider.model_name(),
            k,
            hits = results.len(),
            "retrieved chunks"
        );
        Ok(results)
    }
}

/// Pass core errors raised inside a provider through untouched; wrap the rest.
fn into_rag_error(err: anyhow::Error) -> RagError {
    err.downcast::<RagError>()
        .unwrap_or_else(RagError::CollaboratorFailure)
}
