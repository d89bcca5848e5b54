//! Index build stage: chunk files → embedded, persisted flat index.
//!
//! Loads every `*.json` chunk file, lays the chunks out through the
//! metadata [`Ledger`], embeds them batch by batch, and writes the index
//! directory. Nothing is written unless every batch embeds successfully, so
//! a failed build leaves any previous index untouched.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

use paper_rag_core::ledger::{ChunkedDocument, Ledger};
use paper_rag_core::store::{FlatIndex, VectorIndex};

use crate::chunk::read_chunk_file;
use crate::embedding::EmbeddingProvider;
use crate::extract::{file_stem, list_files_with_extension};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub vectors: usize,
    pub dim: usize,
}

/// Load every chunk file in `chunks_dir`.
///
/// A file without an `id` field takes its file stem as document id. The
/// file path is kept as the document source.
pub fn load_chunk_files(chunks_dir: &Path) -> Result<Vec<ChunkedDocument>> {
    let files = list_files_with_extension(chunks_dir, "json")?;
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let mut file = read_chunk_file(&path)?;
        let doc_id = file.id.take().unwrap_or_else(|| file_stem(&path));
        let chunks = file.into_chunks(&doc_id);
        let mut document = ChunkedDocument::from_chunks(&doc_id, chunks);
        document.source = Some(path.display().to_string());
        documents.push(document);
    }
    Ok(documents)
}

/// Build and persist an index over all chunks in `chunks_dir`.
pub async fn build_index(
    chunks_dir: &Path,
    index_dir: &Path,
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
    progress: &dyn ProgressReporter,
) -> Result<IndexReport> {
    if batch_size == 0 {
        bail!("batch size must be > 0");
    }

    let documents = load_chunk_files(chunks_dir)?;
    let doc_count = documents.len();
    let ledger = Ledger::build(documents);
    if ledger.is_empty() {
        bail!(
            "No chunks found in {}. Run `prag chunk` first.",
            chunks_dir.display()
        );
    }

    let (texts, metadata) = ledger.into_parts();
    let total = texts.len();
    let mut vectors = Vec::with_capacity(total);

    for batch in texts.chunks(batch_size) {
        let embedded = provider
            .embed(batch)
            .await
            .with_context(|| format!("Embedding failed ({})", provider.model_name()))?;
        vectors.extend(embedded);
        progress.report(ProgressEvent::advanced("embed", vectors.len(), total));
    }

    let index = FlatIndex::new(provider.dims())?;
    index.add(vectors, metadata)?;
    index.persist(index_dir)?;

    info!(
        documents = doc_count,
        vectors = index.len(),
        dim = index.dim(),
        path = %index_dir.display(),
        "index written"
    );

    Ok(IndexReport {
        documents: doc_count,
        vectors: index.len(),
        dim: index.dim(),
    })
}
