//! Chunk stage: extracted text files → per-document chunk files.
//!
//! Reads every `*.txt` in the text directory, normalizes and splits it with
//! the word-window chunker from `paper_rag_core::chunk`, and writes
//! `{stem}.json` containing `{"id": stem, "chunks": [...]}`. Documents that
//! produce no chunks are still written, with an empty list, so the chunk
//! directory mirrors the text directory one-to-one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub use paper_rag_core::chunk::{chunk_document, normalize_text, ChunkParams};
use paper_rag_core::models::Chunk;

use crate::config::ChunkingConfig;
use crate::extract::{file_stem, list_files_with_extension};
use crate::progress::{ProgressEvent, ProgressReporter};

/// On-disk form of one document's chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFile {
    /// Document id. May be absent in hand-written files; the loader then
    /// falls back to the file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub chunks: Vec<String>,
}

impl ChunkFile {
    /// Chunk file for one document, chunks in `chunk_index` order.
    pub fn from_chunks(doc_id: String, mut chunks: Vec<Chunk>) -> Self {
        chunks.sort_by_key(|c| c.chunk_index);
        Self {
            id: Some(doc_id),
            chunks: chunks.into_iter().map(|c| c.text).collect(),
        }
    }

    /// Chunks of the document `doc_id`, indexed by position in the file.
    pub fn into_chunks(self, doc_id: &str) -> Vec<Chunk> {
        self.chunks
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                doc_id: doc_id.to_string(),
                chunk_index,
                text,
            })
            .collect()
    }
}

/// Outcome of [`chunk_texts`].
#[derive(Debug, Default)]
pub struct ChunkReport {
    pub documents: usize,
    pub chunks: usize,
    /// Stems of documents that produced zero chunks.
    pub empty: Vec<String>,
}

/// Chunk every text file in `text_dir` into `chunks_dir`.
///
/// Fails before writing anything if the chunking parameters are invalid.
pub fn chunk_texts(
    text_dir: &Path,
    chunks_dir: &Path,
    chunking: &ChunkingConfig,
    progress: &dyn ProgressReporter,
) -> Result<ChunkReport> {
    let params = chunking.params();
    params.stride()?;

    fs::create_dir_all(chunks_dir)
        .with_context(|| format!("Failed to create {}", chunks_dir.display()))?;

    let texts = list_files_with_extension(text_dir, "txt")?;
    let total = texts.len();
    let mut report = ChunkReport::default();

    for (i, path) in texts.iter().enumerate() {
        let stem = file_stem(path);
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let chunks = chunk_document(&stem, &normalize_text(&raw), params)?;
        debug!(doc = %stem, chunks = chunks.len(), "chunked");

        if chunks.is_empty() {
            progress.report(ProgressEvent::skipped("chunk", &stem, "no text"));
            report.empty.push(stem.clone());
        }
        report.documents += 1;
        report.chunks += chunks.len();

        write_chunk_file(
            &chunks_dir.join(format!("{}.json", stem)),
            &ChunkFile::from_chunks(stem, chunks),
        )?;
        progress.report(ProgressEvent::advanced("chunk", i + 1, total));
    }

    info!(
        documents = report.documents,
        chunks = report.chunks,
        "chunked documents"
    );
    Ok(report)
}

/// Write one chunk file as pretty JSON.
pub fn write_chunk_file(path: &Path, file: &ChunkFile) -> Result<()> {
    let json = serde_json::to_string_pretty(file)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Read one chunk file.
pub fn read_chunk_file(path: &Path) -> Result<ChunkFile> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid chunk file {}", path.display()))
}
