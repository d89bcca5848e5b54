//! Query commands: `prag search` and `prag ask`.
//!
//! Both restore the persisted index, pair it with the configured embedding
//! provider in a [`Retriever`], and fetch the `k` closest chunks. `search`
//! prints them; `ask` hands them to the [`Generator`].

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::sync::Arc;

use paper_rag_core::models::QueryResult;
use paper_rag_core::retriever::Retriever;
use paper_rag_core::store::{FlatIndex, VectorIndex};

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::generate::Generator;

/// Longest excerpt printed per hit, in characters.
const EXCERPT_CHARS: usize = 240;

/// JSON form of one hit for `search --json`.
#[derive(Debug, Serialize)]
pub struct SearchHit<'a> {
    pub rank: usize,
    pub distance: f32,
    pub doc_id: &'a str,
    pub chunk_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

impl<'a> SearchHit<'a> {
    fn new(rank: usize, result: &'a QueryResult) -> Self {
        Self {
            rank,
            distance: result.distance,
            doc_id: &result.metadata.doc_id,
            chunk_index: result.metadata.chunk_index,
            source_file: result.metadata.get_str("source_file"),
            text: result.metadata.text(),
        }
    }
}

/// Open the index and the provider configured for it.
pub fn open_retriever(
    config: &Config,
) -> Result<Retriever<dyn EmbeddingProvider, FlatIndex>> {
    if !config.embedding.is_enabled() {
        bail!("Search requires embeddings. Set [embedding] provider in config.");
    }
    let index_dir = &config.paths.index_dir;
    let index = FlatIndex::restore(index_dir)
        .with_context(|| format!("Failed to load index from {}", index_dir.display()))?;
    let provider = embedding::create_provider(&config.embedding)?;
    Ok(Retriever::new(provider, Arc::new(index))?)
}

pub async fn run_search(config: &Config, query: &str, k: Option<usize>, json: bool) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let k = k.unwrap_or(config.retrieval.k);
    let retriever = open_retriever(config)?;
    let results = retriever.retrieve(query, k).await?;

    if json {
        let hits: Vec<SearchHit> = results
            .iter()
            .enumerate()
            .map(|(i, r)| SearchHit::new(i + 1, r))
            .collect();
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let meta = &result.metadata;
        println!(
            "{}. [{:.4}] {} #{}",
            i + 1,
            result.distance,
            meta.doc_id,
            meta.chunk_index
        );
        if let Some(source) = meta.get_str("source_file") {
            println!("    source: {}", source);
        }
        if let Some(text) = meta.text() {
            println!("    excerpt: \"{}\"", excerpt(text, EXCERPT_CHARS));
        }
        println!();
    }
    Ok(())
}

pub async fn run_ask(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Question must not be empty");
    }

    let k = k.unwrap_or(config.retrieval.k);
    let generator = Generator::new(&config.generation)?;
    let retriever = open_retriever(config)?;
    let results = retriever.retrieve(query, k).await?;

    let answer = generator.generate(query, &results).await?;
    println!("{}", answer);
    println!();
    println!("Sources:");
    for result in &results {
        println!(
            "  - {} #{} ({:.4})",
            result.metadata.doc_id, result.metadata.chunk_index, result.distance
        );
    }
    Ok(())
}

/// First `max_chars` characters of `text` on a single line.
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat.to_string(),
    }
}
