//! Index statistics.
//!
//! Summarizes a persisted index: dimension, vector count, distinct papers,
//! and a per-paper chunk breakdown. Used by `prag stats` to confirm that a
//! build picked up what it should have.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use paper_rag_core::store::{FlatIndex, VectorIndex, METADATA_FILE, VECTORS_FILE};

/// Counts derived from an index's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub dim: usize,
    pub records: usize,
    /// Chunk count per document id, ordered by id.
    pub per_document: BTreeMap<String, usize>,
}

impl IndexStats {
    pub fn from_index(index: &FlatIndex) -> Self {
        let mut per_document = BTreeMap::new();
        for meta in index.metadata() {
            *per_document.entry(meta.doc_id).or_insert(0) += 1;
        }
        Self {
            dim: index.dim(),
            records: index.len(),
            per_document,
        }
    }

    pub fn documents(&self) -> usize {
        self.per_document.len()
    }
}

/// Restore the index in `index_dir` and print a summary.
pub fn run_stats(index_dir: &Path) -> Result<()> {
    let index = FlatIndex::restore(index_dir)
        .with_context(|| format!("Failed to load index from {}", index_dir.display()))?;
    let stats = IndexStats::from_index(&index);

    let size: u64 = [VECTORS_FILE, METADATA_FILE]
        .iter()
        .filter_map(|f| std::fs::metadata(index_dir.join(f)).ok())
        .map(|m| m.len())
        .sum();

    println!("Paper RAG: Index Stats");
    println!("======================");
    println!();
    println!("  Index:       {}", index_dir.display());
    println!("  Size:        {}", format_bytes(size));
    println!();
    println!("  Dimension:   {}", stats.dim);
    println!("  Vectors:     {}", stats.records);
    println!("  Documents:   {}", stats.documents());

    if !stats.per_document.is_empty() {
        println!();
        println!("  By document:");
        println!("  {:<32} {:>8}", "DOC ID", "CHUNKS");
        println!("  {}", "-".repeat(41));
        for (doc_id, chunks) in &stats.per_document {
            println!("  {:<32} {:>8}", doc_id, chunks);
        }
    }
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_rag_core::models::Metadata;

    #[test]
    fn test_stats_counts_distinct_documents() {
        let index = FlatIndex::new(2).unwrap();
        index
            .add(
                vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
                vec![
                    Metadata::new("b", 0),
                    Metadata::new("a", 0),
                    Metadata::new("b", 1),
                ],
            )
            .unwrap();

        let stats = IndexStats::from_index(&index);
        assert_eq!(stats.dim, 2);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.documents(), 2);
        assert_eq!(stats.per_document.get("b"), Some(&2));
        assert_eq!(stats.per_document.keys().next().map(String::as_str), Some("a"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_missing_index_fails() {
        assert!(run_stats(Path::new("/nonexistent/index")).is_err());
    }
}
