//! # Paper RAG Core
//!
//! Pure retrieval logic for Paper RAG: data models, the word-window
//! chunker, the vector index abstraction with its exact flat
//! implementation, the metadata ledger that aligns chunks with vectors,
//! and the retriever that ties an embedding provider to an index.
//!
//! This crate performs no network I/O. The only filesystem access is the
//! index persistence in [`store::flat`]. Embedding backends, document
//! download, PDF extraction, and answer generation live in the
//! `paper-rag` app crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod ledger;
pub mod models;
pub mod retriever;
pub mod store;

pub use error::{RagError, Result};
