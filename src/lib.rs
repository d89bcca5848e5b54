//! # Paper RAG
//!
//! Retrieval-augmented question answering over arXiv papers.
//!
//! Papers flow through a staged pipeline, each stage reading the previous
//! stage's directory. The query side restores the persisted index and pairs
//! it with the same embedding provider that built it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌───────────────┐
//! │ download │──▶│  parse  │──▶│  chunk  │──▶│ index (embed) │
//! │ raw/*.pdf│   │text/*.txt│  │chunks/*.json│ index.vec+json│
//! └──────────┘   └─────────┘   └─────────┘   └───────┬───────┘
//!                                                    │ restore
//!                                     ┌──────────────┤
//!                                     ▼              ▼
//!                                ┌─────────┐    ┌─────────┐
//!                                │ search  │    │   ask   │
//!                                └─────────┘    └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! prag download 1706.03762 2005.11401
//! prag parse
//! prag chunk
//! prag index
//! prag search "how is attention computed?"
//! prag ask "what does retrieval add to generation?"
//! ```
//!
//! The chunker, vector index, metadata ledger, and retriever live in the
//! `paper_rag_core` crate; this crate adds the I/O stages around them.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`download`] | arXiv PDF download |
//! | [`extract`] | PDF text extraction |
//! | [`chunk`] | Chunk stage over extracted text |
//! | [`embedding`] | Embedding providers |
//! | [`index_cmd`] | Index build stage |
//! | [`search`] | Search and ask commands |
//! | [`generate`] | Answer generation |
//! | [`stats`] | Index statistics |
//! | [`progress`] | Stage progress reporting |
//! | [`http`] | JSON-over-HTTP with retry |

pub mod chunk;
pub mod config;
pub mod download;
pub mod embedding;
pub mod extract;
pub mod generate;
pub mod http;
pub mod index_cmd;
pub mod progress;
pub mod search;
pub mod stats;
