//! # Paper RAG CLI (`prag`)
//!
//! The `prag` binary drives the paper pipeline stage by stage and answers
//! questions against the resulting index.
//!
//! ## Usage
//!
//! ```bash
//! prag --config ./config/prag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `prag download <ids..>` | Fetch arXiv PDFs into the raw directory |
//! | `prag parse` | Extract text from every downloaded PDF |
//! | `prag chunk` | Split extracted text into overlapping word windows |
//! | `prag index` | Embed all chunks and write the vector index |
//! | `prag search "<query>"` | Print the closest chunks |
//! | `prag ask "<question>"` | Answer a question from the closest chunks |
//! | `prag stats` | Summarize the persisted index |
//!
//! Diagnostics go to stderr through `tracing`; set `RUST_LOG` or pass
//! `--verbose` to see more.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use paper_rag::config::{self, Config};
use paper_rag::progress::ProgressMode;
use paper_rag::{chunk, download, embedding, extract, index_cmd, search, stats};

const DEFAULT_CONFIG: &str = "./config/prag.toml";

/// Paper RAG: retrieval-augmented question answering over arXiv papers.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/prag.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "prag",
    about = "Paper RAG: retrieval-augmented question answering over arXiv papers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/prag.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Progress output on stderr. Defaults to `human` on a terminal.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Download papers by arXiv id.
    ///
    /// Failed ids are reported and skipped; the rest still download.
    Download {
        /// arXiv ids, e.g. `1706.03762`.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Extract text from downloaded PDFs.
    Parse,

    /// Chunk extracted text into overlapping word windows.
    Chunk,

    /// Embed every chunk and write the vector index.
    ///
    /// Replaces any existing index only after all chunks embed successfully.
    Index {
        /// Override the batch size from config (number of texts per call).
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Search the index for the chunks closest to a query.
    Search {
        /// The search query string.
        query: String,

        /// Number of results (defaults to `retrieval.k`).
        #[arg(short, long)]
        k: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from retrieved chunks. Requires `HF_API_KEY`.
    Ask {
        /// The question.
        query: String,

        /// Number of chunks to retrieve (defaults to `retrieval.k`).
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Show index statistics.
    Stats,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => config::load_config(p),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => {
            debug!("no config file, using defaults");
            Ok(Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = resolve_config(cli.config.as_deref())?;
    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Download { ids } => {
            let report =
                download::download_papers(&ids, &cfg.paths.raw_dir, &cfg.download, progress.as_ref())
                    .await?;
            println!("download");
            println!("  downloaded: {}", report.downloaded.len());
            println!("  failed: {}", report.failed.len());
            for (id, reason) in &report.failed {
                println!("    {}: {}", id, reason);
            }
        }
        Commands::Parse => {
            let report = extract::batch_parse_pdfs(
                &cfg.paths.raw_dir,
                &cfg.paths.text_dir,
                progress.as_ref(),
            )?;
            println!("parse");
            println!("  parsed: {}", report.written.len());
            println!("  empty: {}", report.empty.len());
        }
        Commands::Chunk => {
            let report = chunk::chunk_texts(
                &cfg.paths.text_dir,
                &cfg.paths.chunks_dir,
                &cfg.chunking,
                progress.as_ref(),
            )?;
            println!("chunk");
            println!("  documents: {}", report.documents);
            println!("  chunks: {}", report.chunks);
            println!("  empty: {}", report.empty.len());
        }
        Commands::Index { batch_size } => {
            if !cfg.embedding.is_enabled() {
                anyhow::bail!("Embedding provider is disabled. Set [embedding] provider in config.");
            }
            let provider = embedding::create_provider(&cfg.embedding)?;
            let report = index_cmd::build_index(
                &cfg.paths.chunks_dir,
                &cfg.paths.index_dir,
                provider.as_ref(),
                batch_size.unwrap_or(cfg.embedding.batch_size),
                progress.as_ref(),
            )
            .await?;
            println!("index");
            println!("  documents: {}", report.documents);
            println!("  vectors: {}", report.vectors);
            println!("  dim: {}", report.dim);
        }
        Commands::Search { query, k, json } => {
            search::run_search(&cfg, &query, k, json).await?;
        }
        Commands::Ask { query, k } => {
            search::run_ask(&cfg, &query, k).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg.paths.index_dir)?;
        }
    }

    Ok(())
}
