//! # Synapse CLI (`synapse`)
//!
//! The `synapse` binary drives the whole pipeline: database initialization,
//! document ingestion, semantic search, corpus statistics, and the HTTP
//! server.
//!
//! ## Usage
//!
//! ```bash
//! synapse --config ./config/synapse.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `synapse init` | Create the SQLite database and schema |
//! | `synapse ingest <path>` | Ingest a single document |
//! | `synapse sync` | Ingest every supported document in the documents folder |
//! | `synapse search "<query>"` | Semantic search over ingested chunks |
//! | `synapse stats` | Show corpus statistics |
//! | `synapse serve` | Start the JSON HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! synapse init --config ./config/synapse.toml
//!
//! # Ingest one file with an explicit topic
//! synapse ingest ./docs/q3_report.pdf --topic Report
//!
//! # Ingest the whole documents folder
//! synapse sync
//!
//! # Search, filtered to one project
//! synapse search "influencer campaign budget" --project "Project X"
//!
//! # Start the HTTP server
//! synapse serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use synapse::config;
use synapse::embedding;
use synapse::ingest;
use synapse::search;
use synapse::server;
use synapse::store::{DocumentStore, SqliteStore};

/// Synapse CLI — a document-to-searchable-chunk pipeline for marketing
/// content.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/synapse.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "synapse",
    about = "Synapse — a document ingestion and semantic search pipeline",
    version,
    long_about = "Synapse ingests PDF, DOCX, text, and Markdown documents, chunks and embeds \
    them, classifies each document into a topic and project, and exposes semantic search via \
    a CLI and a JSON HTTP server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/synapse.toml`. Database, chunking, embedding,
    /// search, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/synapse.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents table with its
    /// indexes. This command is idempotent — running it multiple times is
    /// safe.
    Init,

    /// Ingest a single document.
    ///
    /// Extracts text, classifies the document, chunks it, generates
    /// embeddings, and writes all chunks in one batch.
    Ingest {
        /// Path to the document (`.pdf`, `.docx`, `.txt`, or `.md`).
        path: PathBuf,

        /// Override the classified topic.
        #[arg(long)]
        topic: Option<String>,

        /// Override the classified project.
        #[arg(long)]
        project: Option<String>,
    },

    /// Ingest every supported document in the documents folder.
    ///
    /// Files that fail to ingest are logged and skipped; the run continues
    /// with the remaining documents.
    Sync {
        /// Override the `[documents].folder` setting.
        #[arg(long)]
        folder: Option<PathBuf>,
    },

    /// Semantic search over ingested chunks.
    ///
    /// Prints results grouped by source file, best match first.
    Search {
        /// The search query string.
        query: String,

        /// Minimum similarity in [0, 1]. Defaults to `[search].default_threshold`.
        #[arg(long)]
        threshold: Option<f64>,

        /// Maximum number of chunk results. Defaults to `[search].default_count`.
        #[arg(long)]
        count: Option<usize>,

        /// Only return chunks with this exact topic.
        #[arg(long)]
        topic: Option<String>,

        /// Only return chunks with this exact project.
        #[arg(long)]
        project: Option<String>,
    },

    /// Show corpus statistics.
    Stats,

    /// Start the JSON HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// search API.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("synapse=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = SqliteStore::connect(&cfg.db.path).await?;
            store.migrate().await?;
            store.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            path,
            topic,
            project,
        } => {
            let store = SqliteStore::connect(&cfg.db.path).await?;
            let embedder = embedding::create_provider(&cfg.embedding)?;
            let outcome = ingest::ingest_document(
                &store,
                embedder.as_ref(),
                &path,
                cfg.chunking.size,
                cfg.chunking.overlap,
                topic,
                project,
            )
            .await?;
            println!(
                "Ingested {} ({} chunks, topic: {}, project: {})",
                path.display(),
                outcome.chunks_created,
                outcome.topic.as_deref().unwrap_or("-"),
                outcome.project.as_deref().unwrap_or("-"),
            );
            store.close().await;
        }
        Commands::Sync { folder } => {
            let store = SqliteStore::connect(&cfg.db.path).await?;
            let embedder = embedding::create_provider(&cfg.embedding)?;
            let folder = folder.unwrap_or_else(|| cfg.documents.folder.clone());
            let summary = ingest::run_ingest(
                &store,
                embedder.as_ref(),
                &folder,
                cfg.chunking.size,
                cfg.chunking.overlap,
            )
            .await?;
            println!(
                "Sync complete: {} ingested, {} failed, {} chunks created",
                summary.documents_ingested, summary.documents_failed, summary.chunks_created,
            );
            store.close().await;
        }
        Commands::Search {
            query,
            threshold,
            count,
            topic,
            project,
        } => {
            let store = SqliteStore::connect(&cfg.db.path).await?;
            let embedder = embedding::create_provider(&cfg.embedding)?;
            let response = search::run_search(
                &store,
                embedder.as_ref(),
                &query,
                threshold.unwrap_or(cfg.search.default_threshold),
                count.unwrap_or(cfg.search.default_count),
                topic.as_deref(),
                project.as_deref(),
            )
            .await?;
            print_search_response(&response);
            store.close().await;
        }
        Commands::Stats => {
            let store = SqliteStore::connect(&cfg.db.path).await?;
            let stats = store.stats().await?;
            println!(
                "{} chunks across {} files",
                stats.total_chunks, stats.total_files
            );
            if !stats.topics.is_empty() {
                println!("Topics:   {}", stats.topics.join(", "));
            }
            if !stats.projects.is_empty() {
                println!("Projects: {}", stats.projects.join(", "));
            }
            for file in &stats.files {
                println!("  {}", file);
            }
            store.close().await;
        }
        Commands::Serve => {
            let store = Arc::new(SqliteStore::connect(&cfg.db.path).await?);
            let embedder: Arc<dyn embedding::EmbeddingProvider> =
                Arc::from(embedding::create_provider(&cfg.embedding)?);
            server::run_server(Arc::new(cfg), store, embedder).await?;
        }
    }

    Ok(())
}

/// Render grouped search results for the terminal.
fn print_search_response(response: &search::SearchResponse) {
    if response.files.is_empty() {
        println!("No results for \"{}\"", response.query);
        return;
    }

    println!(
        "{} results in {} files for \"{}\"\n",
        response.total_results, response.total_files, response.query
    );

    for file in &response.files {
        let mut tags = Vec::new();
        if let Some(topic) = &file.topic {
            tags.push(format!("topic: {}", topic));
        }
        if let Some(project) = &file.project {
            tags.push(format!("project: {}", project));
        }
        let suffix = if tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", tags.join(", "))
        };
        println!("{}  (best {:.2}%){}", file.file_name, file.best_similarity, suffix);

        for chunk in &file.chunks {
            let mut preview: String = chunk.content.chars().take(120).collect();
            if chunk.content.chars().count() > 120 {
                preview.push('…');
            }
            println!("  {:.2}%  {}", chunk.similarity, preview.replace('\n', " "));
        }
        println!();
    }
}
