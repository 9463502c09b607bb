//! Mevzuat RAG CLI
//!
//! Ingests regulation documents into the vector index and answers ad-hoc
//! questions against it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mevzuat_rag::{
    RagError,
    answer::AnswerGenerator,
    config::Config,
    embeddings::EmbeddingModel,
    indexer::Indexer,
    llm::LlmClient,
    search::Retriever,
    store::{ENTRIES_FILENAME, Manifest},
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Mevzuat RAG - question answering over university regulations
#[derive(Parser)]
#[command(name = "mevzuat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the vector index from the document directory
    Ingest {
        /// Directory with PDF, TXT and MD documents
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Directory the index is written to
        #[arg(short, long)]
        index: Option<PathBuf>,
    },

    /// Show the chunks most similar to a query
    Search {
        /// The search query
        query: String,

        /// Number of chunks to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Answer a question from the indexed regulations
    Ask {
        /// The question
        question: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show information about the current index
    Info,

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Ingest { source, index } => cmd_ingest(config, source, index),
        Commands::Search { query, top_k } => cmd_search(config, query, top_k),
        Commands::Ask { question, top_k } => cmd_ask(config, question, top_k).await,
        Commands::Info => cmd_info(config),
        Commands::Test => cmd_test(config).await,
    }
}

fn cmd_ingest(config: Config, source: Option<PathBuf>, index: Option<PathBuf>) -> Result<()> {
    let source_dir = source.unwrap_or_else(|| config.paths.source_dir.clone());
    let index_dir = index.unwrap_or_else(|| config.paths.index_dir.clone());

    println!("Source:          {}", source_dir.display());
    println!("Index:           {}", index_dir.display());
    println!("Embedding model: {}", config.embedding.model);

    let start = Instant::now();
    let embedder =
        EmbeddingModel::load(&config.embedding.model).context("Failed to load embedding model")?;

    let indexer = Indexer::new(&embedder, &config);
    let summary = match indexer.rebuild(&source_dir, &index_dir, |progress| {
        println!(
            "  Embedded {}/{} chunks (%{})",
            progress.embedded,
            progress.total,
            progress.percent()
        );
    }) {
        Ok(summary) => summary,
        Err(RagError::EmptyCorpus(path)) => {
            anyhow::bail!(
                "No usable documents under '{}'. Add PDF, TXT or MD files and run ingest again.",
                path.display()
            );
        }
        Err(e) => return Err(e).context("Ingestion failed"),
    };

    println!("\nIngestion complete in {:.2?}", start.elapsed());
    println!("  {}", summary);

    Ok(())
}

fn cmd_search(config: Config, query: String, top_k: Option<usize>) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let embedder =
        EmbeddingModel::load(&config.embedding.model).context("Failed to load embedding model")?;
    let retriever =
        Retriever::open(&config.paths.index_dir, &embedder).context("Failed to open index")?;

    println!("Searching for: \"{}\"", query);
    println!();

    let start = Instant::now();
    let hits = retriever.search(&query, top_k).context("Search failed")?;
    let search_duration = start.elapsed();

    if hits.is_empty() {
        println!("No matching chunks found.");
        return Ok(());
    }

    println!("Results:");
    println!("{}", "─".repeat(60));

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{:>2}. {} [page {}] (score {:.3})",
            i + 1,
            hit.chunk.source,
            hit.chunk.page,
            hit.score
        );
        print_preview(&hit.chunk.text, 200);
        println!();
    }

    println!("{}", "─".repeat(60));
    println!("Found {} chunks in {:.2?}", hits.len(), search_duration);

    Ok(())
}

async fn cmd_ask(config: Config, question: String, top_k: Option<usize>) -> Result<()> {
    config.validate_llm().context("Invalid LLM configuration")?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let embedder =
        EmbeddingModel::load(&config.embedding.model).context("Failed to load embedding model")?;
    let retriever =
        Retriever::open(&config.paths.index_dir, &embedder).context("Failed to open index")?;

    let client =
        LlmClient::new(config.llm.clone()).with_temperature(config.llm.interactive_temperature);
    let generator = AnswerGenerator::new(&client);

    let hits = retriever.search(&question, top_k).context("Search failed")?;

    println!("Sources ({}):", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        println!("  PARÇA {} - {} [page {}]", i + 1, hit.chunk.source, hit.chunk.page);
        print_preview(&hit.chunk.text, 120);
    }
    println!();

    let chunks: Vec<_> = hits.into_iter().map(|hit| hit.chunk).collect();
    let answer = generator.generate(&question, &chunks).await;

    println!("{}", "─".repeat(60));
    println!("{}", answer);
    println!("{}", "─".repeat(60));

    Ok(())
}

fn cmd_info(config: Config) -> Result<()> {
    let index_dir = &config.paths.index_dir;

    let Some(manifest) = Manifest::read(index_dir).context("Failed to read index manifest")?
    else {
        anyhow::bail!(
            "Index not found at '{}'. Run 'ingest' first.",
            index_dir.display()
        );
    };

    let size = std::fs::metadata(index_dir.join(ENTRIES_FILENAME))
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Index Information");
    println!("{}", "─".repeat(40));
    println!("  Embedding model: {}", manifest.embedding_model);
    println!("  Dimension:       {}", manifest.dimension);
    println!("  Chunks:          {}", manifest.entry_count);
    println!("  File size:       {:.1} KB", size as f64 / 1024.0);
    println!("  Index path:      {}", index_dir.display());

    if manifest.embedding_model != config.embedding.model {
        println!(
            "\n  Warning: configured embedding model is '{}'; re-run ingest before searching.",
            config.embedding.model
        );
    }

    Ok(())
}

async fn cmd_test(config: Config) -> Result<()> {
    println!("Testing LLM connection...\n");

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Model:     {}", config.llm.model);
    let key_prefix: String = config.llm.api_key.chars().take(8).collect();
    println!("  API Key:   {}...", key_prefix);
    println!();

    config.validate_llm().context("Invalid LLM configuration")?;

    let client = LlmClient::new(config.llm);

    println!("Sending test request...");
    client
        .test_connection()
        .await
        .context("Connection failed")?;
    println!("Connection successful!");

    Ok(())
}

/// Print the first `max_chars` of `text`, at most three lines.
fn print_preview(text: &str, max_chars: usize) {
    let preview: String = text.chars().take(max_chars).collect();
    for line in preview.lines().take(3) {
        println!("      {}", line);
    }
    if text.chars().count() > max_chars {
        println!("      ...");
    }
}
