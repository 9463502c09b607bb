//! Benchmark binary: scores the RAG pipeline against a reference question set.
//!
//! Usage:
//!   benchmark                          # Defaults from configuration
//!
//! Options:
//!   --questions <path>       # Question set JSON (default: benchmark/benchmark_data.json)
//!   --output <path>          # Result file, .csv or .json (default: benchmark/benchmark_results.csv)
//!   -k, --top-k <N>          # Chunks retrieved per question (default: 20)
//!   --max-items <N>          # Only evaluate the first N questions

use anyhow::{Context, Result};
use clap::Parser;
use mevzuat_rag::answer::NO_CONTEXT_ANSWER;
use mevzuat_rag::config::Config;
use mevzuat_rag::embeddings::EmbeddingModel;
use mevzuat_rag::eval::{BenchmarkRunner, load_questions};
use mevzuat_rag::llm::LlmClient;
use mevzuat_rag::search::Retriever;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "benchmark")]
#[command(about = "Evaluate answers to the benchmark questions with an LLM judge", long_about = None)]
struct Cli {
    /// Question set JSON file
    #[arg(long)]
    questions: Option<PathBuf>,

    /// Result file, rewritten after every question
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of chunks retrieved per question
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Maximum number of questions to evaluate
    #[arg(long)]
    max_items: Option<usize>,
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
    config.validate_llm().context("Invalid LLM configuration")?;

    let questions_path = cli.questions.unwrap_or_else(|| config.paths.questions.clone());
    let output_path = cli.output.unwrap_or_else(|| config.paths.results.clone());
    let top_k = cli.top_k.unwrap_or(config.retrieval.top_k);
    let max_items = cli.max_items.or(config.benchmark.max_items);

    let mut items = load_questions(&questions_path).with_context(|| {
        format!("Failed to load question set from {}", questions_path.display())
    })?;
    if let Some(max) = max_items {
        items.truncate(max);
    }

    println!("LLM API Base: {}", config.llm.api_base);
    println!("LLM Model:    {}", config.llm.model);
    println!("Questions:    {} ({} items)", questions_path.display(), items.len());
    println!("Results:      {}", output_path.display());

    let embedder =
        EmbeddingModel::load(&config.embedding.model).context("Failed to load embedding model")?;
    let retriever =
        Retriever::open(&config.paths.index_dir, &embedder).context("Failed to open index")?;
    if retriever.is_empty() {
        println!(
            "Warning: the index is empty; every answer will be '{}'",
            NO_CONTEXT_ANSWER
        );
    }

    let client = LlmClient::new(config.llm.clone());

    let report = BenchmarkRunner::new(&retriever, &client, &client)
        .top_k(top_k)
        .pass_threshold(config.benchmark.pass_threshold)
        .output(&output_path)
        .run(&items)
        .await;

    report.print_summary();
    println!("Results saved to {}", output_path.display());

    Ok(())
}
