//! Benchmark runner: retrieve, generate, judge and record each question in turn.
//!
//! Items are processed strictly in input order. Nothing inside the loop can
//! abort the run: retrieval and generation failures become error answers
//! (scored 0), judge failures become neutral scores, and a failed snapshot
//! write is logged. After every item the full result collection is written
//! to the output path.

use super::dataset::BenchmarkItem;
use super::judge::Judge;
use super::report::{EvaluationResult, render_table, success_rate, truncate, write_snapshot};
use crate::answer::{AnswerGenerator, ERROR_MARKER};
use crate::chunker::Chunk;
use crate::embeddings::Embedder;
use crate::llm::ChatModel;
use crate::search::Retriever;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, warn};

/// Results of a complete run.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkReport {
    /// One result per question, in input order.
    pub results: Vec<EvaluationResult>,
    /// Wall-clock duration (seconds).
    pub total_time_secs: f64,
}

impl BenchmarkReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Final success percentage.
    pub fn success_rate(&self) -> f64 {
        success_rate(&self.results)
    }

    /// Print the summary table and the final score.
    pub fn print_summary(&self) {
        println!();
        print!("{}", render_table(&self.results));
        println!(
            "Passed {}/{} in {:.1}s",
            self.passed(),
            self.total(),
            self.total_time_secs
        );
        println!("FİNAL SKOR: %{:.2}", self.success_rate());
    }
}

/// Drives the evaluation loop.
pub struct BenchmarkRunner<'a, E: Embedder, G: ChatModel, J: ChatModel> {
    retriever: &'a Retriever<'a, E>,
    generator: AnswerGenerator<'a, G>,
    judge: Judge<'a, J>,
    top_k: usize,
    pass_threshold: u8,
    output: Option<PathBuf>,
}

impl<'a, E: Embedder, G: ChatModel, J: ChatModel> BenchmarkRunner<'a, E, G, J> {
    /// Create a runner with top-k 20, pass threshold 3 and no output file.
    pub fn new(retriever: &'a Retriever<'a, E>, answer_model: &'a G, judge_model: &'a J) -> Self {
        Self {
            retriever,
            generator: AnswerGenerator::new(answer_model),
            judge: Judge::new(judge_model),
            top_k: 20,
            pass_threshold: 3,
            output: None,
        }
    }

    /// Number of chunks retrieved per question.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Minimum score counted as a pass.
    pub fn pass_threshold(mut self, pass_threshold: u8) -> Self {
        self.pass_threshold = pass_threshold;
        self
    }

    /// Snapshot results to `path` after every item.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Evaluate `items` in order.
    pub async fn run(&self, items: &[BenchmarkItem]) -> BenchmarkReport {
        let start = Instant::now();
        let total = items.len();
        let mut results: Vec<EvaluationResult> = Vec::with_capacity(total);

        println!("Running benchmark on {} questions (k={})...", total, self.top_k);

        for (idx, item) in items.iter().enumerate() {
            let result = self.evaluate(item).await;

            if !result.passed() {
                println!(
                    "  Düşük puan ({}) [{}]: {}",
                    result.score,
                    result.id,
                    truncate(&result.question, 50)
                );
                println!("    Cevap: {}", truncate(&result.answer, 100));
            }

            results.push(result);

            if let Some(path) = &self.output {
                if let Err(e) = write_snapshot(path, &results) {
                    warn!("Could not write results to {}: {}", path.display(), e);
                }
            }

            println!(
                "[{}/{}] Başarı: %{:.0}",
                idx + 1,
                total,
                success_rate(&results)
            );
        }

        BenchmarkReport {
            results,
            total_time_secs: start.elapsed().as_secs_f64(),
        }
    }

    /// Run one item through retrieval, generation and judging.
    async fn evaluate(&self, item: &BenchmarkItem) -> EvaluationResult {
        let answer = match self.retriever.search(&item.question, self.top_k) {
            Ok(hits) => {
                let chunks: Vec<Chunk> = hits.into_iter().map(|hit| hit.chunk).collect();
                self.generator.generate(&item.question, &chunks).await
            }
            Err(e) => {
                error!("Retrieval failed for question {}: {}", item.id, e);
                format!("{} {}", ERROR_MARKER, e)
            }
        };

        let verdict = self
            .judge
            .score(&item.question, &item.ground_truth, &answer)
            .await;

        EvaluationResult::new(item, answer, verdict, self.pass_threshold)
    }
}
