//! Benchmark evaluation.
//!
//! This module provides:
//! - Question set loading and validation
//! - LLM-as-judge scoring with tolerant reply parsing
//! - The sequential benchmark runner with per-item result snapshots

pub mod benchmark;
pub mod dataset;
pub mod judge;
pub mod report;

pub use benchmark::{BenchmarkReport, BenchmarkRunner};
pub use dataset::{BenchmarkItem, load_questions};
pub use judge::{Judge, Verdict, parse_verdict};
pub use report::{EvaluationResult, ReportFormat, Status, success_rate, write_snapshot};
