//! Evaluation results: pass/fail labeling, snapshot persistence and the
//! summary table.

use super::dataset::BenchmarkItem;
use super::judge::Verdict;
use crate::error::{RagError, Result};
use crate::store::write_atomic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const QUESTION_WIDTH: usize = 32;
const RATIONALE_WIDTH: usize = 75;

/// Pass/fail label of one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "BAŞARILI")]
    Pass,
    #[serde(rename = "BAŞARISIZ")]
    Fail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => f.write_str("BAŞARILI"),
            Status::Fail => f.write_str("BAŞARISIZ"),
        }
    }
}

/// Outcome of one benchmark question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub reference: String,
    pub score: u8,
    pub rationale: String,
    pub status: Status,
}

impl EvaluationResult {
    /// Record `answer` and its verdict; passes iff `score >= pass_threshold`.
    pub fn new(item: &BenchmarkItem, answer: String, verdict: Verdict, pass_threshold: u8) -> Self {
        let status = if verdict.score >= pass_threshold {
            Status::Pass
        } else {
            Status::Fail
        };

        Self {
            id: item.id.clone(),
            question: item.question.clone(),
            answer,
            reference: item.ground_truth.clone(),
            score: verdict.score,
            rationale: verdict.rationale,
            status,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }
}

/// Share of passing results in percent; 0 for no results.
pub fn success_rate(results: &[EvaluationResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed()).count();
    passed as f64 / results.len() as f64 * 100.0
}

/// On-disk format of a result snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    /// `.json` selects JSON; anything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Csv,
        }
    }
}

/// Overwrite `path` with the complete result collection.
///
/// The file is replaced atomically, so a reader sees either the previous
/// snapshot or this one.
pub fn write_snapshot(path: &Path, results: &[EvaluationResult]) -> Result<()> {
    match ReportFormat::from_path(path) {
        ReportFormat::Csv => write_atomic(path, |file| {
            let mut writer = csv::Writer::from_writer(file);
            for result in results {
                writer
                    .serialize(result)
                    .map_err(|e| RagError::Serialization(e.to_string()))?;
            }
            writer.flush().map_err(|e| RagError::io(path, e))
        }),
        ReportFormat::Json => write_atomic(path, |file| {
            serde_json::to_writer_pretty(file, results)
                .map_err(|e| RagError::Serialization(e.to_string()))
        }),
    }
}

/// Render the summary table: id, question, score, status, rationale.
pub fn render_table(results: &[EvaluationResult]) -> String {
    let rule_heavy = "=".repeat(140);
    let rule_light = "-".repeat(140);

    let mut out = String::new();
    out.push_str(&rule_heavy);
    out.push('\n');
    out.push_str(&format!(
        "{:<4} | {:<35} | {:<4} | {:<10} | {}\n",
        "ID", "SORU", "PUAN", "DURUM", "HAKEM GEREKÇESİ"
    ));
    out.push_str(&rule_light);
    out.push('\n');

    for result in results {
        let rationale = result.rationale.replace('\n', " ");
        out.push_str(&format!(
            "{:<4} | {:<35} | {:<4} | {:<10} | {}\n",
            result.id,
            truncate(&result.question, QUESTION_WIDTH),
            result.score,
            result.status.to_string(),
            truncate(&rationale, RATIONALE_WIDTH)
        ));
    }

    out.push_str(&rule_heavy);
    out.push('\n');
    out
}

/// Cut `text` to `max` chars, marking the cut with `..`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}..", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(id: &str) -> BenchmarkItem {
        BenchmarkItem {
            id: id.to_string(),
            question: "Kaç AKTS ile mezun olunur?".to_string(),
            ground_truth: "240 AKTS".to_string(),
        }
    }

    fn result(id: &str, score: u8) -> EvaluationResult {
        EvaluationResult::new(
            &item(id),
            "240 AKTS".to_string(),
            Verdict {
                score,
                rationale: "gerekçe".to_string(),
            },
            3,
        )
    }

    #[test]
    fn test_pass_boundary() {
        assert!(!result("1", 2).passed());
        assert!(result("1", 3).passed());
        assert!(!result("1", 0).passed());
        assert_eq!(result("1", 5).status, Status::Pass);
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(&[]), 0.0);
        let results = vec![result("1", 5), result("2", 1), result("3", 3), result("4", 0)];
        assert!((success_rate(&results) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("out.json")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("out.JSON")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("out.csv")), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path(Path::new("out")), ReportFormat::Csv);
    }

    #[test]
    fn test_csv_snapshot_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("benchmark_results.csv");

        write_snapshot(&path, &[result("1", 5), result("2", 2), result("3", 4)]).unwrap();
        write_snapshot(&path, &[result("1", 5)]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("id"));
        assert_eq!(headers.get(6), Some("status"));

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(6), Some("BAŞARILI"));
    }

    #[test]
    fn test_json_snapshot_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let results = vec![result("1", 5), result("2", 0)];

        write_snapshot(&path, &results).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Vec<EvaluationResult> = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, results);
        assert!(content.contains("BAŞARISIZ"));
    }

    #[test]
    fn test_table_truncates_long_fields() {
        let mut long = result("12", 4);
        long.question = "ö".repeat(60);
        long.rationale = format!("{}\nikinci satır", "a".repeat(100));

        let table = render_table(&[long]);
        let row = table.lines().nth(3).unwrap();

        assert!(row.contains(&format!("{}..", "ö".repeat(32))));
        assert!(!row.contains(&"ö".repeat(33)));
        assert!(row.contains(&format!("{}..", "a".repeat(75))));
        assert!(row.contains("BAŞARILI"));
    }
}
