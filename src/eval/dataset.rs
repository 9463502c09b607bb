//! Benchmark question set loading.
//!
//! The question file is a JSON array:
//!
//! ```json
//! [
//!   {"id": 1, "question": "Kaç AKTS ile mezun olunur?", "ground_truth": "240 AKTS"},
//!   {"question": "Azami öğrenim süresi nedir?", "ground_truth": "Yedi yıl"}
//! ]
//! ```
//!
//! `id` may be a number or a string and defaults to the 1-based position.
//! Any malformed record rejects the whole file.

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One question with its reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkItem {
    pub id: String,
    pub question: String,
    pub ground_truth: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    ground_truth: Option<String>,
}

/// Load and validate the question set at `path`.
pub fn load_questions(path: &Path) -> Result<Vec<BenchmarkItem>> {
    let content = fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
    parse_questions(&content).map_err(|e| match e {
        RagError::Dataset(msg) => RagError::Dataset(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Validate a question set given as JSON text.
///
/// Every rejection is a [`RagError::Dataset`]; [`load_questions`] prefixes
/// its message with the path.
pub fn parse_questions(content: &str) -> Result<Vec<BenchmarkItem>> {
    let raw: Vec<RawItem> = serde_json::from_str(content)
        .map_err(|e| RagError::Dataset(format!("malformed JSON: {}", e)))?;

    if raw.is_empty() {
        return Err(RagError::Dataset("question set is empty".to_string()));
    }

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(raw.len());

    for (index, record) in raw.into_iter().enumerate() {
        let position = index + 1;

        let id = match record.id {
            Some(RawId::Number(n)) => n.to_string(),
            Some(RawId::Text(s)) => s,
            None => position.to_string(),
        };

        let invalid = |problem: &str| {
            RagError::Dataset(format!("record {} (id {}) {}", position, id, problem))
        };

        let question = record.question.ok_or_else(|| invalid("has no question"))?;
        if question.trim().is_empty() {
            return Err(invalid("has an empty question"));
        }

        let ground_truth = record.ground_truth.ok_or_else(|| invalid("has no ground_truth"))?;

        if !seen.insert(id.clone()) {
            return Err(RagError::Dataset(format!("duplicate id {}", id)));
        }

        items.push(BenchmarkItem {
            id,
            question,
            ground_truth,
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_mixed_ids() {
        let items = parse_questions(
            r#"[
                {"id": 7, "question": "Kaç AKTS ile mezun olunur?", "ground_truth": "240 AKTS"},
                {"id": "yaz-1", "question": "Yaz okulu var mı?", "ground_truth": "Evet"},
                {"question": "Azami süre?", "ground_truth": "Yedi yıl"}
            ]"#,
        )
        .unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "yaz-1", "3"]);
        assert_eq!(items[0].ground_truth, "240 AKTS");
    }

    #[test]
    fn test_missing_ground_truth_rejected() {
        let err = parse_questions(r#"[{"id": 1, "question": "Soru?"}]"#).unwrap_err();
        assert!(matches!(err, RagError::Dataset(_)));
        assert!(err.to_string().contains("ground_truth"));
    }

    #[test]
    fn test_missing_or_blank_question_rejected() {
        assert!(parse_questions(r#"[{"ground_truth": "x"}]"#).is_err());
        let err = parse_questions(r#"[{"question": "  ", "ground_truth": "x"}]"#).unwrap_err();
        assert!(err.to_string().contains("empty question"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = parse_questions(
            r#"[
                {"id": 1, "question": "a?", "ground_truth": "a"},
                {"id": "1", "question": "b?", "ground_truth": "b"}
            ]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate id 1"));
    }

    #[test]
    fn test_positional_id_collision_rejected() {
        let result = parse_questions(
            r#"[
                {"id": 2, "question": "a?", "ground_truth": "a"},
                {"question": "b?", "ground_truth": "b"}
            ]"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_and_malformed_rejected() {
        let empty = parse_questions("[]").unwrap_err();
        assert!(matches!(&empty, RagError::Dataset(msg) if msg.contains("empty")));
        let malformed = parse_questions("{").unwrap_err();
        assert!(matches!(&malformed, RagError::Dataset(msg) if msg.contains("malformed")));
        assert!(matches!(
            parse_questions(r#"{"question": "a"}"#),
            Err(RagError::Dataset(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("benchmark_data.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "question": "Kaç AKTS ile mezun olunur?", "ground_truth": "240 AKTS"}]"#,
        )
        .unwrap();

        let items = load_questions(&path).unwrap();
        assert_eq!(items.len(), 1);

        let missing = load_questions(&dir.path().join("yok.json"));
        assert!(matches!(missing, Err(RagError::Io { .. })));
    }

    #[test]
    fn test_load_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bozuk.json");
        std::fs::write(&path, "[]").unwrap();

        let err = load_questions(&path).unwrap_err();
        assert!(matches!(&err, RagError::Dataset(_)));
        assert!(err.to_string().contains("bozuk.json: question set is empty"));
    }
}
