//! LLM-as-judge scoring of generated answers against reference answers.
//!
//! The judge replies in a two-line format:
//!
//! ```text
//! SCORE: <digit>
//! RATIONALE: <text>
//! ```
//!
//! Parsing is line oriented and tolerant: labels are case-insensitive, Turkish
//! labels (`PUAN`, `GEREKÇE`) are accepted, markdown emphasis around a label
//! is ignored, and a label may close a longer heading (`Final SCORE:`,
//! `Puan (1-5):`). A score label with nothing after it takes its digit from
//! the next non-empty line. Every outcome maps to a score in `0..=5`:
//!
//! | Situation                       | Score | Rationale       |
//! |---------------------------------|-------|-----------------|
//! | Answer carries the error marker | 0     | `Sistem Hatası` |
//! | Judge call failed               | 3     | `Format hatası` |
//! | No digit after a score label    | 1     | parsed or raw   |

use crate::answer::is_error_answer;
use crate::llm::{ChatModel, Prompts};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Score recorded when generation failed upstream.
pub const SYSTEM_ERROR_SCORE: u8 = 0;
/// Rationale recorded when generation failed upstream.
pub const SYSTEM_ERROR_RATIONALE: &str = "Sistem Hatası";
/// Score recorded when the judge call itself failed.
pub const CALL_FAILURE_SCORE: u8 = 3;
/// Rationale recorded when the judge call itself failed.
pub const CALL_FAILURE_RATIONALE: &str = "Format hatası";
/// Score assumed when the judge reply has no readable score.
pub const UNPARSED_SCORE: u8 = 1;
/// Rationale used when the judge replied with nothing at all.
pub const EMPTY_RATIONALE: &str = "(boş yanıt)";

const SCORE_LABELS: &[&str] = &["SCORE", "PUAN"];
const RATIONALE_LABELS: &[&str] = &["RATIONALE", "GEREKÇE"];

/// A judged score and its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// 0 for system failure, otherwise 1-5.
    pub score: u8,
    pub rationale: String,
}

impl Verdict {
    fn system_error() -> Self {
        Self {
            score: SYSTEM_ERROR_SCORE,
            rationale: SYSTEM_ERROR_RATIONALE.to_string(),
        }
    }

    fn call_failure() -> Self {
        Self {
            score: CALL_FAILURE_SCORE,
            rationale: CALL_FAILURE_RATIONALE.to_string(),
        }
    }
}

/// Grades answers with a chat model.
pub struct Judge<'a, C: ChatModel> {
    model: &'a C,
}

impl<'a, C: ChatModel> Judge<'a, C> {
    pub fn new(model: &'a C) -> Self {
        Self { model }
    }

    /// Score `answer` against `reference`.
    ///
    /// Never fails; see the module docs for the fallback values.
    pub async fn score(&self, question: &str, reference: &str, answer: &str) -> Verdict {
        if is_error_answer(answer) {
            return Verdict::system_error();
        }

        let prompt = Prompts::fill(
            Prompts::judge(),
            &[
                ("question", question),
                ("reference", reference),
                ("answer", answer),
            ],
        );

        match self
            .model
            .complete(Some(Prompts::system_judge()), &prompt)
            .await
        {
            Ok(reply) => parse_verdict(&reply),
            Err(e) => {
                warn!("Judge call failed: {}", e);
                Verdict::call_failure()
            }
        }
    }
}

enum Label {
    Score,
    Rationale,
}

/// Parse a judge reply into a verdict.
///
/// The first digit after the first score label wins and is clamped to 1-5.
/// The rationale is the text after the rationale label plus any following
/// unlabeled lines; without one it is the whole reply.
pub fn parse_verdict(reply: &str) -> Verdict {
    let mut score: Option<u8> = None;
    let mut rationale: Option<Vec<&str>> = None;
    // Set after a bare `SCORE:` until the next non-empty line.
    let mut awaiting_score = false;

    for line in reply.lines() {
        match split_label(line) {
            Some((Label::Score, rest)) => {
                if score.is_none() {
                    score = first_digit(rest);
                    awaiting_score = score.is_none() && rest.trim().is_empty();
                }
            }
            Some((Label::Rationale, rest)) => {
                awaiting_score = false;
                if rationale.is_none() {
                    rationale = Some(vec![rest]);
                }
            }
            None => {
                if awaiting_score && !line.trim().is_empty() {
                    awaiting_score = false;
                    if let Some(digit) = leading_digit(line) {
                        score = Some(digit);
                        continue;
                    }
                }
                if let Some(lines) = rationale.as_mut() {
                    lines.push(line.trim());
                }
            }
        }
    }

    let rationale = rationale
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| {
            let raw = reply.trim();
            if raw.is_empty() {
                EMPTY_RATIONALE.to_string()
            } else {
                raw.to_string()
            }
        });

    Verdict {
        score: score.unwrap_or(UNPARSED_SCORE).clamp(1, 5),
        rationale,
    }
}

/// Recognise `... LABEL (hint): rest`, ignoring case and markdown decoration.
///
/// The label is the last word before the first colon, after dropping a
/// trailing parenthesised hint.
fn split_label(line: &str) -> Option<(Label, &str)> {
    let (head, rest) = line.split_once(':')?;
    let head = head.trim_end_matches(|c: char| c.is_whitespace() || is_decoration(c));
    let head = match head.strip_suffix(')') {
        Some(inner) => inner.rfind('(').map_or(inner, |open| &inner[..open]),
        None => head,
    };
    let label = head
        .split_whitespace()
        .next_back()?
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_uppercase();
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || is_decoration(c));

    if SCORE_LABELS.contains(&label.as_str()) {
        Some((Label::Score, rest))
    } else if RATIONALE_LABELS.contains(&label.as_str()) {
        Some((Label::Rationale, rest.trim_end()))
    } else {
        None
    }
}

fn is_decoration(c: char) -> bool {
    matches!(c, '*' | '[' | ']' | '#' | '_')
}

/// Digit opening `line` once markdown decoration is skipped.
fn leading_digit(line: &str) -> Option<u8> {
    line.trim_start_matches(|c: char| c.is_whitespace() || is_decoration(c))
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|digit| digit as u8)
}

fn first_digit(text: &str) -> Option<u8> {
    text.chars()
        .find_map(|c| c.to_digit(10))
        .map(|digit| digit as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    #[test]
    fn test_parse_well_formed_reply() {
        let verdict = parse_verdict("SCORE: 4\nRATIONALE: Doğru, küçük eksik var.");
        assert_eq!(verdict.score, 4);
        assert_eq!(verdict.rationale, "Doğru, küçük eksik var.");
    }

    #[test]
    fn test_parse_markdown_and_turkish_labels() {
        let verdict = parse_verdict("**Puan:** 5\n**Gerekçe:** Sayısal veriler aynen aktarılmış.");
        assert_eq!(verdict.score, 5);
        assert_eq!(verdict.rationale, "Sayısal veriler aynen aktarılmış.");

        let verdict = parse_verdict("score: [2]\nrationale: eksik");
        assert_eq!(verdict.score, 2);
    }

    #[test]
    fn test_missing_score_defaults_to_one() {
        let verdict = parse_verdict("Cevap oldukça iyi görünüyor.");
        assert_eq!(verdict.score, UNPARSED_SCORE);
        assert_eq!(verdict.rationale, "Cevap oldukça iyi görünüyor.");

        let verdict = parse_verdict("SCORE: yok\nRATIONALE: anlaşılmadı");
        assert_eq!(verdict.score, UNPARSED_SCORE);
        assert_eq!(verdict.rationale, "anlaşılmadı");
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(parse_verdict("SCORE: 0").score, 1);
        assert_eq!(parse_verdict("SCORE: 9").score, 5);
        assert_eq!(parse_verdict("SCORE: 10/10").score, 1);
    }

    #[test]
    fn test_rationale_never_empty() {
        assert_eq!(parse_verdict("").rationale, EMPTY_RATIONALE);
        assert_eq!(parse_verdict("   \n ").rationale, EMPTY_RATIONALE);
        assert_eq!(parse_verdict("SCORE: 3\nRATIONALE:").rationale, "SCORE: 3\nRATIONALE:");
    }

    #[test]
    fn test_multiline_rationale() {
        let verdict = parse_verdict("RATIONALE: ilk satır\nikinci satır\nSCORE: 3");
        assert_eq!(verdict.score, 3);
        assert_eq!(verdict.rationale, "ilk satır\nikinci satır");
    }

    #[test]
    fn test_score_on_the_line_after_its_label() {
        let verdict = parse_verdict("SCORE:\n4\nRATIONALE: iyi");
        assert_eq!(verdict.score, 4);
        assert_eq!(verdict.rationale, "iyi");

        let verdict = parse_verdict("**Puan:**\n\n**5**\n**Gerekçe:** tam");
        assert_eq!(verdict.score, 5);
        assert_eq!(verdict.rationale, "tam");
    }

    #[test]
    fn test_bare_score_label_does_not_borrow_unrelated_digits() {
        let verdict = parse_verdict("SCORE:\nÖğrenci 240 AKTS demiş\nRATIONALE: eksik");
        assert_eq!(verdict.score, UNPARSED_SCORE);
        assert_eq!(verdict.rationale, "eksik");
    }

    #[test]
    fn test_label_closing_a_longer_heading() {
        let verdict = parse_verdict("Final SCORE: 5\nRATIONALE: tam");
        assert_eq!(verdict.score, 5);
        assert_eq!(verdict.rationale, "tam");

        assert_eq!(parse_verdict("Score (1-5): 5").score, 5);
        assert_eq!(parse_verdict("**Puan (1-5 arası):** 4").score, 4);
    }

    #[test]
    fn test_unrelated_colon_lines_are_ignored() {
        let verdict = parse_verdict("Madde 12: 240 AKTS\nSCORE: 5\nRATIONALE: tam");
        assert_eq!(verdict.score, 5);
        assert_eq!(verdict.rationale, "tam");
    }

    #[tokio::test]
    async fn test_error_answer_short_circuits() {
        let model = ScriptedModel::new().reply("SCORE: 5\nRATIONALE: mükemmel");
        let judge = Judge::new(&model);

        let verdict = judge
            .score("Kaç AKTS ile mezun olunur?", "240 AKTS", "HATA: connection refused")
            .await;

        assert_eq!(verdict.score, 0);
        assert_eq!(verdict.rationale, SYSTEM_ERROR_RATIONALE);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_call_failure_is_neutral() {
        let model = ScriptedModel::new().fail("429 Too Many Requests");
        let judge = Judge::new(&model);

        let verdict = judge.score("soru", "referans", "cevap").await;

        assert_eq!(verdict.score, CALL_FAILURE_SCORE);
        assert_eq!(verdict.rationale, CALL_FAILURE_RATIONALE);
    }

    #[tokio::test]
    async fn test_prompt_includes_all_three_texts() {
        let model = ScriptedModel::new().reply("SCORE: 5\nRATIONALE: tam");
        let judge = Judge::new(&model);

        let verdict = judge
            .score("Kaç AKTS ile mezun olunur?", "240 AKTS", "Mezuniyet için 240 AKTS gerekir.")
            .await;

        assert_eq!(verdict.score, 5);
        let prompt = &model.prompts()[0];
        assert!(prompt.contains("SORU: Kaç AKTS ile mezun olunur?"));
        assert!(prompt.contains("REFERANS: 240 AKTS"));
        assert!(prompt.contains("ÖĞRENCİ: Mezuniyet için 240 AKTS gerekir."));
    }

    #[tokio::test]
    async fn test_braces_in_question_and_reference_stay_literal() {
        let model = ScriptedModel::new().reply("SCORE: 2\nRATIONALE: eksik");
        let judge = Judge::new(&model);

        judge.score("{answer} nedir?", "{answer} yedi yıldır", "dört yıl").await;

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("SORU: {answer} nedir?"));
        assert!(prompt.contains("REFERANS: {answer} yedi yıldır"));
        assert_eq!(prompt.matches("dört yıl").count(), 1);
    }
}
