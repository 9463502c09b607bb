//! Grounded answer generation from retrieved chunks.
//!
//! The generator never fails: a model error comes back as an answer starting
//! with [`ERROR_MARKER`], which the judge recognises and scores as a system
//! failure without spending a call.

use crate::chunker::Chunk;
use crate::llm::{ChatModel, Prompts};
use tracing::{debug, error};

/// Prefix of every answer produced from a failed model call.
pub const ERROR_MARKER: &str = "HATA:";

/// Phrase the model is told to emit when the passages lack the answer.
pub const REFUSAL_PHRASE: &str = "Yönetmelikte bulunamadı";

/// Answer returned without a model call when retrieval found nothing.
pub const NO_CONTEXT_ANSWER: &str = "Bilgi bulunamadı.";

/// Whether `answer` is the sentinel of a failed generation.
pub fn is_error_answer(answer: &str) -> bool {
    answer.trim_start().starts_with(ERROR_MARKER)
}

/// Builds grounded prompts and asks the chat model for an answer.
pub struct AnswerGenerator<'a, C: ChatModel> {
    model: &'a C,
}

impl<'a, C: ChatModel> AnswerGenerator<'a, C> {
    pub fn new(model: &'a C) -> Self {
        Self { model }
    }

    /// Answer `question` from `chunks`, given in retrieval order.
    pub async fn generate(&self, question: &str, chunks: &[Chunk]) -> String {
        if chunks.is_empty() {
            debug!("No context retrieved for question, skipping model call");
            return NO_CONTEXT_ANSWER.to_string();
        }

        let prompt = build_prompt(question, chunks);

        match self
            .model
            .complete(Some(Prompts::system_assistant()), &prompt)
            .await
        {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                error!("Answer generation failed: {}", e);
                format!("{} {}", ERROR_MARKER, e)
            }
        }
    }
}

/// Concatenate chunk texts under 1-based `PARÇA` labels.
pub fn build_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let n = (i + 1).to_string();
            Prompts::fill(Prompts::context_part(), &[("n", &n), ("text", &chunk.text)])
        })
        .collect()
}

fn build_prompt(question: &str, chunks: &[Chunk]) -> String {
    let context = build_context(chunks);
    Prompts::fill(
        Prompts::rag_answer(),
        &[
            ("refusal", REFUSAL_PHRASE),
            ("question", question),
            ("context", &context),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    fn chunk(text: &str, position: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: "lisans_yonetmeligi.pdf".to_string(),
            page: 3,
            position,
        }
    }

    #[test]
    fn test_context_labels_are_one_based_and_ordered() {
        let context = build_context(&[chunk("birinci metin", 7), chunk("ikinci metin", 2)]);

        let first = context.find("--- PARÇA 1 ---").unwrap();
        let second = context.find("--- PARÇA 2 ---").unwrap();
        assert!(first < second);
        assert!(context.find("birinci metin").unwrap() < second);
        assert!(!context.contains("PARÇA 0"));
    }

    #[test]
    fn test_prompt_carries_question_refusal_and_passages() {
        let prompt = build_prompt("Azami süre nedir?", &[chunk("Azami süre yedi yıldır.", 0)]);

        assert!(prompt.contains("SORU: Azami süre nedir?"));
        assert!(prompt.contains(REFUSAL_PHRASE));
        assert!(prompt.contains("Azami süre yedi yıldır."));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_passage_text_is_not_treated_as_placeholder() {
        let prompt = build_prompt("soru", &[chunk("metinde {question} geçiyor", 0)]);
        assert!(prompt.contains("metinde {question} geçiyor"));
    }

    #[test]
    fn test_question_cannot_pull_in_passages() {
        let prompt = build_prompt("{context} nedir?", &[chunk("Azami süre yedi yıldır.", 0)]);

        assert!(prompt.contains("SORU: {context} nedir?"));
        assert_eq!(prompt.matches("Azami süre yedi yıldır.").count(), 1);
    }

    #[test]
    fn test_passage_braces_survive_context_labels() {
        let context = build_context(&[chunk("{n}. fıkra ve {text} ifadesi", 0)]);
        assert!(context.contains("--- PARÇA 1 ---\n{n}. fıkra ve {text} ifadesi"));
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_model_answer() {
        let model = ScriptedModel::new().reply("  240 AKTS gereklidir.\n");
        let generator = AnswerGenerator::new(&model);

        let answer = generator
            .generate("Kaç AKTS ile mezun olunur?", &[chunk("Mezuniyet için 240 AKTS gerekir.", 0)])
            .await;

        assert_eq!(answer, "240 AKTS gereklidir.");
        assert_eq!(model.calls(), 1);
        assert!(model.prompts()[0].contains("--- PARÇA 1 ---"));
    }

    #[tokio::test]
    async fn test_model_failure_becomes_error_answer() {
        let model = ScriptedModel::new().fail("connection reset");
        let generator = AnswerGenerator::new(&model);

        let answer = generator.generate("soru", &[chunk("bir metin parçası", 0)]).await;

        assert!(is_error_answer(&answer));
        assert!(answer.contains("connection reset"));
    }

    #[test]
    fn test_empty_context_skips_model() {
        let model = ScriptedModel::new();
        let generator = AnswerGenerator::new(&model);

        let answer = tokio_test::block_on(generator.generate("soru", &[]));

        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn test_error_marker_is_a_prefix_check() {
        assert!(is_error_answer("HATA: timeout"));
        assert!(is_error_answer("  HATA: timeout"));
        assert!(!is_error_answer("Bu bir HATA: değil"));
    }
}
