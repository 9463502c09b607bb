//! Prompt templates for grounded answering and judging.
//!
//! Templates use `{placeholder}` markers filled by [`Prompts::fill`].

/// Collection of prompts used for answer generation and scoring.
pub struct Prompts;

impl Prompts {
    /// System prompt for the regulation assistant.
    pub fn system_assistant() -> &'static str {
        "Sen Çukurova Üniversitesi mevzuat asistanısın. Yalnızca sana verilen yönetmelik parçalarına dayanarak cevap verirsin."
    }

    /// Grounded answer prompt.
    ///
    /// Placeholders: `{context}`, `{question}`, `{refusal}`.
    pub fn rag_answer() -> &'static str {
        r#"Aşağıdaki dökümanları kullanarak soruyu NET ve KISA bir şekilde cevapla.

KURALLAR:
1. Sadece verilen metne sadık kal.
2. Eğer metinde cevap yoksa "{refusal}" de.
3. Sayısal verileri (kredi, AKTS, yıl, gün, not) asla kaçırma ve aynen aktar.

DÖKÜMANLAR:
{context}

SORU: {question}

CEVAP:"#
    }

    /// One retrieved passage with its 1-based label.
    ///
    /// Placeholders: `{n}`, `{text}`.
    pub fn context_part() -> &'static str {
        "\n--- PARÇA {n} ---\n{text}\n"
    }

    /// Judge rubric.
    ///
    /// Placeholders: `{question}`, `{reference}`, `{answer}`. The reply
    /// format is the contract parsed by the judge.
    pub fn judge() -> &'static str {
        r#"Sen öğretmensin. Öğrencinin cevabını referans cevaba göre 1 ile 5 arasında puanla.

PUANLAMA:
5 - Referansla tamamen uyumlu, sayısal veriler doğru.
4 - Doğru, küçük eksikler var.
3 - Kısmen doğru, ana bilgi mevcut.
2 - Büyük ölçüde yanlış veya eksik.
1 - Yanlış ya da cevap verilmemiş.

SORU: {question}
REFERANS: {reference}
ÖĞRENCİ: {answer}

Yalnızca şu formatta cevap ver:
SCORE: <rakam>
RATIONALE: <kısa açıklama>"#
    }

    /// System prompt for the judge.
    pub fn system_judge() -> &'static str {
        "You are a strict grader. Always answer with exactly two lines: SCORE and RATIONALE."
    }

    /// Substitute `{name}` markers in `template` from `values` in one pass.
    ///
    /// Inserted values are never scanned again, so a question or passage
    /// that itself contains `{answer}` stays literal. Unknown markers are
    /// left as they are.
    pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value, close))
            });

            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_not_empty() {
        assert!(!Prompts::system_assistant().is_empty());
        assert!(!Prompts::rag_answer().is_empty());
        assert!(!Prompts::judge().is_empty());
        assert!(!Prompts::system_judge().is_empty());
    }

    #[test]
    fn test_templates_carry_placeholders() {
        for placeholder in ["{context}", "{question}", "{refusal}"] {
            assert!(Prompts::rag_answer().contains(placeholder));
        }
        for placeholder in ["{question}", "{reference}", "{answer}", "SCORE:", "RATIONALE:"] {
            assert!(Prompts::judge().contains(placeholder));
        }
    }

    #[test]
    fn test_fill_substitutes_every_marker() {
        let filled = Prompts::fill(
            "SORU: {question} / CEVAP: {answer} / {answer}",
            &[("question", "Kaç AKTS?"), ("answer", "240")],
        );
        assert_eq!(filled, "SORU: Kaç AKTS? / CEVAP: 240 / 240");
    }

    #[test]
    fn test_fill_does_not_rescan_inserted_values() {
        let filled = Prompts::fill(
            "{question}|{reference}|{answer}",
            &[
                ("question", "{reference} ve {answer} nedir?"),
                ("reference", "{answer}"),
                ("answer", "yedi yıl"),
            ],
        );
        assert_eq!(filled, "{reference} ve {answer} nedir?|{answer}|yedi yıl");
    }

    #[test]
    fn test_fill_keeps_unknown_and_unclosed_braces() {
        let filled = Prompts::fill("{x} {n} { açık", &[("n", "1")]);
        assert_eq!(filled, "{x} 1 { açık");
    }
}
