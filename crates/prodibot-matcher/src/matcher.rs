//! Per-entry scoring and best-match selection.

use prodibot_core::types::KnowledgeEntry;
use serde::Serialize;
use std::collections::HashSet;

use crate::text::{normalize, tokenize};

/// Tunables for one match call. The defaults mirror the service's shipped
/// behavior; the engine builds these from `ChatConfig`.
#[derive(Debug, Clone)]
pub struct MatcherOptions {
    /// Reply when nothing scores above the threshold.
    pub default_response: String,
    /// Minimum raw score for a match (inclusive).
    pub score_threshold: f64,
    /// Label for a matched entry's related link.
    pub link_label: String,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            default_response: "Terima kasih atas pertanyaannya. Untuk informasi lebih \
                               lanjut, silakan hubungi kami melalui halaman Kontak."
                .into(),
            score_threshold: 2.0,
            link_label: "Info lebih lanjut".into(),
        }
    }
}

/// Result of one match call.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub response: String,
    pub entry_id: Option<i64>,
    pub matched: bool,
    /// Normalized to [0, 1]: raw score / 10, capped.
    pub confidence: f64,
    /// Raw score of the winning entry (0 when nothing matched).
    pub score: f64,
}

/// Score a single entry against the normalized input and its token set.
///
/// A keyword phrase earns +3 when it appears anywhere in the full input,
/// and independently +1 for every input token it is a substring of (or
/// that is a substring of it). Both bonuses apply together — a phrase that
/// equals an input token scores 4 from these two rules. This mirrors the
/// long-observed production behavior and is deliberately left as-is.
pub fn score_entry(input: &str, tokens: &HashSet<String>, entry: &KnowledgeEntry) -> f64 {
    let mut score = 0.0;

    for phrase in &entry.keywords {
        if input.contains(phrase.as_str()) {
            score += 3.0;
        }
        for token in tokens {
            if token.contains(phrase.as_str()) || phrase.contains(token.as_str()) {
                score += 1.0;
            }
        }
    }

    let question_tokens = tokenize(&normalize(&entry.question));
    score += 2.0 * tokens.intersection(&question_tokens).count() as f64;

    score += 0.5 * f64::from(entry.priority);

    score
}

/// Pick the best-matching entry for `input` out of `entries`.
///
/// `entries` is expected in priority-descending order (the order the store
/// loads them in); the fold keeps the first entry that reaches the maximum
/// score, so earlier entries win ties. Entries whose keyword field parsed
/// to nothing still compete via question overlap and priority.
pub fn best_match(input: &str, entries: &[KnowledgeEntry], opts: &MatcherOptions) -> MatchOutcome {
    let normalized = normalize(input);
    let tokens = tokenize(&normalized);

    let (best, best_score) = entries.iter().fold(
        (None::<&KnowledgeEntry>, 0.0_f64),
        |(best, best_score), entry| {
            let score = score_entry(&normalized, &tokens, entry);
            if score > best_score {
                (Some(entry), score)
            } else {
                (best, best_score)
            }
        },
    );

    match best {
        Some(entry) if best_score >= opts.score_threshold => {
            let mut response = entry.answer.clone();
            if let Some(link) = entry.link.as_deref().filter(|l| !l.is_empty()) {
                response.push_str("\n\n");
                response.push_str(&opts.link_label);
                response.push_str(": ");
                response.push_str(link);
            }
            MatchOutcome {
                response,
                entry_id: Some(entry.id),
                matched: true,
                confidence: (best_score / 10.0).min(1.0),
                score: best_score,
            }
        }
        _ => MatchOutcome {
            response: opts.default_response.clone(),
            entry_id: None,
            matched: false,
            confidence: 0.0,
            score: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodibot_core::types::Category;

    fn entry(id: i64, keywords: &str, question: &str, answer: &str, priority: i32) -> KnowledgeEntry {
        KnowledgeEntry {
            id,
            category: Category::Umum,
            question: question.into(),
            keywords: KnowledgeEntry::parse_keywords(keywords),
            answer: answer.into(),
            link: None,
            priority,
            active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn opts() -> MatcherOptions {
        MatcherOptions::default()
    }

    #[test]
    fn test_registration_question_matches() {
        // Keyword "pendaftaran" appears verbatim: +3 substring, +1 token.
        // "daftar" is inside the token "pendaftaran": +3 substring, +1 token.
        // Question shares "bagaimana" and "cara": +4. Total 12.
        let entries = vec![entry(
            1,
            "pendaftaran, daftar",
            "bagaimana cara mendaftar",
            "Pendaftaran dibuka setiap Juni.",
            0,
        )];
        let out = best_match("bagaimana cara pendaftaran", &entries, &opts());
        assert!(out.matched);
        assert_eq!(out.entry_id, Some(1));
        assert!((out.score - 12.0).abs() < 1e-9);
        assert!((out.confidence - 1.0).abs() < 1e-9);
        assert_eq!(out.response, "Pendaftaran dibuka setiap Juni.");
    }

    #[test]
    fn test_keyword_equal_to_token_double_counts() {
        // Substring-of-input (+3) and token match (+1) apply together.
        let entries = vec![entry(7, "beasiswa", "", "Ada beberapa skema beasiswa.", 0)];
        let out = best_match("beasiswa", &entries, &opts());
        assert!(out.matched);
        assert!((out.score - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_input_falls_back() {
        let entries = vec![
            entry(1, "pendaftaran, daftar", "bagaimana cara mendaftar", "A", 0),
            entry(2, "kurikulum, mata kuliah", "apa saja mata kuliah", "B", 0),
        ];
        let out = best_match("xyz123 qqq", &entries, &opts());
        assert!(!out.matched);
        assert_eq!(out.entry_id, None);
        assert_eq!(out.confidence, 0.0);
        assert_eq!(out.response, opts().default_response);
    }

    #[test]
    fn test_empty_knowledge_base_falls_back() {
        let out = best_match("bagaimana cara pendaftaran", &[], &opts());
        assert!(!out.matched);
        assert_eq!(out.entry_id, None);
        assert_eq!(out.confidence, 0.0);
        assert!(!out.response.is_empty());
    }

    #[test]
    fn test_response_is_never_empty() {
        let entries = vec![entry(1, "wisuda", "kapan wisuda", "Oktober.", 0)];
        for input in ["wisuda", "zzz", "a b c d"] {
            let out = best_match(input, &entries, &opts());
            assert!(!out.response.is_empty(), "empty response for {input:?}");
        }
    }

    #[test]
    fn test_deterministic() {
        let entries = vec![
            entry(1, "pendaftaran", "cara daftar", "A", 2),
            entry(2, "beasiswa", "info beasiswa", "B", 1),
        ];
        let a = best_match("info pendaftaran beasiswa", &entries, &opts());
        let b = best_match("info pendaftaran beasiswa", &entries, &opts());
        assert_eq!(a.entry_id, b.entry_id);
        assert_eq!(a.response, b.response);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn test_tie_break_first_entry_wins() {
        // Both entries score exactly 2.0 via priority alone; the first in
        // the priority-sorted sequence must keep the match.
        let x = entry(10, "", "", "jawaban X", 4);
        let y = entry(11, "", "", "jawaban Y", 4);
        let out = best_match("tidak relevan", &[x, y], &opts());
        assert!(out.matched);
        assert_eq!(out.entry_id, Some(10));
        assert_eq!(out.response, "jawaban X");
    }

    #[test]
    fn test_tie_break_across_different_score_sources() {
        // X reaches 2.5 purely from priority; Y reaches 2.5 from one
        // question-token overlap plus priority 1. Supplied in
        // priority-descending order, X keeps the match.
        let x = entry(1, "", "", "jawaban X", 5);
        let y = entry(2, "", "halo", "jawaban Y", 1);
        let out = best_match("halo", &[x, y], &opts());
        assert!(out.matched);
        assert!((out.score - 2.5).abs() < 1e-9);
        assert_eq!(out.entry_id, Some(1));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // priority 4 → 0.5 × 4 = 2.0 exactly: matches.
        let at = vec![entry(1, "", "", "tepat ambang", 4)];
        let out = best_match("apapun", &at, &opts());
        assert!(out.matched);
        assert!((out.score - 2.0).abs() < 1e-9);

        // priority 3 → 1.5: below threshold, falls back.
        let below = vec![entry(2, "", "", "di bawah ambang", 3)];
        let out = best_match("apapun", &below, &opts());
        assert!(!out.matched);
    }

    #[test]
    fn test_empty_keyword_field_scores_via_question_overlap() {
        // MalformedKeywordData: zero parsed phrases is not fatal; the entry
        // can still win through question tokens.
        let entries = vec![entry(3, " , ,", "jadwal ujian akhir semester", "Ujian mulai Desember.", 0)];
        let out = best_match("jadwal ujian semester", &entries, &opts());
        assert!(out.matched);
        assert_eq!(out.entry_id, Some(3));
        // Three shared tokens → 6.0
        assert!((out.score - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_link_appended_with_label() {
        let mut e = entry(5, "kontak", "", "Hubungi sekretariat prodi.", 0);
        e.link = Some("https://prodi.example.ac.id/kontak".into());
        let out = best_match("kontak", &[e], &opts());
        assert!(out.matched);
        assert_eq!(
            out.response,
            "Hubungi sekretariat prodi.\n\nInfo lebih lanjut: https://prodi.example.ac.id/kontak"
        );
    }

    #[test]
    fn test_punctuation_does_not_block_match() {
        let entries = vec![entry(1, "pendaftaran", "", "Jawaban.", 0)];
        let out = best_match("Pendaftaran???", &entries, &opts());
        assert!(out.matched);
    }

    #[test]
    fn test_confidence_is_capped_at_one() {
        let entries = vec![entry(1, "daftar", "cara daftar kuliah baru", "Jawaban.", 20)];
        let out = best_match("cara daftar kuliah baru", &entries, &opts());
        assert!(out.matched);
        assert!(out.confidence <= 1.0);
    }

    #[test]
    fn test_multi_word_phrase_matches_whole_input_only() {
        // "mata kuliah" is not a substring of any single token, but is a
        // substring of the whole normalized input (+3). Each token is also
        // a substring of the phrase (+1 each).
        let entries = vec![entry(1, "mata kuliah", "", "Daftar mata kuliah ada di katalog.", 0)];
        let out = best_match("mata kuliah pilihan", &entries, &opts());
        assert!(out.matched);
        assert!((out.score - 5.0).abs() < 1e-9);
    }
}
