//! Language plausibility heuristic: share of very common words plus
//! language-specific diacritics.

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, Severity};

use crate::gate::{Gate, GateMeta};

/// Below this share of common words, with no diacritics, the script is
/// flagged.
const MIN_COMMON_WORD_RATIO: f64 = 0.10;

const PT_COMMON_WORDS: &[&str] = &[
    "o", "a", "de", "que", "e", "do", "da", "em", "um", "para", "é", "com", "não", "uma", "os",
    "no", "se", "na", "por", "mais", "como", "mas", "foi", "ao", "ele", "das", "à", "seu", "sua",
    "ou",
];
const PT_DIACRITICS: &str = "áàâãéêíóôõúçÁÀÂÃÉÊÍÓÔÕÚÇ";

const EN_COMMON_WORDS: &[&str] = &[
    "the", "of", "and", "to", "a", "in", "is", "it", "you", "that", "he", "was", "for", "on",
    "are", "with", "as", "i", "his", "they", "be", "at", "one", "have", "this", "from", "or",
    "had", "by", "but",
];

struct Profile {
    common_words: &'static [&'static str],
    diacritics: &'static str,
}

fn profile_for(language: &str) -> Option<Profile> {
    let primary = language.split(['-', '_']).next().unwrap_or_default();
    match primary.to_ascii_lowercase().as_str() {
        "pt" => Some(Profile {
            common_words: PT_COMMON_WORDS,
            diacritics: PT_DIACRITICS,
        }),
        "en" => Some(Profile {
            common_words: EN_COMMON_WORDS,
            diacritics: "",
        }),
        _ => None,
    }
}

pub struct LanguageGate {
    meta: GateMeta,
    expected_language: String,
}

impl LanguageGate {
    pub fn new(name: &str, severity: Severity, expected_language: impl Into<String>) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            expected_language: expected_language.into(),
        }
    }
}

impl Gate for LanguageGate {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn severity(&self) -> Severity {
        self.meta.severity()
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Script
    }

    fn check(&self, artifact: &Artifact) -> Result<GateOutcome, GateError> {
        let script = self.meta.expect_script(artifact)?;
        let content = script.content();
        let lang = self.expected_language.as_str();

        let words: Vec<String> = content
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Ok(self
                .meta
                .warn("Script is empty, cannot verify language", codes::LANGUAGE_EMPTY)
                .with_detail("expected_language", lang));
        }

        let Some(profile) = profile_for(lang) else {
            return Ok(self
                .meta
                .pass(
                    format!("No language heuristic for {lang}; not checked"),
                    codes::LANGUAGE_OK,
                )
                .with_detail("expected_language", lang)
                .with_detail("heuristic", "none"));
        };

        let hits = words
            .iter()
            .filter(|w| profile.common_words.contains(&w.as_str()))
            .count();
        let ratio = hits as f64 / words.len() as f64;
        let has_diacritics = content.chars().any(|c| profile.diacritics.contains(c));
        let rounded = (ratio * 1000.0).round() / 1000.0;

        let outcome = if ratio < MIN_COMMON_WORD_RATIO && !has_diacritics {
            self.meta.warn(
                format!("Script may not be in {lang}"),
                codes::LANGUAGE_MISMATCH,
            )
        } else {
            self.meta
                .pass(format!("Script appears to be in {lang}"), codes::LANGUAGE_OK)
        };
        Ok(outcome
            .with_detail("expected_language", lang)
            .with_detail("common_word_ratio", rounded)
            .with_detail("has_diacritics", has_diacritics)
            .with_detail("total_words", words.len()))
    }
}
