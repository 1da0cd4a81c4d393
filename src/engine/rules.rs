//! Dictionary-driven translation methods.
//!
//! None of these need a network: they are what keeps the pipeline producing
//! candidates when no backend is configured or every backend is down.

use anyhow::{bail, Result};

use crate::cleaner::ContentCleaner;
use crate::i18n::Language;
use crate::terminology::{LegalDomain, ScanToken, TermLookup, TerminologyManager};

/// Text produced by a method, with its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutput {
    pub text: String,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

/// Whole-text exact term lookup.
pub fn dictionary(
    terms: &TerminologyManager,
    text: &str,
    source: Language,
    target: Language,
    domain: Option<LegalDomain>,
) -> Result<RuleOutput> {
    match terms.lookup(text, source, target, domain) {
        TermLookup::Found(t) => Ok(RuleOutput {
            text: t.translation,
            confidence: t.confidence,
            warnings: Vec::new(),
        }),
        TermLookup::Suggestion(t) => bail!(
            "only a low-confidence suggestion ('{}', {:.2}) for the whole text",
            t.translation,
            t.confidence
        ),
        TermLookup::NotFound => bail!("text is not a dictionary term"),
    }
}

fn map_punctuation(s: &str, target: Language) -> String {
    s.chars()
        .map(|c| match (target, c) {
            (Language::French, '،') => ',',
            (Language::French, '؛') => ';',
            (Language::French, '؟') => '?',
            (Language::Arabic, ',') => '،',
            (Language::Arabic, ';') => '؛',
            (Language::Arabic, '?') => '؟',
            (_, other) => other,
        })
        .collect()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Greedy longest-phrase translation. Known phrases are replaced by their
/// dictionary rendering; unknown words pass through untouched, which the
/// purity gate will then reject or the hybrid method will clean away.
pub fn rule_based(
    terms: &TerminologyManager,
    text: &str,
    source: Language,
    target: Language,
    domain: Option<LegalDomain>,
) -> Result<RuleOutput> {
    let tokens = terms.scan(text, source, target, domain);
    if tokens.is_empty() {
        bail!("no words to translate");
    }

    let mut pieces = Vec::with_capacity(tokens.len());
    let mut warnings = Vec::new();
    let mut matched = 0usize;
    let mut confidence_sum = 0.0;

    for token in &tokens {
        match token {
            ScanToken::Matched {
                original,
                translation,
                confidence,
                lead,
                trail,
                ..
            } => {
                matched += 1;
                confidence_sum += confidence;
                if *confidence < terms.min_confidence() {
                    warnings.push(format!(
                        "Low-confidence rendering '{}' -> '{}' ({:.2})",
                        original, translation, confidence
                    ));
                }
                pieces.push(format!(
                    "{}{}{}",
                    map_punctuation(lead, target),
                    translation,
                    map_punctuation(trail, target)
                ));
            }
            ScanToken::Unmatched { original, lead, trail } => pieces.push(format!(
                "{}{}{}",
                map_punctuation(lead, target),
                original,
                map_punctuation(trail, target)
            )),
        }
    }

    if matched == 0 {
        bail!("no dictionary coverage for any of {} words", tokens.len());
    }

    let joined = pieces.join(" ");
    let text = match target {
        Language::French => capitalize_first(&joined),
        Language::Arabic => joined,
    };
    let coverage = matched as f64 / tokens.len() as f64;
    Ok(RuleOutput {
        text,
        confidence: (confidence_sum / matched as f64) * coverage,
        warnings,
    })
}

/// Rule-based translation followed by cleaning against the target language,
/// which strips the untranslated remainder.
pub fn hybrid(
    terms: &TerminologyManager,
    cleaner: &ContentCleaner,
    text: &str,
    source: Language,
    target: Language,
    domain: Option<LegalDomain>,
) -> Result<RuleOutput> {
    let draft = rule_based(terms, text, source, target, domain)?;
    let cleaned = cleaner.clean(&draft.text, target);
    if cleaned.is_empty() {
        bail!("nothing survived cleaning the rule-based draft");
    }

    let mut warnings = draft.warnings;
    if cleaned.was_modified() {
        warnings.push(format!(
            "Removed {} untranslated fragments from the rule-based draft",
            cleaned.removed_elements.len()
        ));
    }
    Ok(RuleOutput {
        text: capitalize_if_french(&cleaned.text, target),
        confidence: draft.confidence * cleaned.confidence,
        warnings,
    })
}

fn capitalize_if_french(text: &str, target: Language) -> String {
    match target {
        Language::French => capitalize_first(text),
        Language::Arabic => text.to_string(),
    }
}
