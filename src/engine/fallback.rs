//! Fallback synthesis.
//!
//! When no method yields a pure translation, the gateway asks this module for
//! a professional statement in the target language describing what the source
//! is about. The statement is assembled only from localized template strings
//! and dictionary renderings, so it never contains source-language text.

use serde::Serialize;
use std::sync::Arc;

use crate::engine::TranslationMethod;
use crate::gateway::ContentType;
use crate::i18n::{Language, LanguageStrings};
use crate::terminology::{LegalDomain, TerminologyManager};

/// At most this many notions are listed in a fallback statement.
const MAX_LISTED_CONCEPTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Professional,
    Public,
}

/// What the source text is about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentIntent {
    pub category: LegalDomain,
    /// Legal notions found in the source, rendered in the target language
    pub concepts: Vec<String>,
    pub complexity: Complexity,
    pub audience: Audience,
}

/// A synthesized statement.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackContent {
    pub text: String,
    pub method: TranslationMethod,
    pub confidence: f64,
}

pub struct FallbackGenerator {
    terminology: Arc<TerminologyManager>,
}

fn category_name(strings: &LanguageStrings, category: LegalDomain) -> &'static str {
    match category {
        LegalDomain::Civil => strings.category_civil,
        LegalDomain::Criminal => strings.category_criminal,
        LegalDomain::Commercial => strings.category_commercial,
        LegalDomain::Family => strings.category_family,
        LegalDomain::Administrative => strings.category_administrative,
        LegalDomain::Labor => strings.category_labor,
        LegalDomain::General => strings.category_general,
    }
}

impl FallbackGenerator {
    pub fn new(terminology: Arc<TerminologyManager>) -> Self {
        Self { terminology }
    }

    /// Classify the original request text.
    pub fn classify(
        &self,
        text: &str,
        source: Language,
        target: Language,
        content_type: ContentType,
    ) -> ContentIntent {
        let found = self.terminology.concepts(text, source, target);

        // Most frequent specialised domain wins; ties go to the first seen
        let mut tally: Vec<(LegalDomain, usize)> = Vec::new();
        for concept in found.iter().filter(|c| c.domain != LegalDomain::General) {
            match tally.iter_mut().find(|(d, _)| *d == concept.domain) {
                Some((_, n)) => *n += 1,
                None => tally.push((concept.domain, 1)),
            }
        }
        let category = tally
            .iter()
            .fold(None, |best: Option<(LegalDomain, usize)>, &(d, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((d, n)),
            })
            .map_or(LegalDomain::General, |(d, _)| d);

        let words = text.split_whitespace().count();
        let complexity = if words > 120 || found.len() > 8 {
            Complexity::Complex
        } else if words > 25 || found.len() > 3 {
            Complexity::Moderate
        } else {
            Complexity::Simple
        };

        let audience = match content_type {
            ContentType::LegalDocument => Audience::Professional,
            ContentType::ChatMessage | ContentType::UiText => Audience::Public,
        };

        ContentIntent {
            category,
            concepts: found.into_iter().map(|c| c.translation).collect(),
            complexity,
            audience,
        }
    }

    /// Build a statement for `intent` in `target`.
    pub fn generate(&self, intent: &ContentIntent, target: Language) -> FallbackContent {
        let strings = target.strings();
        let mut sentences = vec![strings
            .fallback_intro
            .replace("{category}", category_name(strings, intent.category))];

        if !intent.concepts.is_empty() {
            let listed: Vec<&str> = intent
                .concepts
                .iter()
                .take(MAX_LISTED_CONCEPTS)
                .map(String::as_str)
                .collect();
            sentences.push(
                strings
                    .fallback_concepts
                    .replace("{concepts}", &listed.join(strings.concept_separator)),
            );
        }
        if intent.complexity == Complexity::Complex {
            sentences.push(strings.fallback_complex_notice.to_string());
        }
        sentences.push(
            match intent.audience {
                Audience::Professional => strings.fallback_review_notice,
                Audience::Public => strings.fallback_public_notice,
            }
            .to_string(),
        );

        let (method, confidence) = if intent.concepts.is_empty() {
            (TranslationMethod::Template, 0.5)
        } else {
            (TranslationMethod::FallbackGenerated, 0.6)
        };
        FallbackContent {
            text: sentences.join(" "),
            method,
            confidence,
        }
    }

    /// Statement used when the request carried no usable text.
    pub fn empty_input(&self, target: Language) -> FallbackContent {
        let strings = target.strings();
        FallbackContent {
            text: format!("{} {}", strings.empty_input_notice, strings.fallback_public_notice),
            method: TranslationMethod::Template,
            confidence: 0.5,
        }
    }

    /// Domain-neutral last resort.
    pub fn emergency(&self, target: Language) -> FallbackContent {
        FallbackContent {
            text: target.strings().emergency_generic.to_string(),
            method: TranslationMethod::EmergencyGeneric,
            confidence: 0.3,
        }
    }
}
