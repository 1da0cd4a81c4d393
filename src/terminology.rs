//! Legal terminology management.
//!
//! Bilingual, domain-scoped term dictionaries with confidence-weighted lookup
//! and consistency validation. Unknown terms never abort anything: lookup
//! records a miss and reports `TermLookup::NotFound`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use tracing::{debug, info, warn};

use crate::i18n::Language;

/// Minimum confidence for a term to be applied without review.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

/// Minimum confidence for a matched term to count as a legal concept.
pub const CONCEPT_MIN_CONFIDENCE: f64 = 0.8;

/// Legal domains a dictionary can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalDomain {
    General,
    Civil,
    Criminal,
    Commercial,
    Family,
    Administrative,
    Labor,
}

impl LegalDomain {
    pub const ALL: [LegalDomain; 7] = [
        LegalDomain::General,
        LegalDomain::Civil,
        LegalDomain::Criminal,
        LegalDomain::Commercial,
        LegalDomain::Family,
        LegalDomain::Administrative,
        LegalDomain::Labor,
    ];
}

/// A single bilingual term mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalTermEntry {
    pub source_term: String,
    pub target_term: String,
    pub source_language: Language,
    pub target_language: Language,
    #[serde(default)]
    pub definition: String,
    pub domain: LegalDomain,
    pub confidence: f64,
    pub last_verified: DateTime<Utc>,
    /// Known non-canonical renderings of `target_term`
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl LegalTermEntry {
    /// The canonical rendering of this entry in `language`, if it has one.
    fn rendering(&self, language: Language) -> Option<&str> {
        if language == self.target_language {
            Some(&self.target_term)
        } else if language == self.source_language {
            Some(&self.source_term)
        } else {
            None
        }
    }
}

/// A versioned dictionary for one legal domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalDictionary {
    pub domain: LegalDomain,
    pub version: String,
    pub authority: String,
    pub entries: Vec<LegalTermEntry>,
}

impl LegalDictionary {
    /// Load a dictionary from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary at {}", path.display()))?;
        let dictionary: LegalDictionary = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse dictionary at {}", path.display()))?;
        Ok(dictionary)
    }
}

/// A resolved term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegalTermTranslation {
    pub term: String,
    pub translation: String,
    pub domain: LegalDomain,
    pub confidence: f64,
    pub definition: String,
}

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TermLookup {
    Found(LegalTermTranslation),
    /// Matched, but below the confidence needed to apply silently
    Suggestion(LegalTermTranslation),
    NotFound,
}

impl TermLookup {
    pub fn translation(&self) -> Option<&LegalTermTranslation> {
        match self {
            TermLookup::Found(t) | TermLookup::Suggestion(t) => Some(t),
            TermLookup::NotFound => None,
        }
    }
}

/// A non-canonical rendering found in a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermInconsistency {
    pub found: String,
    pub expected: String,
    pub domain: LegalDomain,
    /// Byte offset in the lowercased text
    pub position: usize,
}

/// Result of checking a text against canonical renderings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminologyValidation {
    /// 0-100; 100 when no inconsistent rendering was found
    pub score: f64,
    pub recognized_terms: Vec<String>,
    pub inconsistencies: Vec<TermInconsistency>,
    /// Low-confidence terms worth a human check
    pub suggestions: Vec<String>,
}

impl TerminologyValidation {
    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }
}

/// A phrase the scanner can match, in normalized token form.
#[derive(Debug, Clone)]
struct Phrase {
    tokens: Vec<String>,
    term: String,
    translation: String,
    confidence: f64,
    domain: LegalDomain,
}

/// One unit of a scanned text.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanToken {
    Matched {
        /// Source words as they appeared
        original: String,
        translation: String,
        confidence: f64,
        domain: LegalDomain,
        /// Punctuation before the first and after the last word
        lead: String,
        trail: String,
    },
    Unmatched {
        original: String,
        lead: String,
        trail: String,
    },
}

impl ScanToken {
    pub fn is_matched(&self) -> bool {
        matches!(self, ScanToken::Matched { .. })
    }
}

// ==================== Stats ====================

/// Lookup counters.
#[derive(Debug, Default)]
pub struct TerminologyStats {
    lookups: AtomicUsize,
    hits: AtomicUsize,
    suggestions: AtomicUsize,
    misses: AtomicUsize,
}

/// Snapshot of lookup counters.
#[derive(Debug, Clone, Serialize)]
pub struct TerminologyReport {
    pub lookups: usize,
    pub hits: usize,
    pub suggestions: usize,
    pub misses: usize,
    /// Hits and suggestions as a percentage of lookups (0-100)
    pub match_rate: f64,
}

impl TerminologyStats {
    fn record(&self, outcome: &TermLookup) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            TermLookup::Found(_) => &self.hits,
            TermLookup::Suggestion(_) => &self.suggestions,
            TermLookup::NotFound => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> TerminologyReport {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);
        let suggestions = self.suggestions.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let match_rate = if lookups > 0 {
            ((hits + suggestions) as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };
        TerminologyReport {
            lookups,
            hits,
            suggestions,
            misses,
            match_rate,
        }
    }
}

// ==================== Manager ====================

/// Domain-scoped bilingual term lookup and validation.
pub struct TerminologyManager {
    dictionaries: RwLock<BTreeMap<LegalDomain, LegalDictionary>>,
    min_confidence: f64,
    stats: TerminologyStats,
}

impl Default for TerminologyManager {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Normalize a term for matching: lowercase, no Arabic diacritics or tatweel,
/// unified alef forms, typographic apostrophes folded to ASCII.
pub fn normalize_term(term: &str) -> String {
    term.trim()
        .chars()
        .filter(|c| !matches!(c, '\u{064B}'..='\u{0652}' | '\u{0640}'))
        .map(|c| match c {
            'أ' | 'إ' | 'آ' => 'ا',
            '’' | 'ʼ' => '\'',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split a raw token into (leading punctuation, core, trailing punctuation).
pub fn split_token(raw: &str) -> (&str, &str, &str) {
    let is_core = |c: char| c.is_alphanumeric();
    let start = raw.find(is_core).unwrap_or(raw.len());
    let end = raw.rfind(is_core).map(|i| i + raw[i..].chars().next().map_or(1, char::len_utf8));
    match end {
        Some(end) if end > start => (&raw[..start], &raw[start..end], &raw[end..]),
        _ => (raw, "", ""),
    }
}

fn term_tokens(term: &str) -> Vec<String> {
    term.split_whitespace()
        .map(|raw| normalize_term(split_token(raw).1))
        .filter(|t| !t.is_empty())
        .collect()
}

const FRENCH_ELISIONS: &[&str] = &["l'", "d'", "qu'", "n'", "s'", "j'"];

fn is_word_boundary(text: &str, start: usize, end: usize, language: Language) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let before_ok = match before {
        None => true,
        Some(c) if !c.is_alphabetic() => true,
        // Arabic attaches conjunctions and prepositions to the next word
        Some(c) if language == Language::Arabic && "وبلفك".contains(c) => text[..start]
            .chars()
            .rev()
            .nth(1)
            .map_or(true, |p| !p.is_alphabetic()),
        Some(_) => false,
    };
    before_ok && after.map_or(true, |c| !c.is_alphabetic())
}

fn find_term(haystack: &str, needle: &str, language: Language) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack
        .match_indices(needle)
        .map(|(pos, _)| pos)
        .filter(|pos| is_word_boundary(haystack, *pos, pos + needle.len(), language))
        .collect()
}

impl TerminologyManager {
    /// An empty manager.
    pub fn new(min_confidence: f64) -> Self {
        Self {
            dictionaries: RwLock::new(BTreeMap::new()),
            min_confidence,
            stats: TerminologyStats::default(),
        }
    }

    /// A manager seeded with the built-in dictionaries.
    pub fn with_builtin() -> Self {
        let manager = Self::new(DEFAULT_MIN_CONFIDENCE);
        for dictionary in builtin_dictionaries() {
            manager.add_dictionary(dictionary);
        }
        manager
    }

    /// Add or replace the dictionary for its domain.
    pub fn add_dictionary(&self, dictionary: LegalDictionary) {
        let mut dictionaries = match self.dictionaries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        info!(
            "Loaded {:?} dictionary v{} ({} entries, authority: {})",
            dictionary.domain,
            dictionary.version,
            dictionary.entries.len(),
            dictionary.authority
        );
        if let Some(previous) = dictionaries.insert(dictionary.domain, dictionary) {
            debug!("Replaced {:?} dictionary v{}", previous.domain, previous.version);
        }
    }

    /// Version of the loaded dictionary for `domain`.
    pub fn dictionary_version(&self, domain: LegalDomain) -> Option<String> {
        self.read().get(&domain).map(|d| d.version.clone())
    }

    pub fn stats(&self) -> &TerminologyStats {
        &self.stats
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<LegalDomain, LegalDictionary>> {
        match self.dictionaries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Look up a term. With a domain, that domain is searched first and the
    /// general dictionary second; without one, every domain is searched.
    pub fn lookup(
        &self,
        term: &str,
        source: Language,
        target: Language,
        domain: Option<LegalDomain>,
    ) -> TermLookup {
        let wanted = normalize_term(term);
        let dictionaries = self.read();

        let order: Vec<LegalDomain> = match domain {
            Some(LegalDomain::General) => vec![LegalDomain::General],
            Some(d) => vec![d, LegalDomain::General],
            None => LegalDomain::ALL.to_vec(),
        };

        let mut outcome = TermLookup::NotFound;
        'search: for d in order {
            let Some(dictionary) = dictionaries.get(&d) else {
                continue;
            };
            for entry in &dictionary.entries {
                if let Some(translation) = Self::resolve(entry, &wanted, source, target) {
                    let resolved = LegalTermTranslation {
                        term: term.trim().to_string(),
                        translation,
                        domain: entry.domain,
                        confidence: entry.confidence,
                        definition: entry.definition.clone(),
                    };
                    outcome = if entry.confidence >= self.min_confidence {
                        TermLookup::Found(resolved)
                    } else {
                        TermLookup::Suggestion(resolved)
                    };
                    break 'search;
                }
            }
        }
        drop(dictionaries);

        if outcome == TermLookup::NotFound {
            debug!("No dictionary match for '{}' ({} -> {})", term, source, target);
        }
        self.stats.record(&outcome);
        outcome
    }

    fn resolve(entry: &LegalTermEntry, wanted: &str, source: Language, target: Language) -> Option<String> {
        if entry.source_language == source && entry.target_language == target {
            (normalize_term(&entry.source_term) == wanted).then(|| entry.target_term.clone())
        } else if entry.source_language == target && entry.target_language == source {
            let canonical = normalize_term(&entry.target_term) == wanted;
            let alternative = entry.alternatives.iter().any(|alt| normalize_term(alt) == wanted);
            (canonical || alternative).then(|| entry.source_term.clone())
        } else {
            None
        }
    }

    /// Flag every known non-canonical rendering in `text`.
    pub fn validate_consistency(&self, text: &str, target: Language) -> TerminologyValidation {
        let haystack = normalize_term(text);
        let dictionaries = self.read();

        let mut recognized = Vec::new();
        let mut inconsistencies = Vec::new();
        let mut suggestions = Vec::new();

        for dictionary in dictionaries.values() {
            for entry in &dictionary.entries {
                let Some(canonical) = entry.rendering(target) else {
                    continue;
                };
                let canonical_norm = normalize_term(canonical);
                if !find_term(&haystack, &canonical_norm, target).is_empty() {
                    if !recognized.contains(&canonical.to_string()) {
                        recognized.push(canonical.to_string());
                    }
                    if entry.confidence < self.min_confidence {
                        suggestions.push(format!(
                            "Verify '{}' ({:?}, confidence {:.2})",
                            canonical, entry.domain, entry.confidence
                        ));
                    }
                }

                if target != entry.target_language {
                    continue;
                }
                for alternative in &entry.alternatives {
                    for position in find_term(&haystack, &normalize_term(alternative), target) {
                        inconsistencies.push(TermInconsistency {
                            found: alternative.clone(),
                            expected: canonical.to_string(),
                            domain: entry.domain,
                            position,
                        });
                    }
                }
            }
        }

        let total = recognized.len() + inconsistencies.len();
        let score = if inconsistencies.is_empty() {
            100.0
        } else {
            (recognized.len() as f64 / total as f64) * 100.0
        };
        if !inconsistencies.is_empty() {
            warn!(
                "{} terminology inconsistencies in {} text",
                inconsistencies.len(),
                target
            );
        }

        TerminologyValidation {
            score,
            recognized_terms: recognized,
            inconsistencies,
            suggestions,
        }
    }

    fn phrases(&self, source: Language, target: Language, domain: Option<LegalDomain>) -> Vec<Phrase> {
        let dictionaries = self.read();
        let mut phrases = Vec::new();
        for dictionary in dictionaries.values() {
            for entry in &dictionary.entries {
                if entry.source_language == source && entry.target_language == target {
                    phrases.push(Phrase {
                        tokens: term_tokens(&entry.source_term),
                        term: entry.source_term.clone(),
                        translation: entry.target_term.clone(),
                        confidence: entry.confidence,
                        domain: entry.domain,
                    });
                } else if entry.source_language == target && entry.target_language == source {
                    for rendering in std::iter::once(&entry.target_term).chain(&entry.alternatives) {
                        phrases.push(Phrase {
                            tokens: term_tokens(rendering),
                            term: rendering.clone(),
                            translation: entry.source_term.clone(),
                            confidence: entry.confidence,
                            domain: entry.domain,
                        });
                    }
                }
            }
        }
        phrases.retain(|p| !p.tokens.is_empty());
        phrases.sort_by(|a, b| {
            b.tokens
                .len()
                .cmp(&a.tokens.len())
                .then_with(|| (Some(b.domain) == domain).cmp(&(Some(a.domain) == domain)))
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });
        phrases
    }

    /// Greedy longest-phrase scan of `text`, resolving every known term to
    /// its rendering in `target`.
    pub fn scan(
        &self,
        text: &str,
        source: Language,
        target: Language,
        domain: Option<LegalDomain>,
    ) -> Vec<ScanToken> {
        let phrases = self.phrases(source, target, domain);
        let raw: Vec<(&str, &str, &str)> = text.split_whitespace().map(split_token).collect();
        let cores: Vec<String> = raw.iter().map(|(_, core, _)| normalize_term(core)).collect();

        let single = |core: &str| phrases.iter().find(|p| p.tokens.len() == 1 && p.tokens[0] == core);

        let mut out = Vec::new();
        let mut i = 0;
        while i < raw.len() {
            let matched = phrases.iter().find(|p| {
                i + p.tokens.len() <= cores.len()
                    && p.tokens.iter().zip(&cores[i..]).all(|(a, b)| a == b)
            });

            if let Some(phrase) = matched {
                let n = phrase.tokens.len();
                let original = raw[i..i + n]
                    .iter()
                    .map(|(_, core, _)| *core)
                    .collect::<Vec<_>>()
                    .join(" ");
                out.push(ScanToken::Matched {
                    original,
                    translation: phrase.translation.clone(),
                    confidence: phrase.confidence,
                    domain: phrase.domain,
                    lead: raw[i].0.to_string(),
                    trail: raw[i + n - 1].2.to_string(),
                });
                i += n;
                continue;
            }

            let (lead, core, trail) = raw[i];
            let affixed = self.resolve_affixed(&cores[i], source, &single);
            out.push(match affixed {
                Some((translation, confidence, domain)) => ScanToken::Matched {
                    original: core.to_string(),
                    translation,
                    confidence,
                    domain,
                    lead: lead.to_string(),
                    trail: trail.to_string(),
                },
                None => ScanToken::Unmatched {
                    original: core.to_string(),
                    lead: lead.to_string(),
                    trail: trail.to_string(),
                },
            });
            i += 1;
        }
        out
    }

    /// Resolve words carrying an attached conjunction, article or elision.
    fn resolve_affixed<'a, F>(&self, core: &str, source: Language, single: &F) -> Option<(String, f64, LegalDomain)>
    where
        F: Fn(&str) -> Option<&'a Phrase>,
    {
        match source {
            Language::Arabic => {
                if let Some(rest) = core.strip_prefix('و').filter(|r| r.chars().count() > 1) {
                    if let (Some(conj), Some(word)) = (single("و"), single(rest).or_else(|| {
                        rest.strip_prefix("ال").and_then(|bare| single(bare))
                    })) {
                        return Some((
                            format!("{} {}", conj.translation, word.translation),
                            word.confidence.min(conj.confidence),
                            word.domain,
                        ));
                    }
                }
                core.strip_prefix("ال")
                    .filter(|r| r.chars().count() > 1)
                    .and_then(|bare| single(bare))
                    .map(|p| (p.translation.clone(), p.confidence * 0.9, p.domain))
            }
            Language::French => FRENCH_ELISIONS
                .iter()
                .find_map(|e| core.strip_prefix(e))
                .and_then(|bare| single(bare))
                .map(|p| (p.translation.clone(), p.confidence * 0.9, p.domain)),
        }
    }

    /// Legal concepts (confident matches) found in `text`, rendered in `target`.
    pub fn concepts(&self, text: &str, source: Language, target: Language) -> Vec<LegalTermTranslation> {
        let mut concepts: Vec<LegalTermTranslation> = Vec::new();
        for token in self.scan(text, source, target, None) {
            if let ScanToken::Matched {
                original,
                translation,
                confidence,
                domain,
                ..
            } = token
            {
                if confidence >= CONCEPT_MIN_CONFIDENCE
                    && !concepts.iter().any(|c| c.translation == translation)
                {
                    concepts.push(LegalTermTranslation {
                        term: original,
                        translation,
                        domain,
                        confidence,
                        definition: String::new(),
                    });
                }
            }
        }
        concepts
    }
}

// ==================== Built-in Dictionaries ====================

fn seed_verified() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

fn seed(
    domain: LegalDomain,
    rows: &[(&str, &str, f64, &[&str])],
) -> LegalDictionary {
    LegalDictionary {
        domain,
        version: "2024.1".to_string(),
        authority: "Built-in seed lexicon".to_string(),
        entries: rows
            .iter()
            .map(|(ar, fr, confidence, alternatives)| LegalTermEntry {
                source_term: ar.to_string(),
                target_term: fr.to_string(),
                source_language: Language::Arabic,
                target_language: Language::French,
                definition: String::new(),
                domain,
                confidence: *confidence,
                last_verified: seed_verified(),
                alternatives: alternatives.iter().map(|a| a.to_string()).collect(),
            })
            .collect(),
    }
}

/// Seed dictionaries covering common Arabic/French legal vocabulary.
pub fn builtin_dictionaries() -> Vec<LegalDictionary> {
    vec![
        seed(
            LegalDomain::General,
            &[
                ("في", "dans", 0.6, &[]),
                ("من", "de", 0.6, &[]),
                ("على", "sur", 0.6, &[]),
                ("إلى", "à", 0.6, &[]),
                ("و", "et", 0.6, &[]),
                ("هذا", "ce", 0.6, &[]),
                ("هذه", "cette", 0.6, &[]),
                ("المادة", "l'article", 0.9, &[]),
                ("مادة", "article", 0.9, &[]),
                ("قانون", "loi", 0.85, &[]),
                ("القانون", "la loi", 0.85, &[]),
                ("محامي", "avocat", 0.95, &["homme de loi"]),
                ("المحامي", "l'avocat", 0.95, &[]),
                ("محكمة", "tribunal", 0.9, &[]),
                ("المحكمة", "le tribunal", 0.9, &[]),
                ("القاضي", "le juge", 0.9, &[]),
                ("قاضي", "juge", 0.9, &[]),
                ("قرار", "décision", 0.85, &[]),
                ("القرار", "la décision", 0.85, &[]),
                ("ملف", "dossier", 0.8, &[]),
                ("ملفات", "dossiers", 0.8, &[]),
                ("الملف", "le dossier", 0.8, &[]),
                ("تحليل", "analyse", 0.75, &[]),
                ("وثيقة", "document", 0.8, &[]),
                ("طلب", "demande", 0.8, &[]),
                ("حق", "droit", 0.8, &[]),
                ("حقوق", "droits", 0.8, &[]),
                ("عقد", "contrat", 0.9, &[]),
                ("العقد", "le contrat", 0.9, &[]),
                ("الحكم", "le jugement", 0.9, &[]),
                ("حكم", "jugement", 0.9, &[]),
            ],
        ),
        seed(
            LegalDomain::Criminal,
            &[
                ("قانون الإجراءات الجنائية", "Code de procédure pénale", 0.98, &[]),
                ("الإجراءات الجنائية", "procédure pénale", 0.95, &[]),
                ("القانون الجنائي", "droit pénal", 0.95, &[]),
                ("الشهود", "les témoins", 0.95, &[]),
                ("شاهد", "témoin", 0.95, &[]),
                ("الشاهد", "le témoin", 0.95, &[]),
                ("المتهم", "l'accusé", 0.95, &[]),
                ("جريمة", "infraction", 0.9, &["méfait"]),
                ("النيابة العامة", "le ministère public", 0.95, &["l'accusation publique"]),
                ("عقوبة", "peine", 0.9, &[]),
                ("جنائي", "pénal", 0.85, &[]),
                ("الجنائية", "pénale", 0.8, &[]),
                ("الإجراءات", "la procédure", 0.8, &[]),
            ],
        ),
        seed(
            LegalDomain::Civil,
            &[
                ("القانون المدني", "Code civil", 0.95, &[]),
                ("المسؤولية المدنية", "responsabilité civile", 0.95, &[]),
                ("مدني", "civil", 0.85, &[]),
                ("تعويض", "indemnisation", 0.9, &["dédommagement"]),
                ("الدعوى", "l'action", 0.85, &[]),
                ("المدعي", "le demandeur", 0.9, &["le plaignant"]),
                ("المدعى عليه", "le défendeur", 0.9, &[]),
            ],
        ),
        seed(
            LegalDomain::Commercial,
            &[
                ("القانون التجاري", "droit commercial", 0.95, &[]),
                ("السجل التجاري", "registre du commerce", 0.95, &[]),
                ("شركة", "société", 0.9, &["compagnie"]),
                ("تجاري", "commercial", 0.85, &[]),
                ("إفلاس", "faillite", 0.9, &[]),
            ],
        ),
        seed(
            LegalDomain::Family,
            &[
                ("قانون الأسرة", "Code de la famille", 0.95, &[]),
                ("زواج", "mariage", 0.9, &[]),
                ("طلاق", "divorce", 0.9, &[]),
                ("حضانة", "garde", 0.85, &["tutelle parentale"]),
                ("نفقة", "pension alimentaire", 0.9, &[]),
                ("الميراث", "la succession", 0.9, &["l'héritage"]),
            ],
        ),
        seed(
            LegalDomain::Administrative,
            &[
                ("المحكمة الإدارية", "le tribunal administratif", 0.95, &[]),
                ("قرار إداري", "acte administratif", 0.9, &["décision administrative"]),
                ("إداري", "administratif", 0.85, &[]),
                ("الإدارة", "l'administration", 0.85, &[]),
                ("مرسوم", "décret", 0.9, &[]),
            ],
        ),
        seed(
            LegalDomain::Labor,
            &[
                ("قانون الشغل", "Code du travail", 0.95, &[]),
                ("عقد العمل", "contrat de travail", 0.95, &["contrat d'emploi"]),
                ("العامل", "le salarié", 0.9, &["l'ouvrier"]),
                ("صاحب العمل", "l'employeur", 0.9, &["le patron"]),
                ("الأجر", "le salaire", 0.9, &[]),
                ("فصل", "licenciement", 0.5, &[]),
            ],
        ),
    ]
}
