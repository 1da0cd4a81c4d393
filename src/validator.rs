//! Purity validation: the zero-tolerance gate.
//!
//! A candidate is scored on five dimensions, each 0-100, combined with fixed
//! integer weights. Only an overall score of exactly 100 passes. Whenever any
//! dimension is below 100 the overall score is capped at 99.99, so rounding
//! can never turn an imperfect candidate into a passing one.

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::analyzer::{self, ScriptAnalysis};
use crate::cleaner::ContentCleaner;
use crate::config::{AlertSeverity, REQUIRED_PURITY};
use crate::i18n::{Language, Script};
use crate::terminology::{TerminologyManager, TerminologyValidation};

const WEIGHT_SCRIPT: f64 = 35.0;
const WEIGHT_TERMINOLOGY: f64 = 25.0;
const WEIGHT_ENCODING: f64 = 15.0;
const WEIGHT_COHERENCE: f64 = 15.0;
const WEIGHT_UI: f64 = 10.0;

/// Highest overall score an imperfect candidate can receive.
const IMPERFECT_CEILING: f64 = 99.99;

const ENCODING_PENALTY: f64 = 25.0;
const ARTIFACT_PENALTY: f64 = 25.0;
const REPETITION_PENALTY: f64 = 20.0;
const MIXED_WORD_PENALTY: f64 = 25.0;
const BRACKET_PENALTY: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PurityScore {
    pub overall: f64,
    pub script_purity: f64,
    pub terminology_consistency: f64,
    pub encoding_integrity: f64,
    pub contextual_coherence: f64,
    pub ui_artifact_removal: f64,
}

impl PurityScore {
    fn combine(
        script_purity: f64,
        terminology_consistency: f64,
        encoding_integrity: f64,
        contextual_coherence: f64,
        ui_artifact_removal: f64,
    ) -> Self {
        let dims = [
            script_purity,
            terminology_consistency,
            encoding_integrity,
            contextual_coherence,
            ui_artifact_removal,
        ];
        let weighted = WEIGHT_SCRIPT * script_purity
            + WEIGHT_TERMINOLOGY * terminology_consistency
            + WEIGHT_ENCODING * encoding_integrity
            + WEIGHT_COHERENCE * contextual_coherence
            + WEIGHT_UI * ui_artifact_removal;
        let mut overall = weighted / 100.0;
        if dims.iter().any(|d| *d < REQUIRED_PURITY) {
            overall = overall.min(IMPERFECT_CEILING);
        }
        Self {
            overall,
            script_purity,
            terminology_consistency,
            encoding_integrity,
            contextual_coherence,
            ui_artifact_removal,
        }
    }

    pub fn is_pure(&self) -> bool {
        self.overall == REQUIRED_PURITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    MixedScripts,
    ForeignFragment,
    CorruptedCharacter,
    TerminologyInconsistency,
    UiArtifact,
    Incoherence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurityViolation {
    pub violation_type: ViolationType,
    /// Byte span in the candidate, when the problem has one
    pub location: Option<(usize, usize)>,
    pub text: String,
    pub severity: AlertSeverity,
    pub suggested_fix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurityValidationResult {
    pub score: PurityScore,
    pub passed: bool,
    pub violations: Vec<PurityViolation>,
    pub script: ScriptAnalysis,
    pub terminology: TerminologyValidation,
}

fn penalized(count: usize, penalty: f64) -> f64 {
    (100.0 - count as f64 * penalty).max(0.0)
}

pub struct PurityValidator {
    cleaner: Arc<ContentCleaner>,
    terminology: Arc<TerminologyManager>,
}

impl PurityValidator {
    pub fn new(cleaner: Arc<ContentCleaner>, terminology: Arc<TerminologyManager>) -> Self {
        Self {
            cleaner,
            terminology,
        }
    }

    /// Score `text` as a candidate in `target`.
    pub fn validate(&self, text: &str, target: Language) -> PurityValidationResult {
        let mut violations = Vec::new();

        let script = analyzer::analyze_script(text, target.script());
        let script_purity = self.script_dimension(text, target, &script, &mut violations);

        let terminology = self.terminology.validate_consistency(text, target);
        for inconsistency in &terminology.inconsistencies {
            violations.push(PurityViolation {
                violation_type: ViolationType::TerminologyInconsistency,
                location: None,
                text: inconsistency.found.clone(),
                severity: AlertSeverity::Medium,
                suggested_fix: format!("Use the canonical term '{}'", inconsistency.expected),
            });
        }

        let encoding_issues = analyzer::find_encoding_issues(text);
        for issue in &encoding_issues {
            violations.push(PurityViolation {
                violation_type: ViolationType::CorruptedCharacter,
                location: Some((issue.start, issue.end)),
                text: issue.text.clone(),
                severity: AlertSeverity::Critical,
                suggested_fix: "Re-run encoding normalization on the source".to_string(),
            });
        }

        let artifacts = self.cleaner.find_artifacts(text);
        for (rule, start, end) in &artifacts {
            violations.push(PurityViolation {
                violation_type: ViolationType::UiArtifact,
                location: Some((*start, *end)),
                text: text[*start..*end].to_string(),
                severity: AlertSeverity::High,
                suggested_fix: format!("Strip interface artifact ({})", rule),
            });
        }

        let coherence = coherence_dimension(text, target, &mut violations);

        let score = PurityScore::combine(
            script_purity,
            terminology.score,
            penalized(encoding_issues.len(), ENCODING_PENALTY),
            coherence,
            penalized(artifacts.len(), ARTIFACT_PENALTY),
        );
        let passed = score.is_pure();
        if !passed {
            warn!(
                "Purity violation for {} candidate: {:.2} ({} findings)",
                target,
                score.overall,
                violations.len()
            );
        }

        PurityValidationResult {
            score,
            passed,
            violations,
            script,
            terminology,
        }
    }

    fn script_dimension(
        &self,
        text: &str,
        target: Language,
        script: &ScriptAnalysis,
        violations: &mut Vec<PurityViolation>,
    ) -> f64 {
        for span in &script.mixed_spans {
            violations.push(PurityViolation {
                violation_type: ViolationType::MixedScripts,
                location: Some((span.start, span.end)),
                text: span.text.clone(),
                severity: AlertSeverity::Critical,
                suggested_fix: format!("Remove or translate the {:?} run", span.script),
            });
        }

        // English reads as valid Latin script; count it against French output
        let mut english_letters = 0;
        if target.script() == Script::Latin {
            for fragment in analyzer::english_fragments(text) {
                english_letters += fragment.word.chars().count();
                violations.push(PurityViolation {
                    violation_type: ViolationType::ForeignFragment,
                    location: Some((fragment.start, fragment.end)),
                    text: fragment.word.clone(),
                    severity: AlertSeverity::High,
                    suggested_fix: format!("Translate '{}' into {}", fragment.word, target.name()),
                });
            }
        }

        let bearing = script.target_chars + script.foreign_chars;
        if bearing == 0 {
            return 0.0;
        }
        let clean = script.target_chars.saturating_sub(english_letters);
        clean as f64 / bearing as f64 * 100.0
    }
}

fn coherence_dimension(text: &str, target: Language, violations: &mut Vec<PurityViolation>) -> f64 {
    if text.trim().is_empty() {
        violations.push(PurityViolation {
            violation_type: ViolationType::Incoherence,
            location: None,
            text: String::new(),
            severity: AlertSeverity::Critical,
            suggested_fix: "Produce non-empty output".to_string(),
        });
        return 0.0;
    }

    let words = analyzer::words(text);
    let mut score: f64 = 100.0;

    // Same word three times in a row
    let lowered: Vec<String> = words.iter().map(|w| w.word.to_lowercase()).collect();
    for (i, window) in lowered.windows(3).enumerate() {
        if window[0] == window[1] && window[1] == window[2] {
            score -= REPETITION_PENALTY;
            violations.push(PurityViolation {
                violation_type: ViolationType::Incoherence,
                location: Some((words[i].start, words[i + 2].end)),
                text: words[i].word.clone(),
                severity: AlertSeverity::Medium,
                suggested_fix: "Remove the repeated word".to_string(),
            });
        }
    }

    // Words whose letters come from more than one script
    let expected = target.script();
    for word in &words {
        let scripts: Vec<Script> = word
            .word
            .chars()
            .filter_map(|c| analyzer::classify_char(c).script())
            .collect();
        if scripts.contains(&expected) && scripts.iter().any(|s| *s != expected) {
            score -= MIXED_WORD_PENALTY;
            violations.push(PurityViolation {
                violation_type: ViolationType::Incoherence,
                location: Some((word.start, word.end)),
                text: word.word.clone(),
                severity: AlertSeverity::High,
                suggested_fix: "Split or retranslate the mixed-script word".to_string(),
            });
        }
    }

    if !brackets_balanced(text) {
        score -= BRACKET_PENALTY;
        violations.push(PurityViolation {
            violation_type: ViolationType::Incoherence,
            location: None,
            text: String::new(),
            severity: AlertSeverity::Low,
            suggested_fix: "Balance brackets and quotation marks".to_string(),
        });
    }

    score.max(0.0)
}

fn brackets_balanced(text: &str) -> bool {
    let mut stack = Vec::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' | '«' => stack.push(c),
            ')' | ']' | '}' | '»' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    '}' => '{',
                    _ => '«',
                };
                if stack.pop() != Some(open) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty() && text.matches('"').count() % 2 == 0
}
