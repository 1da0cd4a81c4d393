//! Content cleaning.
//!
//! Strips everything that must never reach a translation method or a caller:
//! encoding garbage, interface artifacts, and runs of any script other than
//! the one the text is expected to be written in. Cleaning runs passes until
//! the text stops changing, so `clean(clean(x)) == clean(x)`.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::analyzer::{self, CharClass};
use crate::i18n::Language;

/// Upper bound on cleaning passes. Every pass that changes the text removes or
/// normalizes at least one character, so real inputs settle in two or three.
const MAX_PASSES: usize = 32;

/// A configurable rule describing something to strip.
#[derive(Debug, Clone)]
pub enum CleaningRule {
    /// Exact string, case-sensitive
    Literal(String),
    /// Regular expression
    Pattern(Regex),
    /// Inclusive character range, removed wherever it appears
    ScriptRange(char, char),
}

impl CleaningRule {
    pub fn literal(text: impl Into<String>) -> Self {
        CleaningRule::Literal(text.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(CleaningRule::Pattern)
    }

    fn removal_reason(&self) -> RemovalReason {
        match self {
            CleaningRule::Literal(_) | CleaningRule::Pattern(_) => RemovalReason::InterfaceArtifact,
            CleaningRule::ScriptRange(_, _) => RemovalReason::ForeignScript,
        }
    }

    /// Byte ranges this rule matches in `text`.
    ///
    /// Literal and pattern matches that begin or end with a Latin letter are
    /// only accepted when the neighbouring character on that side is not a
    /// Latin letter, so `Pro` matches in `محاميProتحليل` but not in `Procédure`.
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match self {
            CleaningRule::Literal(literal) if literal.is_empty() => Vec::new(),
            CleaningRule::Literal(literal) => text
                .match_indices(literal.as_str())
                .map(|(start, m)| (start, start + m.len()))
                .filter(|(start, end)| standalone(text, *start, *end))
                .collect(),
            CleaningRule::Pattern(regex) => regex
                .find_iter(text)
                .filter(|m| !m.as_str().is_empty())
                .map(|m| (m.start(), m.end()))
                .filter(|(start, end)| standalone(text, *start, *end))
                .collect(),
            CleaningRule::ScriptRange(from, to) => {
                let mut ranges: Vec<(usize, usize)> = Vec::new();
                for (idx, c) in text.char_indices() {
                    if (*from..=*to).contains(&c) {
                        let end = idx + c.len_utf8();
                        match ranges.last_mut() {
                            Some(last) if last.1 == idx => last.1 = end,
                            _ => ranges.push((idx, end)),
                        }
                    }
                }
                ranges
            }
        }
    }
}

impl PartialEq for CleaningRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CleaningRule::Literal(a), CleaningRule::Literal(b)) => a == b,
            (CleaningRule::Pattern(a), CleaningRule::Pattern(b)) => a.as_str() == b.as_str(),
            (CleaningRule::ScriptRange(a1, a2), CleaningRule::ScriptRange(b1, b2)) => {
                a1 == b1 && a2 == b2
            }
            _ => false,
        }
    }
}

impl fmt::Display for CleaningRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleaningRule::Literal(s) => write!(f, "literal:{}", s),
            CleaningRule::Pattern(r) => write!(f, "pattern:{}", r.as_str()),
            CleaningRule::ScriptRange(a, b) => {
                write!(f, "range:U+{:04X}-U+{:04X}", *a as u32, *b as u32)
            }
        }
    }
}

fn is_latin_letter(c: char) -> bool {
    matches!(analyzer::classify_char(c), CharClass::Letter(crate::i18n::Script::Latin))
}

fn standalone(text: &str, start: usize, end: usize) -> bool {
    let matched = &text[start..end];
    let starts_latin = matched.chars().next().is_some_and(is_latin_letter);
    let ends_latin = matched.chars().next_back().is_some_and(is_latin_letter);
    let before_ok = !starts_latin || !text[..start].chars().next_back().is_some_and(is_latin_letter);
    let after_ok = !ends_latin || !text[end..].chars().next().is_some_and(is_latin_letter);
    before_ok && after_ok
}

/// Interface artifacts and foreign scripts stripped by default.
pub fn default_cleaning_rules() -> Vec<CleaningRule> {
    let mut rules: Vec<CleaningRule> = [
        "AUTO-TRANSLATE",
        "AUTO_TRANSLATE",
        "AUTOTRANSLATE",
        "[object Object]",
        "Loading...",
        "Click here",
        "Powered by",
        "Translated by",
        "undefined",
        "NaN",
        "Premium",
        "BETA",
        "Beta",
        "PRO",
        "Pro",
    ]
    .into_iter()
    .map(CleaningRule::literal)
    .collect();

    // Version and build markers, template placeholders, stray markup
    for pattern in [
        r"[Vv]\d+(?:\.\d+)*",
        r"(?i:build)\s*#?\s*\d+",
        r"\{\{[^}]*\}\}",
        r"</?[A-Za-z][^<>]{0,40}>",
    ] {
        if let Ok(rule) = CleaningRule::pattern(pattern) {
            rules.push(rule);
        }
    }

    rules.push(CleaningRule::ScriptRange('\u{0400}', '\u{052F}'));
    rules.push(CleaningRule::ScriptRange('\u{0590}', '\u{05FF}'));
    rules.push(CleaningRule::ScriptRange('\u{4E00}', '\u{9FFF}'));
    rules
}

/// Why a piece of text was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    EncodingCorruption,
    InterfaceArtifact,
    ForeignScript,
}

/// An audit record of one removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedElement {
    /// Rule or detector that matched
    pub pattern: String,
    /// Byte offsets into the text as it stood when the removing step ran
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub reason: RemovalReason,
    /// Cleaning pass the removal happened in (0-based)
    pub pass: usize,
}

/// Cleaning steps, recorded once each in the order first applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningAction {
    EncodingNormalized,
    PunctuationNormalized,
    ArtifactsRemoved,
    ForeignScriptRemoved,
    WhitespaceCollapsed,
}

/// Result of cleaning a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedContent {
    pub text: String,
    /// Language the text was cleaned against
    pub expected: Language,
    pub removed_elements: Vec<RemovedElement>,
    pub actions: Vec<CleaningAction>,
    /// Share of the original non-whitespace characters that survived (0-1)
    pub confidence: f64,
}

impl CleanedContent {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn was_modified(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Known mojibake sequences with their intended character.
const MOJIBAKE_REPAIRS: &[(&str, &str)] = &[
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã«", "ë"),
    ("Ã\u{A0}", "à"),
    ("Ã¢", "â"),
    ("Ã§", "ç"),
    ("Ã´", "ô"),
    ("Ã®", "î"),
    ("Ã¯", "ï"),
    ("Ã¹", "ù"),
    ("Ã»", "û"),
    ("Ã‰", "É"),
    ("â€™", "’"),
    ("â€œ", "“"),
    ("Å“", "œ"),
];

/// Strips known-bad content from text.
#[derive(Debug, Clone)]
pub struct ContentCleaner {
    rules: Vec<CleaningRule>,
}

impl Default for ContentCleaner {
    fn default() -> Self {
        Self::new(default_cleaning_rules())
    }
}

struct Pass<'a> {
    index: usize,
    removed: &'a mut Vec<RemovedElement>,
    actions: &'a mut Vec<CleaningAction>,
}

impl Pass<'_> {
    fn act(&mut self, action: CleaningAction) {
        if !self.actions.contains(&action) {
            self.actions.push(action);
        }
    }

    /// Replace `ranges` (sorted, non-overlapping) with `replacement`.
    fn remove(
        &mut self,
        text: &str,
        ranges: &[(usize, usize)],
        replacement: &str,
        pattern: &str,
        reason: RemovalReason,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for &(start, end) in ranges {
            if start < cursor {
                continue;
            }
            out.push_str(&text[cursor..start]);
            out.push_str(replacement);
            self.removed.push(RemovedElement {
                pattern: pattern.to_string(),
                start,
                end,
                text: text[start..end].to_string(),
                reason,
                pass: self.index,
            });
            cursor = end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}

impl ContentCleaner {
    pub fn new(rules: Vec<CleaningRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CleaningRule] {
        &self.rules
    }

    /// Clean `text` so that only content valid in `expected` remains.
    pub fn clean(&self, text: &str, expected: Language) -> CleanedContent {
        let mut removed = Vec::new();
        let mut actions = Vec::new();
        let mut current = text.to_string();

        for index in 0..MAX_PASSES {
            let mut pass = Pass {
                index,
                removed: &mut removed,
                actions: &mut actions,
            };
            let next = self.clean_pass(&current, expected, &mut pass);
            if next == current {
                break;
            }
            current = next;
        }

        let before = non_whitespace_len(text);
        let after = non_whitespace_len(&current);
        let confidence = if before == 0 {
            0.0
        } else {
            after as f64 / before as f64
        };

        debug!(
            "Cleaned {} chars into {} ({} removals, expected {})",
            before,
            after,
            removed.len(),
            expected
        );

        CleanedContent {
            text: current,
            expected,
            removed_elements: removed,
            actions,
            confidence,
        }
    }

    /// Interface-artifact matches (literal and pattern rules) present in `text`.
    pub fn find_artifacts(&self, text: &str) -> Vec<(String, usize, usize)> {
        self.rules
            .iter()
            .filter(|rule| rule.removal_reason() == RemovalReason::InterfaceArtifact)
            .flat_map(|rule| {
                rule.find_matches(text)
                    .into_iter()
                    .map(move |(start, end)| (rule.to_string(), start, end))
            })
            .collect()
    }

    fn clean_pass(&self, text: &str, expected: Language, pass: &mut Pass<'_>) -> String {
        let text = normalize_encoding(text, pass);
        let text = normalize_punctuation(&text, expected, pass);

        let mut text = text;
        for rule in &self.rules {
            let ranges = rule.find_matches(&text);
            if ranges.is_empty() {
                continue;
            }
            let reason = rule.removal_reason();
            text = pass.remove(&text, &ranges, " ", &rule.to_string(), reason);
            pass.act(match reason {
                RemovalReason::ForeignScript => CleaningAction::ForeignScriptRemoved,
                _ => CleaningAction::ArtifactsRemoved,
            });
        }

        let analysis = analyzer::analyze_script(&text, expected.script());
        if !analysis.mixed_spans.is_empty() {
            let mut out = String::with_capacity(text.len());
            let mut cursor = 0;
            for span in &analysis.mixed_spans {
                out.push_str(&text[cursor..span.start]);
                out.push(' ');
                pass.removed.push(RemovedElement {
                    pattern: format!("script:{:?}", span.script),
                    start: span.start,
                    end: span.end,
                    text: span.text.clone(),
                    reason: RemovalReason::ForeignScript,
                    pass: pass.index,
                });
                cursor = span.end;
            }
            out.push_str(&text[cursor..]);
            text = out;
            pass.act(CleaningAction::ForeignScriptRemoved);
        }

        let collapsed = collapse_whitespace(&text);
        if collapsed != text {
            pass.act(CleaningAction::WhitespaceCollapsed);
        }
        collapsed
    }
}

fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

fn normalize_encoding(text: &str, pass: &mut Pass<'_>) -> String {
    let mut out = text.to_string();
    for (broken, fixed) in MOJIBAKE_REPAIRS {
        if out.contains(broken) {
            let ranges: Vec<(usize, usize)> = out
                .match_indices(broken)
                .map(|(start, m)| (start, start + m.len()))
                .collect();
            out = pass.remove(&out, &ranges, fixed, "mojibake-repair", RemovalReason::EncodingCorruption);
            pass.act(CleaningAction::EncodingNormalized);
        }
    }

    let ranges: Vec<(usize, usize)> = analyzer::find_encoding_issues(&out)
        .into_iter()
        .map(|issue| (issue.start, issue.end))
        .collect();
    if !ranges.is_empty() {
        out = pass.remove(&out, &ranges, "", "encoding", RemovalReason::EncodingCorruption);
        pass.act(CleaningAction::EncodingNormalized);
    }
    out
}

fn latin_equivalent(c: char) -> Option<char> {
    match c {
        '،' => Some(','),
        '؛' => Some(';'),
        '؟' => Some('?'),
        '٪' => Some('%'),
        '\u{0660}'..='\u{0669}' => char::from_digit(c as u32 - 0x0660, 10),
        '\u{06F0}'..='\u{06F9}' => char::from_digit(c as u32 - 0x06F0, 10),
        _ => None,
    }
}

fn normalize_punctuation(text: &str, expected: Language, pass: &mut Pass<'_>) -> String {
    if expected != Language::French || !text.chars().any(|c| latin_equivalent(c).is_some()) {
        return text.to_string();
    }
    pass.act(CleaningAction::PunctuationNormalized);
    text.chars().map(|c| latin_equivalent(c).unwrap_or(c)).collect()
}

fn collapse_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = unified
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        blank_run = 0;
        out.push_str(&line);
    }
    out
}
