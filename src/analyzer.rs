//! Script and word analysis.
//!
//! Classifies every character by writing system and every word by language
//! affinity. Everything here is a pure function of its input; empty input
//! yields a zeroed analysis.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::i18n::Script;

/// Classification of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// A letter of the given script
    Letter(Script),
    /// A non-letter that still belongs to a script block (Arabic comma,
    /// Arabic-Indic digit, tatweel, ...)
    ScriptMark(Script),
    /// ASCII digit
    Digit,
    /// Whitespace, ASCII punctuation and symbols shared by every script
    Neutral,
}

impl CharClass {
    /// The script this character carries, if any.
    pub fn script(&self) -> Option<Script> {
        match self {
            CharClass::Letter(s) | CharClass::ScriptMark(s) => Some(*s),
            CharClass::Digit | CharClass::Neutral => None,
        }
    }
}

/// Classify a character by script block.
pub fn classify_char(c: char) -> CharClass {
    if c.is_ascii_digit() {
        return CharClass::Digit;
    }
    let script = match c as u32 {
        0x41..=0x5A | 0x61..=0x7A => Some(Script::Latin),
        0xD7 | 0xF7 => None,
        0xC0..=0x24F | 0x1E00..=0x1EFF | 0xFB00..=0xFB06 => Some(Script::Latin),
        0x370..=0x3FF | 0x1F00..=0x1FFF => Some(Script::Greek),
        0x400..=0x52F => Some(Script::Cyrillic),
        0x590..=0x5FF => Some(Script::Hebrew),
        0x600..=0x6FF | 0x750..=0x77F | 0x8A0..=0x8FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFE => {
            Some(Script::Arabic)
        }
        0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF => {
            Some(Script::Cjk)
        }
        _ if c.is_alphabetic() => Some(Script::Other),
        _ => None,
    };

    match script {
        Some(s) if c.is_alphabetic() => CharClass::Letter(s),
        Some(s) => CharClass::ScriptMark(s),
        None => CharClass::Neutral,
    }
}

/// A contiguous run of characters in a script other than the expected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSpan {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    pub script: Script,
    pub text: String,
}

/// Character-level script statistics for a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptAnalysis {
    pub total_chars: usize,
    /// Script-bearing characters in the expected script
    pub target_chars: usize,
    /// Script-bearing characters in any other script
    pub foreign_chars: usize,
    /// Digits, whitespace and shared punctuation
    pub other_chars: usize,
    pub counts: BTreeMap<Script, usize>,
    /// Share of each script among script-bearing characters (0-100)
    pub percentages: BTreeMap<Script, f64>,
    pub target_percentage: f64,
    pub foreign_percentage: f64,
    pub dominant_script: Option<Script>,
    pub mixed_spans: Vec<ScriptSpan>,
    /// True when the text contains no foreign script at all
    pub is_pure_script: bool,
}

impl ScriptAnalysis {
    fn zeroed() -> Self {
        Self {
            total_chars: 0,
            target_chars: 0,
            foreign_chars: 0,
            other_chars: 0,
            counts: BTreeMap::new(),
            percentages: BTreeMap::new(),
            target_percentage: 0.0,
            foreign_percentage: 0.0,
            dominant_script: None,
            mixed_spans: Vec::new(),
            is_pure_script: false,
        }
    }
}

/// Analyze a text against the script it is expected to be written in.
pub fn analyze_script(text: &str, expected: Script) -> ScriptAnalysis {
    if text.is_empty() {
        return ScriptAnalysis::zeroed();
    }

    let mut analysis = ScriptAnalysis::zeroed();
    let mut current: Option<ScriptSpan> = None;

    for (idx, c) in text.char_indices() {
        analysis.total_chars += 1;
        let script = classify_char(c).script();

        match script {
            Some(s) => {
                *analysis.counts.entry(s).or_insert(0) += 1;
                if s == expected {
                    analysis.target_chars += 1;
                } else {
                    analysis.foreign_chars += 1;
                }
            }
            None => analysis.other_chars += 1,
        }

        let foreign = script.filter(|s| *s != expected);
        match (&mut current, foreign) {
            (Some(span), Some(s)) if span.script == s => {
                span.end = idx + c.len_utf8();
                span.text.push(c);
            }
            (_, Some(s)) => {
                if let Some(done) = current.take() {
                    analysis.mixed_spans.push(done);
                }
                current = Some(ScriptSpan {
                    start: idx,
                    end: idx + c.len_utf8(),
                    script: s,
                    text: c.to_string(),
                });
            }
            (_, None) => {
                if let Some(done) = current.take() {
                    analysis.mixed_spans.push(done);
                }
            }
        }
    }
    if let Some(done) = current.take() {
        analysis.mixed_spans.push(done);
    }

    let bearing = analysis.target_chars + analysis.foreign_chars;
    if bearing > 0 {
        for (script, count) in &analysis.counts {
            analysis
                .percentages
                .insert(*script, (*count as f64 / bearing as f64) * 100.0);
        }
        analysis.target_percentage = (analysis.target_chars as f64 / bearing as f64) * 100.0;
        analysis.foreign_percentage = (analysis.foreign_chars as f64 / bearing as f64) * 100.0;
    }
    analysis.dominant_script = analysis
        .counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(script, _)| *script);
    analysis.is_pure_script = analysis.foreign_chars == 0;

    analysis
}

// ==================== Word Analysis ====================

/// Languages a word can show affinity for. English is never a valid target,
/// but it is the most common contamination in legal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageAffinity {
    French,
    Arabic,
    English,
}

/// Word-level language affinity for a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordAnalysis {
    pub total_words: usize,
    /// Affinity score per language (0-100)
    pub scores: BTreeMap<LanguageAffinity, f64>,
    /// Share of words recognized by any language list (0-1)
    pub recognized_ratio: f64,
    pub dominant: Option<LanguageAffinity>,
    /// Confidence in `dominant` (0-1)
    pub confidence: f64,
}

/// A single word located in a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
    pub word: String,
}

const FRENCH_WORDS: &[&str] = &[
    "le", "la", "les", "l", "de", "du", "des", "d", "et", "en", "un", "une", "dans", "pour",
    "par", "sur", "au", "aux", "est", "sont", "qui", "que", "qu", "ne", "pas", "avec", "ce",
    "cette", "ces", "son", "sa", "ses", "leur", "selon", "entre", "article", "articles", "loi",
    "code", "tribunal", "cour", "juge", "avocat", "contrat", "procédure", "pénal", "pénale",
    "civil", "civile", "témoin", "témoins", "droit", "partie", "parties", "jugement", "affaire",
    "dossier", "plainte", "accusé", "défendeur", "demandeur", "audience", "décision",
];

/// English words that are never valid French. Homographs of French words
/// ("court", "for", "are", "translation") must not be listed.
const ENGLISH_ONLY_WORDS: &[&str] = &[
    "the", "and", "with", "of", "to", "from", "by", "is", "was", "were", "this", "that",
    "these", "those", "which", "shall", "defined", "define", "defines", "translate",
    "translated", "click", "loading", "error", "settings", "submit", "cancel", "undefined",
    "null", "please", "defendant", "plaintiff", "witness", "witnesses", "lawyer", "attorney",
    "judge", "contract", "agreement", "criminal", "procedure", "law", "hearing", "ruling",
    "pursuant", "hereby", "whereas",
];

const ARABIC_WORDS: &[&str] = &[
    "في", "من", "على", "إلى", "عن", "و", "أن", "التي", "الذي", "هذا", "هذه", "قانون", "المادة",
    "محكمة", "المحكمة", "القاضي", "محامي", "المحامي", "عقد", "العقد", "الشهود", "الجنائية",
    "المدني", "الإجراءات", "الدعوى", "الحكم", "المتهم", "الطرف", "الأطراف",
];

const FRENCH_DIACRITICS: &[char] = &[
    'é', 'è', 'ê', 'ë', 'à', 'â', 'ç', 'ô', 'û', 'ù', 'î', 'ï', 'œ',
];

static WORD_REGEX: OnceLock<Regex> = OnceLock::new();

fn word_regex() -> &'static Regex {
    WORD_REGEX.get_or_init(|| Regex::new(r"[\p{L}\p{M}]+").expect("valid word regex"))
}

/// Split text into words (letter runs; apostrophes and digits separate words).
pub fn words(text: &str) -> Vec<WordSpan> {
    word_regex()
        .find_iter(text)
        .map(|m| WordSpan {
            start: m.start(),
            end: m.end(),
            word: m.as_str().to_string(),
        })
        .collect()
}

/// Analyze word-level language affinity.
pub fn analyze_words(text: &str) -> WordAnalysis {
    let words = words(text);
    let total = words.len();
    let mut scores = BTreeMap::new();
    scores.insert(LanguageAffinity::French, 0.0);
    scores.insert(LanguageAffinity::Arabic, 0.0);
    scores.insert(LanguageAffinity::English, 0.0);

    if total == 0 {
        return WordAnalysis {
            total_words: 0,
            scores,
            recognized_ratio: 0.0,
            dominant: None,
            confidence: 0.0,
        };
    }

    let mut french = 0.0;
    let mut arabic = 0.0;
    let mut english = 0.0;
    let mut recognized = 0usize;

    for span in &words {
        let lower = span.word.to_lowercase();
        let mut hit = false;

        if FRENCH_WORDS.contains(&lower.as_str()) {
            french += 1.0;
            hit = true;
        } else if lower.chars().any(|c| FRENCH_DIACRITICS.contains(&c)) {
            french += 0.5;
            hit = true;
        }

        if ENGLISH_ONLY_WORDS.contains(&lower.as_str()) {
            english += 1.0;
            hit = true;
        } else if lower.len() > 5 && lower.is_ascii() && lower.ends_with("ing") {
            english += 0.5;
            hit = true;
        }

        if ARABIC_WORDS.contains(&span.word.as_str()) {
            arabic += 1.0;
            hit = true;
        } else if span.word.starts_with("ال") && span.word.chars().count() > 3 {
            arabic += 0.5;
            hit = true;
        }

        if hit {
            recognized += 1;
        }
    }

    let pct = |v: f64| (v / total as f64) * 100.0;
    scores.insert(LanguageAffinity::French, pct(french));
    scores.insert(LanguageAffinity::Arabic, pct(arabic));
    scores.insert(LanguageAffinity::English, pct(english));

    let best = scores
        .iter()
        .filter(|(_, score)| **score > 0.0)
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(lang, score)| (*lang, *score));
    let score_sum: f64 = scores.values().sum();

    WordAnalysis {
        total_words: total,
        recognized_ratio: recognized as f64 / total as f64,
        dominant: best.map(|(lang, _)| lang),
        confidence: match best {
            Some((_, score)) if score_sum > 0.0 => score / score_sum,
            _ => 0.0,
        },
        scores,
    }
}

/// Locate English-only words, the contamination that script checks cannot see
/// in Latin-script output.
pub fn english_fragments(text: &str) -> Vec<WordSpan> {
    words(text)
        .into_iter()
        .filter(|span| ENGLISH_ONLY_WORDS.contains(&span.word.to_lowercase().as_str()))
        .collect()
}

// ==================== Encoding Analysis ====================

/// Kinds of encoding damage the analyzer can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingIssueKind {
    ReplacementChar,
    ControlChar,
    ZeroWidth,
    Mojibake,
}

/// A located piece of encoding damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingIssue {
    pub start: usize,
    pub end: usize,
    pub kind: EncodingIssueKind,
    pub text: String,
}

static MOJIBAKE_REGEX: OnceLock<Regex> = OnceLock::new();

/// UTF-8 read as Latin-1/Windows-1252: `Ã©`, `â€™`, `Ø§`, ...
pub(crate) fn mojibake_regex() -> &'static Regex {
    MOJIBAKE_REGEX.get_or_init(|| {
        Regex::new(r"[ÃÂ][\x{80}-\x{BF}]|â€[\x{80}-\x{BF}\x{2000}-\x{20FF}\x{152}\x{153}\x{160}\x{161}\x{178}\x{17D}\x{17E}\x{2DC}]?|[ØÙ][\x{80}-\x{BF}\x{2018}-\x{203A}\x{20AC}]")
            .expect("valid mojibake regex")
    })
}

pub(crate) fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{2060}' | '\u{FEFF}')
}

pub(crate) fn is_disallowed_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\n' | '\t' | '\r')
}

/// Find replacement characters, stray control characters, zero-width
/// characters and mojibake sequences.
pub fn find_encoding_issues(text: &str) -> Vec<EncodingIssue> {
    let mut issues: Vec<EncodingIssue> = text
        .char_indices()
        .filter_map(|(idx, c)| {
            let kind = if c == '\u{FFFD}' {
                EncodingIssueKind::ReplacementChar
            } else if is_disallowed_control(c) {
                EncodingIssueKind::ControlChar
            } else if is_zero_width(c) {
                EncodingIssueKind::ZeroWidth
            } else {
                return None;
            };
            Some(EncodingIssue {
                start: idx,
                end: idx + c.len_utf8(),
                kind,
                text: c.to_string(),
            })
        })
        .collect();

    issues.extend(mojibake_regex().find_iter(text).map(|m| EncodingIssue {
        start: m.start(),
        end: m.end(),
        kind: EncodingIssueKind::Mojibake,
        text: m.as_str().to_string(),
    }));
    issues.sort_by_key(|issue| issue.start);
    issues
}
