//! Language type: the closed set of languages the pipeline translates between.
//!
//! Legal content only ever moves between French and Arabic, so `Language` is a
//! plain enum rather than a registry lookup. Each language knows its script,
//! which is what the analyzer, cleaner and validator key on.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::i18n::strings::{LanguageStrings, ARABIC_STRINGS, FRENCH_STRINGS};

/// Writing systems the analyzer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    Latin,
    Arabic,
    Cyrillic,
    Greek,
    Hebrew,
    Cjk,
    /// Any other alphabetic script (Devanagari, Thai, ...)
    Other,
}

/// A supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "ar")]
    Arabic,
}

impl Language {
    /// Create a Language from a language code string.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 language code ("fr" or "ar")
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is supported
    /// * `Err` for any other code
    pub fn from_code(code: &str) -> Result<Language> {
        match code.trim().to_ascii_lowercase().as_str() {
            "fr" => Ok(Language::French),
            "ar" => Ok(Language::Arabic),
            "" => bail!("Empty language code"),
            other => bail!("Unknown language code: '{}'", other),
        }
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::Arabic => "ar",
        }
    }

    /// Get the English name of the language.
    pub fn name(&self) -> &'static str {
        match self {
            Language::French => "French",
            Language::Arabic => "Arabic",
        }
    }

    /// Get the native name of the language.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::French => "Français",
            Language::Arabic => "العربية",
        }
    }

    /// The script a pure text in this language is written in.
    pub fn script(&self) -> Script {
        match self {
            Language::French => Script::Latin,
            Language::Arabic => Script::Arabic,
        }
    }

    /// The other language of the pair.
    pub fn counterpart(&self) -> Language {
        match self {
            Language::French => Language::Arabic,
            Language::Arabic => Language::French,
        }
    }

    /// Localized strings used when synthesizing content in this language.
    pub fn strings(&self) -> &'static LanguageStrings {
        match self {
            Language::French => &FRENCH_STRINGS,
            Language::Arabic => &ARABIC_STRINGS,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
