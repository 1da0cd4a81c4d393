//! Language metadata and localized strings.
//!
//! # Architecture
//!
//! - `language`: the closed `Language` set (French, Arabic) and its `Script`
//! - `strings`: localized sentences the pipeline synthesizes itself (fallback
//!   templates, emergency placeholder)

mod language;
mod strings;

pub use language::{Language, Script};
pub use strings::{LanguageStrings, ARABIC_STRINGS, FRENCH_STRINGS};
