pub mod analyzer;
pub mod cache;
pub mod cleaner;
pub mod config;
pub mod engine;
pub mod gateway;
pub mod i18n;
pub mod metrics;
pub mod monitor;
pub mod retry;
pub mod scheduler;
pub mod terminology;
pub mod validator;

pub use gateway::{PureTranslationResult, TranslationGateway, TranslationRequest};
pub use i18n::Language;
