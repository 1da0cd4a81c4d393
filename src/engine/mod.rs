//! Translation methods and the engine that runs one method at a time.
//!
//! # Architecture
//!
//! - `openai`: chat-completion HTTP backend used for the primary and
//!   secondary methods
//! - `rules`: dictionary, rule-based and hybrid methods built on the
//!   terminology manager
//! - `fallback`: content-intent classification and fallback synthesis
//!
//! The engine never decides whether a candidate is acceptable; the gateway
//! validates every attempt and picks the next method.

pub mod fallback;
pub mod openai;
pub mod rules;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cleaner::{CleanedContent, ContentCleaner};
use crate::i18n::Language;
use crate::metrics::{TelemetryCollector, TranslationEvent};
use crate::terminology::{LegalDomain, TerminologyManager};

/// Which strategy produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranslationMethod {
    Primary,
    Secondary,
    RuleBased,
    Hybrid,
    FallbackGenerated,
    Cached,
    Dictionary,
    Template,
    EmergencyGeneric,
}

impl TranslationMethod {
    /// Engine methods in the order they are tried.
    pub const ENGINE_ORDER: [TranslationMethod; 5] = [
        TranslationMethod::Primary,
        TranslationMethod::Secondary,
        TranslationMethod::Dictionary,
        TranslationMethod::RuleBased,
        TranslationMethod::Hybrid,
    ];

    /// True for text synthesized instead of translated.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            TranslationMethod::FallbackGenerated
                | TranslationMethod::Template
                | TranslationMethod::EmergencyGeneric
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TranslationMethod::Primary => "primary",
            TranslationMethod::Secondary => "secondary",
            TranslationMethod::RuleBased => "rule_based",
            TranslationMethod::Hybrid => "hybrid",
            TranslationMethod::FallbackGenerated => "fallback_generated",
            TranslationMethod::Cached => "cached",
            TranslationMethod::Dictionary => "dictionary",
            TranslationMethod::Template => "template",
            TranslationMethod::EmergencyGeneric => "emergency_generic",
        }
    }
}

impl fmt::Display for TranslationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One candidate produced by one method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationAttempt {
    pub text: String,
    pub method: TranslationMethod,
    pub confidence: f64,
    pub processing_time_ms: u64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl TranslationAttempt {
    /// An attempt that produced text worth validating.
    pub fn is_usable(&self) -> bool {
        self.errors.is_empty() && !self.text.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("backend transport error: {0}")]
    Transport(String),

    #[error("backend returned no content")]
    EmptyResponse,

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Rate limits, server errors and transport failures are worth retrying;
    /// other client errors and bad payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Http { status, .. } => *status == 429 || *status >= 500,
            BackendError::Transport(_) => true,
            BackendError::EmptyResponse | BackendError::Malformed(_) => false,
        }
    }
}

/// An external translation service.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        domain: Option<LegalDomain>,
    ) -> Result<String, BackendError>;
}

/// Everything one attempt needs to know about its request.
pub struct AttemptContext<'a> {
    pub request_id: &'a str,
    pub content: &'a CleanedContent,
    pub source: Language,
    pub target: Language,
    pub domain: Option<LegalDomain>,
    /// Cleaner used by the hybrid method on its own output
    pub cleaner: &'a ContentCleaner,
}

const PRIMARY_CONFIDENCE: f64 = 0.95;
const SECONDARY_CONFIDENCE: f64 = 0.9;

pub struct TranslationEngine {
    primary: Option<Arc<dyn TranslationBackend>>,
    secondary: Option<Arc<dyn TranslationBackend>>,
    terminology: Arc<TerminologyManager>,
    telemetry: Arc<TelemetryCollector>,
}

impl TranslationEngine {
    pub fn new(terminology: Arc<TerminologyManager>, telemetry: Arc<TelemetryCollector>) -> Self {
        Self {
            primary: None,
            secondary: None,
            terminology,
            telemetry,
        }
    }

    pub fn with_primary(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.primary = Some(backend);
        self
    }

    pub fn with_secondary(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.secondary = Some(backend);
        self
    }

    /// Methods to try, in priority order, capped at `max_attempts`.
    /// Backend methods without a backend are skipped.
    pub fn methods(&self, max_attempts: u32) -> Vec<TranslationMethod> {
        TranslationMethod::ENGINE_ORDER
            .into_iter()
            .filter(|m| match m {
                TranslationMethod::Primary => self.primary.is_some(),
                TranslationMethod::Secondary => self.secondary.is_some(),
                _ => true,
            })
            .take(max_attempts as usize)
            .collect()
    }

    /// Run one method. Failures come back as an attempt carrying errors and
    /// are recorded as `Failed` events.
    pub async fn attempt(&self, ctx: &AttemptContext<'_>, method: TranslationMethod) -> TranslationAttempt {
        let started = Instant::now();
        let text = ctx.content.text.as_str();

        let outcome: Result<rules::RuleOutput, String> = if ctx.content.is_empty() {
            Err("nothing left to translate after cleaning".to_string())
        } else {
            match method {
                TranslationMethod::Primary => {
                    self.call_backend(self.primary.as_ref(), ctx, PRIMARY_CONFIDENCE).await
                }
                TranslationMethod::Secondary => {
                    self.call_backend(self.secondary.as_ref(), ctx, SECONDARY_CONFIDENCE).await
                }
                TranslationMethod::Dictionary => {
                    rules::dictionary(&self.terminology, text, ctx.source, ctx.target, ctx.domain)
                        .map_err(|e| e.to_string())
                }
                TranslationMethod::RuleBased => {
                    rules::rule_based(&self.terminology, text, ctx.source, ctx.target, ctx.domain)
                        .map_err(|e| e.to_string())
                }
                TranslationMethod::Hybrid => rules::hybrid(
                    &self.terminology,
                    ctx.cleaner,
                    text,
                    ctx.source,
                    ctx.target,
                    ctx.domain,
                )
                .map_err(|e| e.to_string()),
                other => Err(format!("{} is not an engine method", other)),
            }
        };
        let processing_time_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                debug!(
                    "[{}] {} produced {} chars (confidence {:.2})",
                    ctx.request_id,
                    method,
                    output.text.chars().count(),
                    output.confidence
                );
                TranslationAttempt {
                    text: output.text,
                    method,
                    confidence: output.confidence,
                    processing_time_ms,
                    errors: Vec::new(),
                    warnings: output.warnings,
                }
            }
            Err(reason) => {
                warn!("[{}] {} failed: {}", ctx.request_id, method, reason);
                self.telemetry.record(TranslationEvent::Failed {
                    request_id: ctx.request_id.to_string(),
                    method,
                    reason: reason.clone(),
                });
                TranslationAttempt {
                    text: String::new(),
                    method,
                    confidence: 0.0,
                    processing_time_ms,
                    errors: vec![reason],
                    warnings: Vec::new(),
                }
            }
        }
    }

    async fn call_backend(
        &self,
        backend: Option<&Arc<dyn TranslationBackend>>,
        ctx: &AttemptContext<'_>,
        confidence: f64,
    ) -> Result<rules::RuleOutput, String> {
        let backend = backend.ok_or_else(|| "no backend configured".to_string())?;
        let translated = backend
            .translate(&ctx.content.text, ctx.source, ctx.target, ctx.domain)
            .await
            .map_err(|e| format!("{}: {}", backend.name(), e))?;
        let translated = translated.trim();
        if translated.is_empty() {
            return Err(format!("{}: {}", backend.name(), BackendError::EmptyResponse));
        }
        Ok(rules::RuleOutput {
            text: translated.to_string(),
            confidence,
            warnings: Vec::new(),
        })
    }
}
