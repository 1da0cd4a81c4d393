//! Translation gateway: the public entry point of the pipeline.
//!
//! Every request runs through a fixed sequence of stages:
//!
//! ```text
//! Cleaning -> Trying(i) -> Validating(i) -> Accept
//!                 ^             |
//!                 +- NextMethod-+-> Fallback -> Accept
//! ```
//!
//! Each public operation returns a value, never an error. Every failure path
//! ends in a fully formed result whose text passed the purity gate, or in the
//! emergency placeholder, with the failure recorded in warnings, logs and
//! telemetry.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheKey, CacheStats, TranslationCache};
use crate::cleaner::{CleanedContent, ContentCleaner};
use crate::config::{AlertSeverity, ConfigError, ConfigUpdate, PipelineConfig, SharedConfig};
use crate::engine::fallback::{FallbackContent, FallbackGenerator};
use crate::engine::openai::OpenAiBackend;
use crate::engine::{AttemptContext, TranslationBackend, TranslationEngine, TranslationMethod};
use crate::i18n::Language;
use crate::metrics::{SystemHealth, TelemetryCollector, TimeRange, TranslationEvent, TranslationMetrics};
use crate::monitor::{QualityAlert, QualityMetrics, QualityMonitor, QualityReport};
use crate::terminology::{LegalDomain, TerminologyManager};
use crate::validator::{PurityScore, PurityValidationResult, PurityValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    LegalDocument,
    ChatMessage,
    UiText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub domain: Option<LegalDomain>,
    pub previous_translations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source: Language,
    pub target: Language,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub context: Option<RequestContext>,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source: Language, target: Language) -> Self {
        Self {
            text: text.into(),
            source,
            target,
            content_type: ContentType::default(),
            priority: Priority::default(),
            context: None,
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    fn domain(&self) -> Option<LegalDomain> {
        self.context.as_ref().and_then(|c| c.domain)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTiming {
    pub step: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub step_durations: Vec<StepTiming>,
    pub fallback_used: bool,
    pub cache_hit: bool,
    /// Engine methods tried, in order
    pub methods_tried: Vec<TranslationMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PureTranslationResult {
    pub translated_text: String,
    pub purity_score: f64,
    pub purity: PurityScore,
    pub quality: QualityMetrics,
    pub quality_score: f64,
    pub method: TranslationMethod,
    pub confidence: f64,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
    pub metadata: ResultMetadata,
}

/// A problem reported by a user after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub request_id: Option<String>,
    pub description: String,
    pub severity: AlertSeverity,
}

/// Per-request record of what happened, carried into the result metadata.
#[derive(Debug, Default)]
struct Trace {
    steps: Vec<StepTiming>,
    warnings: Vec<String>,
    methods_tried: Vec<TranslationMethod>,
}

impl Trace {
    fn step(&mut self, name: impl Into<String>, since: Instant) {
        self.steps.push(StepTiming {
            step: name.into(),
            duration_ms: since.elapsed().as_millis() as u64,
        });
    }
}

/// Text that is about to be returned, with its validation.
struct Candidate {
    text: String,
    method: TranslationMethod,
    confidence: f64,
    validation: PurityValidationResult,
    fallback_used: bool,
}

enum Stage {
    Cleaning,
    Trying(usize, CleanedContent),
    Validating(usize, CleanedContent, crate::engine::TranslationAttempt),
    NextMethod(usize, CleanedContent),
    Fallback,
    Accept(Candidate),
}

pub struct TranslationGateway {
    config: SharedConfig,
    terminology: Arc<TerminologyManager>,
    telemetry: Arc<TelemetryCollector>,
    monitor: Arc<QualityMonitor>,
    engine: TranslationEngine,
    fallback: FallbackGenerator,
    cleaner: RwLock<Arc<ContentCleaner>>,
    cache: TranslationCache<PureTranslationResult>,
    permits: Arc<Semaphore>,
    permit_limit: Mutex<usize>,
    request_counter: AtomicU64,
}

impl TranslationGateway {
    /// Build a gateway with the built-in dictionaries and, when backend
    /// settings are present, the HTTP backends.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let (primary, secondary) = match &config.backend {
            Some(settings) => {
                let (primary, secondary) = OpenAiBackend::from_settings(settings);
                (Some(primary), secondary)
            }
            None => (None, None),
        };
        Self::with_backends(
            config,
            Arc::new(TerminologyManager::with_builtin()),
            primary,
            secondary,
        )
    }

    pub fn with_backends(
        config: PipelineConfig,
        terminology: Arc<TerminologyManager>,
        primary: Option<Arc<dyn TranslationBackend>>,
        secondary: Option<Arc<dyn TranslationBackend>>,
    ) -> Result<Self, ConfigError> {
        let shared = SharedConfig::new(config)?;
        let config = shared.snapshot();

        let telemetry = Arc::new(TelemetryCollector::new(
            config.metrics_buffer_capacity,
            config.event_history_capacity,
            config.monitoring_window,
            config.max_average_processing_time,
        ));
        let monitor = Arc::new(QualityMonitor::new(
            shared.clone(),
            Arc::clone(&telemetry),
            Arc::clone(&terminology),
        ));

        let mut engine = TranslationEngine::new(Arc::clone(&terminology), Arc::clone(&telemetry));
        if let Some(backend) = primary {
            info!("Primary translation backend: {}", backend.name());
            engine = engine.with_primary(backend);
        }
        if let Some(backend) = secondary {
            info!("Secondary translation backend: {}", backend.name());
            engine = engine.with_secondary(backend);
        }

        Ok(Self {
            fallback: FallbackGenerator::new(Arc::clone(&terminology)),
            cleaner: RwLock::new(Arc::new(ContentCleaner::new(config.cleaning_rules.clone()))),
            cache: TranslationCache::new(config.cache_ttl, config.cache_capacity),
            permits: Arc::new(Semaphore::new(config.concurrent_request_limit)),
            permit_limit: Mutex::new(config.concurrent_request_limit),
            request_counter: AtomicU64::new(0),
            config: shared,
            terminology,
            telemetry,
            monitor,
            engine,
        })
    }

    fn next_request_id(&self) -> String {
        let n = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("req-{}-{}", Utc::now().timestamp_millis(), n)
    }

    fn cleaner(&self) -> Arc<ContentCleaner> {
        match self.cleaner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn validator(&self, cleaner: &Arc<ContentCleaner>) -> PurityValidator {
        PurityValidator::new(Arc::clone(cleaner), Arc::clone(&self.terminology))
    }

    /// Translate one request. Always returns a result.
    pub async fn translate(&self, request: TranslationRequest) -> PureTranslationResult {
        let started = Instant::now();
        let request_id = self.next_request_id();
        let config = self.config.snapshot();

        self.telemetry.record(TranslationEvent::Started {
            request_id: request_id.clone(),
            source: request.source,
            target: request.target,
        });
        info!(
            "[{}] Translating {} chars {} -> {} ({:?}, {:?} priority)",
            request_id,
            request.text.chars().count(),
            request.source,
            request.target,
            request.content_type,
            request.priority
        );

        let pipeline = async {
            // Requests beyond the concurrency limit wait here
            let _permit = self.permits.acquire().await.ok();
            self.run_pipeline(&request, &request_id, &config, started).await
        };

        match tokio::time::timeout(config.processing_timeout, pipeline).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "[{}] Processing exceeded {:?}; returning emergency content",
                    request_id, config.processing_timeout
                );
                let mut trace = Trace::default();
                trace.warnings.push(format!(
                    "Processing exceeded the {}s limit; emergency content returned",
                    config.processing_timeout.as_secs_f64()
                ));
                let cleaner = self.cleaner();
                let candidate = self.emergency(&request, &request_id, &self.validator(&cleaner));
                self.finish(&request, &request.text, &request_id, started, candidate, trace, None)
            }
        }
    }

    /// Translate several requests concurrently; results keep input order.
    pub async fn translate_batch(&self, requests: Vec<TranslationRequest>) -> Vec<PureTranslationResult> {
        info!("Translating batch of {} requests", requests.len());
        join_all(requests.into_iter().map(|request| self.translate(request))).await
    }

    async fn run_pipeline(
        &self,
        request: &TranslationRequest,
        request_id: &str,
        config: &PipelineConfig,
        started: Instant,
    ) -> PureTranslationResult {
        let mut trace = Trace::default();
        let cleaner = self.cleaner();
        let validator = self.validator(&cleaner);

        // Input clamping
        let text: String = if request.text.chars().count() > config.max_input_chars {
            warn!(
                "[{}] Input of {} chars truncated to {}",
                request_id,
                request.text.chars().count(),
                config.max_input_chars
            );
            trace.warnings.push(format!(
                "Input truncated to {} characters",
                config.max_input_chars
            ));
            request.text.chars().take(config.max_input_chars).collect()
        } else {
            request.text.clone()
        };

        if text.trim().is_empty() {
            warn!("[{}] Empty input; producing fallback statement", request_id);
            trace.warnings.push("Empty input; fallback statement returned".to_string());
            self.telemetry.record(TranslationEvent::FallbackTriggered {
                request_id: request_id.to_string(),
                reason: "empty input".to_string(),
            });
            let content = self.fallback.empty_input(request.target);
            let candidate = self.checked_fallback(content, request, request_id, &validator);
            return self.finish(request, &text, request_id, started, candidate, trace, None);
        }

        // Cache
        let key = CacheKey::new(&text, request.source, request.target, request.content_type);
        let lookup_started = Instant::now();
        if let Some(cached) = self.cache.get(&key) {
            // Cleaning rules may have changed since the entry was written
            if validator.validate(&cached.translated_text, request.target).passed {
                trace.step("cache_lookup", lookup_started);
                return self.cache_hit(cached, request_id, started, trace);
            }
            debug!("[{}] Cached entry no longer passes validation", request_id);
        }
        trace.step("cache_lookup", lookup_started);
        self.telemetry.record(TranslationEvent::CacheMiss {
            request_id: request_id.to_string(),
        });

        let methods = self.engine.methods(config.max_retry_attempts);
        let domain = request.domain();
        if let Some(context) = &request.context {
            debug!(
                "[{}] Context: domain {:?}, {} previous translations",
                request_id,
                context.domain,
                context.previous_translations.len()
            );
        }

        let mut stage = Stage::Cleaning;
        let candidate = loop {
            stage = match stage {
                Stage::Cleaning => {
                    let t = Instant::now();
                    let cleaned = cleaner.clean(&text, request.source);
                    trace.step("cleaning", t);
                    if cleaned.was_modified() {
                        debug!(
                            "[{}] Cleaning removed {} elements",
                            request_id,
                            cleaned.removed_elements.len()
                        );
                    }
                    Stage::Trying(0, cleaned)
                }
                Stage::Trying(i, content) => match methods.get(i) {
                    None => Stage::Fallback,
                    Some(&method) => {
                        // All attempts read the one cleaned source
                        let ctx = AttemptContext {
                            request_id,
                            content: &content,
                            source: request.source,
                            target: request.target,
                            domain,
                            cleaner: &cleaner,
                        };
                        let t = Instant::now();
                        let attempt = self.engine.attempt(&ctx, method).await;
                        trace.step(format!("attempt:{}", method), t);
                        trace.methods_tried.push(method);
                        trace.warnings.extend(attempt.warnings.iter().cloned());
                        if attempt.is_usable() {
                            Stage::Validating(i, content, attempt)
                        } else {
                            for e in &attempt.errors {
                                trace.warnings.push(format!("{} failed: {}", method, e));
                            }
                            Stage::NextMethod(i, content)
                        }
                    }
                },
                Stage::Validating(i, content, attempt) => {
                    let t = Instant::now();
                    let validation = validator.validate(&attempt.text, request.target);
                    trace.step(format!("validation:{}", attempt.method), t);
                    if validation.passed && validation.score.overall >= config.effective_min_purity() {
                        Stage::Accept(Candidate {
                            text: attempt.text,
                            method: attempt.method,
                            confidence: attempt.confidence,
                            validation,
                            fallback_used: false,
                        })
                    } else {
                        warn!(
                            "[{}] {} output rejected with purity {:.2}",
                            request_id, attempt.method, validation.score.overall
                        );
                        self.telemetry.record(TranslationEvent::PurityViolation {
                            request_id: request_id.to_string(),
                            method: attempt.method,
                            score: validation.score.overall,
                        });
                        trace.warnings.push(format!(
                            "{} output rejected: purity {:.2}",
                            attempt.method, validation.score.overall
                        ));
                        Stage::NextMethod(i, content)
                    }
                }
                Stage::NextMethod(i, content) => Stage::Trying(i + 1, content),
                Stage::Fallback => {
                    let t = Instant::now();
                    warn!(
                        "[{}] No method reached full purity after {} attempts; generating fallback",
                        request_id,
                        trace.methods_tried.len()
                    );
                    self.telemetry.record(TranslationEvent::FallbackTriggered {
                        request_id: request_id.to_string(),
                        reason: format!("{} methods exhausted", trace.methods_tried.len()),
                    });
                    let intent =
                        self.fallback
                            .classify(&text, request.source, request.target, request.content_type);
                    let content = self.fallback.generate(&intent, request.target);
                    let candidate = self.checked_fallback(content, request, request_id, &validator);
                    trace.step("fallback", t);
                    Stage::Accept(candidate)
                }
                Stage::Accept(candidate) => break candidate,
            };
        };

        self.finish(request, &text, request_id, started, candidate, trace, Some(key))
    }

    /// Validate synthesized content, dropping to the emergency placeholder when
    /// even that is impure.
    fn checked_fallback(
        &self,
        content: FallbackContent,
        request: &TranslationRequest,
        request_id: &str,
        validator: &PurityValidator,
    ) -> Candidate {
        let validation = validator.validate(&content.text, request.target);
        if validation.passed {
            Candidate {
                text: content.text,
                method: content.method,
                confidence: content.confidence,
                validation,
                fallback_used: true,
            }
        } else {
            self.emergency(request, request_id, validator)
        }
    }

    fn emergency(
        &self,
        request: &TranslationRequest,
        request_id: &str,
        validator: &PurityValidator,
    ) -> Candidate {
        error!("[{}] Using emergency placeholder for {}", request_id, request.target);
        let content = self.fallback.emergency(request.target);
        let validation = validator.validate(&content.text, request.target);
        Candidate {
            text: content.text,
            method: content.method,
            confidence: content.confidence,
            validation,
            fallback_used: true,
        }
    }

    fn cache_hit(
        &self,
        mut cached: PureTranslationResult,
        request_id: &str,
        started: Instant,
        trace: Trace,
    ) -> PureTranslationResult {
        self.telemetry.record(TranslationEvent::CacheHit {
            request_id: request_id.to_string(),
        });
        cached.method = TranslationMethod::Cached;
        cached.processing_time_ms = started.elapsed().as_millis() as u64;
        cached.warnings = trace.warnings;
        cached.metadata = ResultMetadata {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            step_durations: trace.steps,
            fallback_used: cached.metadata.fallback_used,
            cache_hit: true,
            methods_tried: Vec::new(),
        };
        self.telemetry.record(TranslationEvent::Completed {
            request_id: request_id.to_string(),
            method: TranslationMethod::Cached,
            purity_score: cached.purity_score,
            processing_ms: cached.processing_time_ms,
            fallback_used: cached.metadata.fallback_used,
        });
        info!("[{}] Served from cache in {}ms", request_id, cached.processing_time_ms);
        cached
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        request: &TranslationRequest,
        source_text: &str,
        request_id: &str,
        started: Instant,
        candidate: Candidate,
        mut trace: Trace,
        cache_key: Option<CacheKey>,
    ) -> PureTranslationResult {
        let t = Instant::now();
        let report = self.monitor.assess(
            Some((source_text, request.source)),
            &candidate.text,
            request.target,
            &candidate.validation,
        );
        trace.step("quality", t);

        let result = PureTranslationResult {
            purity_score: candidate.validation.score.overall,
            purity: candidate.validation.score,
            quality: report.metrics,
            quality_score: report.overall_score,
            method: candidate.method,
            confidence: candidate.confidence,
            processing_time_ms: started.elapsed().as_millis() as u64,
            warnings: trace.warnings,
            metadata: ResultMetadata {
                request_id: request_id.to_string(),
                timestamp: Utc::now(),
                step_durations: trace.steps,
                fallback_used: candidate.fallback_used,
                cache_hit: false,
                methods_tried: trace.methods_tried,
            },
            translated_text: candidate.text,
        };

        self.telemetry.record(TranslationEvent::Completed {
            request_id: request_id.to_string(),
            method: result.method,
            purity_score: result.purity_score,
            processing_ms: result.processing_time_ms,
            fallback_used: result.metadata.fallback_used,
        });

        if let Some(key) = cache_key {
            if candidate.validation.passed && result.method != TranslationMethod::EmergencyGeneric {
                self.cache.insert(key, result.clone());
            }
        }

        info!(
            "[{}] Completed with {} in {}ms (purity {:.2}, quality {:.1})",
            request_id, result.method, result.processing_time_ms, result.purity_score, result.quality_score
        );
        result
    }

    /// Score arbitrary text without translating it.
    pub fn validate_quality(&self, text: &str, language: Language) -> QualityReport {
        let cleaner = self.cleaner();
        let validation = self.validator(&cleaner).validate(text, language);
        self.monitor.evaluate(None, text, language, &validation)
    }

    /// Accept a user-reported problem.
    pub fn report_issue(&self, issue: IssueReport) -> QualityAlert {
        info!(
            "User issue reported ({:?}) for {:?}",
            issue.severity, issue.request_id
        );
        self.monitor
            .record_user_complaint(issue.request_id.as_deref(), &issue.description, issue.severity)
    }

    /// Validate and apply a configuration update. Nothing changes on error.
    pub fn update_config(&self, update: ConfigUpdate) -> Result<(), ConfigError> {
        let next = self.config.apply(&update)?;
        if update.cleaning_rules.is_some() {
            let cleaner = Arc::new(ContentCleaner::new(next.cleaning_rules.clone()));
            match self.cleaner.write() {
                Ok(mut guard) => *guard = cleaner,
                Err(poisoned) => *poisoned.into_inner() = cleaner,
            }
            self.cache.clear();
        }
        self.resize_permits(next.concurrent_request_limit);
        Ok(())
    }

    fn resize_permits(&self, limit: usize) {
        let mut current = match self.permit_limit.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if limit > *current {
            self.permits.add_permits(limit - *current);
        } else if limit < *current {
            let excess = *current - limit;
            let shortfall = excess - self.permits.forget_permits(excess);
            // Permits held by in-flight requests are retired once released
            if shortfall > 0 {
                self.retire_permits(shortfall);
            }
        }
        if limit != *current {
            info!("Concurrent request limit {} -> {}", *current, limit);
        }
        *current = limit;
    }

    /// Wait for `count` permits to come back and forget them. Semaphore
    /// futures need no runtime, so without one a plain thread drives the wait.
    fn retire_permits(&self, count: usize) {
        let Ok(count) = u32::try_from(count) else {
            error!("Cannot retire {} permits at once", count);
            return;
        };
        let permits = Arc::clone(&self.permits);
        let retire = async move {
            if let Ok(held) = permits.acquire_many_owned(count).await {
                held.forget();
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(retire);
            }
            Err(_) => {
                debug!("No runtime; retiring {} permits on a helper thread", count);
                std::thread::spawn(move || futures::executor::block_on(retire));
            }
        }
    }

    pub fn get_system_health(&self) -> SystemHealth {
        self.telemetry.get_system_health()
    }

    pub fn get_metrics(&self, range: TimeRange) -> TranslationMetrics {
        self.telemetry.get_metrics(range)
    }

    pub fn monitor(&self) -> Arc<QualityMonitor> {
        Arc::clone(&self.monitor)
    }

    pub fn telemetry(&self) -> Arc<TelemetryCollector> {
        Arc::clone(&self.telemetry)
    }

    pub fn config(&self) -> Arc<PipelineConfig> {
        self.config.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::StubBackend;

    fn gateway() -> TranslationGateway {
        TranslationGateway::new(PipelineConfig::default()).unwrap()
    }

    fn with_primary(reply: Option<&str>) -> TranslationGateway {
        TranslationGateway::with_backends(
            PipelineConfig::default(),
            Arc::new(TerminologyManager::with_builtin()),
            Some(Arc::new(StubBackend {
                reply: reply.map(str::to_string),
            })),
            None,
        )
        .unwrap()
    }

    // ==================== Request Tests ====================

    #[test]
    fn test_request_builders() {
        let request = TranslationRequest::new("نص", Language::Arabic, Language::French)
            .with_content_type(ContentType::ChatMessage)
            .with_priority(Priority::Urgent)
            .with_context(RequestContext {
                domain: Some(LegalDomain::Family),
                previous_translations: vec![],
            });
        assert_eq!(request.content_type, ContentType::ChatMessage);
        assert_eq!(request.priority, Priority::Urgent);
        assert_eq!(request.domain(), Some(LegalDomain::Family));
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: TranslationRequest =
            serde_json::from_str(r#"{"text":"المحامي","source":"Arabic","target":"French"}"#).unwrap();
        assert_eq!(request.content_type, ContentType::LegalDocument);
        assert_eq!(request.priority, Priority::Normal);
        assert!(request.context.is_none());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let g = gateway();
        let a = g.next_request_id();
        let b = g.next_request_id();
        assert!(a.starts_with("req-"));
        assert_ne!(a, b);
    }

    // ==================== Pipeline Tests ====================

    #[tokio::test]
    async fn test_primary_pure_output_is_accepted() {
        let g = with_primary(Some("L'avocat"));
        let result = g
            .translate(TranslationRequest::new("المحامي", Language::Arabic, Language::French))
            .await;
        assert_eq!(result.method, TranslationMethod::Primary);
        assert_eq!(result.translated_text, "L'avocat");
        assert_eq!(result.purity_score, 100.0);
        assert_eq!(result.confidence, 0.95);
        assert!(!result.metadata.fallback_used);
        assert_eq!(result.metadata.methods_tried, vec![TranslationMethod::Primary]);
    }

    #[tokio::test]
    async fn test_impure_primary_output_moves_to_next_method() {
        let g = with_primary(Some("The lawyer"));
        let result = g
            .translate(TranslationRequest::new("المحامي", Language::Arabic, Language::French))
            .await;
        assert_eq!(result.method, TranslationMethod::Dictionary);
        assert_eq!(result.translated_text, "l'avocat");
        assert!(result.warnings.iter().any(|w| w.contains("primary output rejected")));

        let events = g.telemetry().events();
        assert!(events
            .iter()
            .any(|e| matches!(e.event, TranslationEvent::PurityViolation { method: TranslationMethod::Primary, .. })));
    }

    #[tokio::test]
    async fn test_failing_backend_is_recorded_as_warning() {
        let g = with_primary(None);
        let result = g
            .translate(TranslationRequest::new("المحامي", Language::Arabic, Language::French))
            .await;
        assert_eq!(result.purity_score, 100.0);
        assert!(result.warnings.iter().any(|w| w.starts_with("primary failed")));
    }

    #[tokio::test]
    async fn test_empty_input_returns_fallback() {
        let result = gateway()
            .translate(TranslationRequest::new("   ", Language::Arabic, Language::French))
            .await;
        assert_eq!(result.method, TranslationMethod::Template);
        assert!(result.metadata.fallback_used);
        assert_eq!(result.purity_score, 100.0);
        assert!(result.translated_text.starts_with(Language::French.strings().empty_input_notice));
    }

    #[tokio::test]
    async fn test_long_input_is_truncated() {
        let mut config = PipelineConfig::default();
        config.max_input_chars = 7;
        let g = TranslationGateway::new(config).unwrap();
        let result = g
            .translate(TranslationRequest::new(
                "المحامي زادمتصل زادمتصل",
                Language::Arabic,
                Language::French,
            ))
            .await;
        assert_eq!(result.translated_text, "l'avocat");
        assert!(result.warnings.iter().any(|w| w.contains("truncated")));
    }

    #[tokio::test]
    async fn test_untranslatable_input_uses_fallback() {
        let result = gateway()
            .translate(TranslationRequest::new("زادمتصل دي", Language::Arabic, Language::French))
            .await;
        assert!(result.metadata.fallback_used);
        assert_eq!(result.method, TranslationMethod::Template);
        assert_eq!(result.purity_score, 100.0);
        assert!(!result.translated_text.contains("زادمتصل"));
    }

    #[tokio::test]
    async fn test_cache_hit_on_repeat() {
        let g = gateway();
        let request = TranslationRequest::new("المحامي", Language::Arabic, Language::French);
        let first = g.translate(request.clone()).await;
        let second = g.translate(request).await;
        assert!(!first.metadata.cache_hit);
        assert!(second.metadata.cache_hit);
        assert_eq!(second.method, TranslationMethod::Cached);
        assert_eq!(first.translated_text, second.translated_text);
        assert_ne!(first.metadata.request_id, second.metadata.request_id);
        assert_eq!(g.cache_stats().hits, 1);
    }

    // ==================== Operation Tests ====================

    #[test]
    fn test_validate_quality_does_not_translate() {
        let g = gateway();
        let report = g.validate_quality("Le contrat Pro signé", Language::French);
        assert!(report.metrics.purity_score < 100.0);
        assert!(!report.issues.is_empty());
        assert_eq!(g.telemetry().event_count(), 0);
    }

    #[test]
    fn test_report_issue_raises_alert() {
        let g = gateway();
        let alert = g.report_issue(IssueReport {
            request_id: Some("req-1".to_string()),
            description: "mot anglais dans la traduction".to_string(),
            severity: AlertSeverity::High,
        });
        assert_eq!(g.monitor().unacknowledged(), vec![alert]);
    }

    #[tokio::test]
    async fn test_update_config_resizes_permits() {
        let g = gateway();
        assert_eq!(g.available_permits(), 10);
        g.update_config(ConfigUpdate {
            concurrent_request_limit: Some(4),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(g.available_permits(), 4);
        g.update_config(ConfigUpdate {
            concurrent_request_limit: Some(12),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(g.available_permits(), 12);
    }

    #[test]
    fn test_shrinking_permits_without_runtime_retires_held_permits() {
        let g = gateway();
        let held = Arc::clone(&g.permits).try_acquire_many_owned(9).unwrap();
        assert_eq!(g.available_permits(), 1);

        // One idle permit is forgotten now; four more once the holders release
        g.update_config(ConfigUpdate {
            concurrent_request_limit: Some(5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(g.available_permits(), 0);

        drop(held);
        let started = Instant::now();
        while g.available_permits() != 5 && started.elapsed() < std::time::Duration::from_secs(2) {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(g.available_permits(), 5);
    }

    #[test]
    fn test_update_config_rejects_invalid_values() {
        let g = gateway();
        let err = g
            .update_config(ConfigUpdate {
                max_retry_attempts: Some(0),
                concurrent_request_limit: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        match err {
            ConfigError::Invalid(problems) => assert_eq!(problems.len(), 2),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(g.config().max_retry_attempts, 5);
        assert_eq!(g.available_permits(), 10);
    }

    #[tokio::test]
    async fn test_update_cleaning_rules_applies_to_next_request() {
        let g = with_primary(Some("L'avocat XYZ"));
        let first = g
            .translate(TranslationRequest::new("المحامي", Language::Arabic, Language::French))
            .await;
        assert_eq!(first.method, TranslationMethod::Primary);

        let mut rules = crate::cleaner::default_cleaning_rules();
        rules.push(crate::cleaner::CleaningRule::literal("XYZ"));
        g.update_config(ConfigUpdate {
            cleaning_rules: Some(rules),
            ..Default::default()
        })
        .unwrap();
        let report = g.validate_quality("L'avocat XYZ", Language::French);
        assert!(report.metrics.purity_score < 100.0);

        // The cache was cleared, so the primary output is validated again and rejected
        let second = g
            .translate(TranslationRequest::new("المحامي", Language::Arabic, Language::French))
            .await;
        assert!(!second.metadata.cache_hit);
        assert_eq!(second.method, TranslationMethod::Dictionary);
    }

    /// Backend that records the text it was asked to translate.
    struct RecordingBackend {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl TranslationBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        async fn translate(
            &self,
            text: &str,
            _source: Language,
            _target: Language,
            _domain: Option<LegalDomain>,
        ) -> Result<String, crate::engine::BackendError> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok("The lawyer".to_string())
        }
    }

    #[tokio::test]
    async fn test_source_is_cleaned_once_for_all_attempts() {
        let backend = Arc::new(RecordingBackend {
            seen: Mutex::new(Vec::new()),
        });
        let g = TranslationGateway::with_backends(
            PipelineConfig::default(),
            Arc::new(TerminologyManager::with_builtin()),
            Some(backend.clone()),
            Some(backend.clone()),
        )
        .unwrap();

        let result = g
            .translate(TranslationRequest::new("المحاميPro", Language::Arabic, Language::French))
            .await;

        assert_eq!(
            *backend.seen.lock().unwrap(),
            vec!["المحامي".to_string(), "المحامي".to_string()]
        );
        let cleaning_steps = result
            .metadata
            .step_durations
            .iter()
            .filter(|s| s.step == "cleaning")
            .count();
        assert_eq!(cleaning_steps, 1);
        assert_eq!(result.method, TranslationMethod::Dictionary);
    }
}
