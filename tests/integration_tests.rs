//! Integration tests for the legal translation pipeline
//!
//! These tests drive the public gateway API end to end: cleaning, method
//! cascade, purity gate, fallback, cache, telemetry and alerting. No test
//! needs network access; HTTP backends are mocked with wiremock.

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use legal_translation_purity::config::{
    AlertSeverity, BackendSettings, ConfigError, ConfigUpdate, PipelineConfig, QualityThreshold,
};
use legal_translation_purity::engine::{BackendError, TranslationBackend, TranslationMethod};
use legal_translation_purity::gateway::{ContentType, TranslationGateway, TranslationRequest};
use legal_translation_purity::metrics::{HealthStatus, TimeRange, TranslationEvent};
use legal_translation_purity::monitor::{AlertType, QualityMetrics};
use legal_translation_purity::terminology::{
    LegalDictionary, LegalDomain, LegalTermEntry, TerminologyManager,
};
use legal_translation_purity::Language;

// ==================== Test Helpers ====================

/// Backend that answers after a delay and tracks how many calls overlap.
struct SlowBackend {
    delay: Duration,
    reply: String,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowBackend {
    fn new(delay: Duration, reply: &str) -> Self {
        Self {
            delay,
            reply: reply.to_string(),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranslationBackend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    async fn translate(
        &self,
        _text: &str,
        _source: Language,
        _target: Language,
        _domain: Option<LegalDomain>,
    ) -> Result<String, BackendError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

fn gateway() -> TranslationGateway {
    TranslationGateway::new(PipelineConfig::default()).expect("default config is valid")
}

fn gateway_with(config: PipelineConfig, primary: Arc<dyn TranslationBackend>) -> TranslationGateway {
    TranslationGateway::with_backends(
        config,
        Arc::new(TerminologyManager::with_builtin()),
        Some(primary),
        None,
    )
    .expect("config is valid")
}

fn ar_to_fr(text: &str) -> TranslationRequest {
    TranslationRequest::new(text, Language::Arabic, Language::French)
}

fn create_openai_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

fn completed(purity: f64, method: TranslationMethod) -> TranslationEvent {
    TranslationEvent::Completed {
        request_id: "req-test".to_string(),
        method,
        purity_score: purity,
        processing_ms: 20,
        fallback_used: false,
    }
}

// ==================== Scenario Tests ====================

#[tokio::test]
async fn test_scenario_interface_artifacts_are_removed() {
    let result = gateway()
        .translate(ar_to_fr("محامي دي زادمتصلمحاميProتحليلملفاتV2AUTO-TRANSLATE"))
        .await;

    for artifact in ["Pro", "V2", "AUTO-TRANSLATE"] {
        assert!(
            !result.translated_text.contains(artifact),
            "'{}' leaked into '{}'",
            artifact,
            result.translated_text
        );
    }
    assert_eq!(result.purity_score, 100.0);
    assert!(!result
        .translated_text
        .chars()
        .any(|c| ('\u{0600}'..='\u{06FF}').contains(&c)));
}

#[tokio::test]
async fn test_scenario_foreign_fragments_are_removed() {
    let result = gateway()
        .translate(ar_to_fr(
            "الشهود Defined في المادة 1 من قانون الإجراءات الجنائية ال процедة",
        ))
        .await;

    assert!(!result
        .translated_text
        .chars()
        .any(|c| ('\u{0400}'..='\u{04FF}').contains(&c)));
    assert!(!result.translated_text.contains("Defined"));
    assert_eq!(result.purity_score, 100.0);
    assert!(result.translated_text.contains("Code de procédure pénale"));
}

#[tokio::test]
async fn test_scenario_repeat_request_hits_cache() {
    let g = gateway();
    let request = ar_to_fr("الشهود في المادة 1 من قانون الإجراءات الجنائية");

    let first = g.translate(request.clone()).await;
    let second = g.translate(request).await;

    assert!(!first.metadata.cache_hit);
    assert!(second.metadata.cache_hit);
    assert_eq!(second.method, TranslationMethod::Cached);
    assert_eq!(first.translated_text, second.translated_text);
    assert_eq!(second.purity_score, 100.0);
}

#[test]
fn test_scenario_perfect_quality_scores_exactly_100() {
    let metrics = QualityMetrics {
        purity_score: 100.0,
        terminology_accuracy: 100.0,
        contextual_relevance: 100.0,
        readability_score: 100.0,
        professionalism_score: 100.0,
        encoding_integrity: 100.0,
        user_satisfaction: None,
    };
    assert_eq!(metrics.overall_score(), 100.0);
}

#[test]
fn test_scenario_low_purity_rate_is_critical() {
    let g = gateway();
    let telemetry = g.telemetry();
    for _ in 0..17 {
        telemetry.record(completed(100.0, TranslationMethod::Primary));
    }
    for _ in 0..3 {
        telemetry.record(completed(92.0, TranslationMethod::Primary));
    }

    let health = g.get_system_health();
    assert!((health.metrics.purity_rate - 85.0).abs() < 1e-9);
    assert_eq!(health.status, HealthStatus::Critical);
    assert_eq!(
        serde_json::to_value(health.status).unwrap(),
        serde_json::json!("critical")
    );
}

// ==================== Guarantee Tests ====================

#[tokio::test]
async fn test_rejected_backend_output_falls_through_to_hybrid() {
    let g = gateway_with(
        PipelineConfig::default(),
        Arc::new(SlowBackend::new(Duration::ZERO, "The defendant زادمتصل")),
    );
    let result = g.translate(ar_to_fr("زادمتصل دي المحامي")).await;

    assert_eq!(result.method, TranslationMethod::Hybrid);
    assert_eq!(result.translated_text, "L'avocat");
    assert_eq!(result.purity_score, 100.0);
    assert_eq!(
        result.metadata.methods_tried,
        vec![
            TranslationMethod::Primary,
            TranslationMethod::Dictionary,
            TranslationMethod::RuleBased,
            TranslationMethod::Hybrid
        ]
    );
    assert!(result.warnings.iter().any(|w| w.starts_with("primary output rejected")));
    assert!(result.warnings.iter().any(|w| w.starts_with("rule_based output rejected")));
}

#[tokio::test]
async fn test_fallback_guarantee_for_untranslatable_text() {
    let g = gateway_with(
        PipelineConfig::default(),
        Arc::new(SlowBackend::new(Duration::ZERO, "Loading... the lawyer")),
    );
    let result = g.translate(ar_to_fr("زادمتصل دي")).await;

    assert!(result.metadata.fallback_used);
    assert_eq!(result.purity_score, 100.0);
    assert_eq!(result.method, TranslationMethod::Template);
    assert!(result.warnings.iter().any(|w| w.contains("primary output rejected")));

    let events = g.telemetry().events();
    assert!(events
        .iter()
        .any(|e| matches!(e.event, TranslationEvent::FallbackTriggered { .. })));
}

#[tokio::test]
async fn test_fallback_lists_legal_concepts() {
    let g = gateway_with(
        PipelineConfig::default(),
        Arc::new(SlowBackend::new(Duration::ZERO, "Witness statement")),
    );
    // Every method is capped to the impure primary, so fallback always runs
    g.update_config(ConfigUpdate {
        max_retry_attempts: Some(1),
        ..Default::default()
    })
    .unwrap();
    let result = g.translate(ar_to_fr("الشهود في قانون الإجراءات الجنائية")).await;

    assert_eq!(result.method, TranslationMethod::FallbackGenerated);
    assert_eq!(result.purity_score, 100.0);
    assert!(result.translated_text.contains("droit pénal"));
    assert!(result.translated_text.contains("les témoins"));
}

#[tokio::test]
async fn test_timeout_returns_emergency_content() {
    let mut config = PipelineConfig::default();
    config.processing_timeout = Duration::from_millis(100);
    let g = gateway_with(
        config,
        Arc::new(SlowBackend::new(Duration::from_secs(5), "L'avocat")),
    );

    let started = Instant::now();
    let result = g.translate(ar_to_fr("المحامي")).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(result.method, TranslationMethod::EmergencyGeneric);
    assert!(result.metadata.fallback_used);
    assert_eq!(result.translated_text, Language::French.strings().emergency_generic);
    assert!(result.warnings.iter().any(|w| w.contains("exceeded")));
    assert_eq!(g.get_metrics(TimeRange::all()).failure_rate, 100.0);
}

#[tokio::test]
async fn test_empty_input_is_not_an_error() {
    let result = gateway().translate(ar_to_fr("")).await;
    assert_eq!(result.purity_score, 100.0);
    assert!(result.metadata.fallback_used);
    assert!(!result.translated_text.is_empty());
}

#[tokio::test]
async fn test_oversized_input_is_clamped() {
    let mut config = PipelineConfig::default();
    config.max_input_chars = 50;
    let g = TranslationGateway::new(config).unwrap();
    let text = "المحامي في المحكمة ".repeat(200);
    let result = g.translate(ar_to_fr(&text)).await;
    assert_eq!(result.purity_score, 100.0);
    assert!(result.warnings.iter().any(|w| w.contains("truncated")));
}

// ==================== Batch & Concurrency Tests ====================

#[tokio::test]
async fn test_batch_preserves_order() {
    let g = gateway();
    let requests = vec![
        ar_to_fr("المحامي"),
        TranslationRequest::new("le tribunal", Language::French, Language::Arabic),
        ar_to_fr(""),
        ar_to_fr("القاضي").with_content_type(ContentType::ChatMessage),
    ];
    let results = g.translate_batch(requests).await;

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].translated_text, "l'avocat");
    assert_eq!(results[1].translated_text, "المحكمة");
    assert!(results[2].metadata.fallback_used);
    assert_eq!(results[3].translated_text, "le juge");
    assert!(results.iter().all(|r| r.purity_score == 100.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_limit_queues_requests() {
    let mut config = PipelineConfig::default();
    config.concurrent_request_limit = 2;
    let backend = Arc::new(SlowBackend::new(Duration::from_millis(100), "L'avocat"));
    let g = gateway_with(config, backend.clone());

    let requests: Vec<TranslationRequest> = (0..6)
        .map(|i| ar_to_fr(&format!("المحامي {}", i)))
        .collect();
    let results = g.translate_batch(requests).await;

    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|r| r.method == TranslationMethod::Primary));
    assert!(backend.peak.load(Ordering::SeqCst) <= 2);
}

// ==================== HTTP Backend Tests ====================

#[tokio::test]
async fn test_openai_backend_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-openai-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_openai_response("Le tribunal a statué.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = PipelineConfig {
        backend: Some(BackendSettings {
            api_key: "test-openai-key".to_string(),
            api_url: format!("{}/v1/chat/completions", server.uri()),
            model: "gpt-4o-mini".to_string(),
            secondary_model: None,
        }),
        ..PipelineConfig::default()
    };
    let g = TranslationGateway::new(config).unwrap();
    let result = g.translate(ar_to_fr("حكمت المحكمة.")).await;

    assert_eq!(result.method, TranslationMethod::Primary);
    assert_eq!(result.translated_text, "Le tribunal a statué.");
    assert_eq!(result.purity_score, 100.0);
}

#[tokio::test]
async fn test_openai_contaminated_output_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(create_openai_response("L'avocat (lawyer) محامي")),
        )
        .mount(&server)
        .await;

    let config = PipelineConfig {
        backend: Some(BackendSettings {
            api_key: "k".to_string(),
            api_url: format!("{}/v1/chat/completions", server.uri()),
            model: "gpt-4o-mini".to_string(),
            secondary_model: Some("gpt-4o".to_string()),
        }),
        ..PipelineConfig::default()
    };
    let g = TranslationGateway::new(config).unwrap();
    let result = g.translate(ar_to_fr("المحامي")).await;

    assert_eq!(result.method, TranslationMethod::Dictionary);
    assert_eq!(
        result.metadata.methods_tried,
        vec![
            TranslationMethod::Primary,
            TranslationMethod::Secondary,
            TranslationMethod::Dictionary
        ]
    );
    assert_eq!(result.purity_score, 100.0);
}

// ==================== Monitoring Tests ====================

#[test]
fn test_breach_alert_persists_until_acknowledged() {
    let g = gateway();
    let monitor = g.monitor();
    g.telemetry().record(completed(100.0, TranslationMethod::Primary));
    g.telemetry().record(completed(70.0, TranslationMethod::EmergencyGeneric));

    monitor.tick();
    let breach = monitor
        .unacknowledged()
        .into_iter()
        .find(|a| a.alert_type == AlertType::ThresholdBreach && a.metric.as_deref() == Some("purity_rate"))
        .expect("purity breach recorded");
    assert_eq!(breach.severity, AlertSeverity::Critical);
    assert!(monitor
        .unacknowledged()
        .iter()
        .any(|a| a.metric.as_deref() == Some("error_rate") && a.severity == AlertSeverity::High));

    monitor.tick();
    assert!(monitor.unacknowledged().iter().any(|a| a.id == breach.id));

    assert!(monitor.acknowledge(breach.id));
    assert!(!monitor.unacknowledged().iter().any(|a| a.id == breach.id));
}

#[tokio::test]
async fn test_metrics_reflect_traffic() {
    let g = gateway();
    g.translate(ar_to_fr("المحامي")).await;
    g.translate(ar_to_fr("المحامي")).await;
    g.translate(ar_to_fr("زادمتصل")).await;

    let metrics = g.get_metrics(TimeRange::all());
    assert_eq!(metrics.total_requests, 3);
    assert_eq!(metrics.completed_requests, 3);
    assert_eq!(metrics.purity_rate, 100.0);
    // miss, hit, miss
    assert!((metrics.cache_hit_rate - 100.0 / 3.0).abs() < 1e-9);
    assert!(metrics.fallback_rate > 33.0);
    assert!(metrics
        .method_effectiveness
        .contains_key(&TranslationMethod::Dictionary));
}

#[test]
fn test_validate_quality_reports_issues() {
    let report = gateway().validate_quality("Le contrat signé par the lawyer", Language::French);
    assert!(report.metrics.purity_score < 100.0);
    assert!(!report.issues.is_empty());
    assert!(!report.recommendations.is_empty());
}

// ==================== Configuration Tests ====================

#[test]
fn test_invalid_config_is_rejected_at_construction() {
    let mut config = PipelineConfig::default();
    config.quality_thresholds.push(QualityThreshold {
        metric: "terminology_accuracy".to_string(),
        min: Some(95.0),
        max: Some(90.0),
        severity: AlertSeverity::High,
        enabled: true,
    });
    config.max_retry_attempts = 0;

    match TranslationGateway::new(config) {
        Err(ConfigError::Invalid(problems)) => assert_eq!(problems.len(), 2),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("invalid config accepted"),
    }
}

#[test]
fn test_invalid_update_is_not_applied() {
    let g = gateway();
    let err = g
        .update_config(ConfigUpdate {
            quality_thresholds: Some(vec![QualityThreshold {
                metric: "purity_rate".to_string(),
                min: None,
                max: None,
                severity: AlertSeverity::Critical,
                enabled: true,
            }]),
            ..Default::default()
        })
        .unwrap_err();
    assert!(err.to_string().contains("neither min nor max"));
    assert_eq!(g.config().quality_thresholds.len(), 5);
}

#[tokio::test]
async fn test_disabling_zero_tolerance_keeps_the_gate() {
    let g = gateway_with(
        PipelineConfig::default(),
        Arc::new(SlowBackend::new(Duration::ZERO, "L'avocat Pro")),
    );
    g.update_config(ConfigUpdate {
        zero_tolerance_enabled: Some(false),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(g.config().effective_min_purity(), 100.0);

    let result = g.translate(ar_to_fr("المحامي")).await;
    assert_ne!(result.method, TranslationMethod::Primary);
    assert_eq!(result.purity_score, 100.0);
}

// ==================== Dictionary Tests ====================

#[tokio::test]
async fn test_loaded_dictionary_drives_translation() {
    let dictionary = LegalDictionary {
        domain: LegalDomain::Commercial,
        version: "2025.1".to_string(),
        authority: "Ordre des avocats".to_string(),
        entries: vec![LegalTermEntry {
            source_term: "كمبيالة".to_string(),
            target_term: "lettre de change".to_string(),
            source_language: Language::Arabic,
            target_language: Language::French,
            definition: "Effet de commerce".to_string(),
            domain: LegalDomain::Commercial,
            confidence: 0.95,
            last_verified: chrono::Utc::now(),
            alternatives: vec!["traite".to_string()],
        }],
    };
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(serde_json::to_string_pretty(&dictionary).unwrap().as_bytes())
        .expect("write dictionary");

    let terminology = Arc::new(TerminologyManager::with_builtin());
    terminology.add_dictionary(LegalDictionary::from_json_file(file.path()).expect("load"));

    let g = TranslationGateway::with_backends(PipelineConfig::default(), terminology, None, None).unwrap();
    let result = g.translate(ar_to_fr("كمبيالة")).await;
    assert_eq!(result.method, TranslationMethod::Dictionary);
    assert_eq!(result.translated_text, "lettre de change");

    let report = g.validate_quality("La traite est échue.", Language::French);
    assert!(report.metrics.terminology_accuracy < 100.0);
}

// ==================== Property Tests ====================

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_gateway_never_returns_impure_text(
            text in prop_oneof![
                "\\PC{0,60}",
                "[ابتثجحخدذرزسشصضطظعغفقكلمنهوي a-zA-Z0-9،.]{0,60}",
            ],
            to_arabic in any::<bool>(),
        ) {
            let (source, target) = if to_arabic {
                (Language::French, Language::Arabic)
            } else {
                (Language::Arabic, Language::French)
            };
            let g = gateway();
            let result = tokio_test::block_on(g.translate(TranslationRequest::new(text, source, target)));

            prop_assert!(!result.translated_text.trim().is_empty());
            prop_assert!(
                result.purity_score == 100.0 || result.method == TranslationMethod::EmergencyGeneric,
                "{:?} returned with purity {}",
                result.method,
                result.purity_score
            );
        }
    }
}
