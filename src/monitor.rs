//! Quality assessment and alerting.
//!
//! Each completed translation is assessed into six 0-100 metrics and a
//! weighted overall score. Assessments land in a capped history that feeds
//! trend detection. A periodic tick re-checks the configured thresholds
//! against telemetry aggregates and the recent history, raising one alert per
//! breach.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::config::{AlertSeverity, QualityThreshold, SharedConfig};
use crate::i18n::Language;
use crate::metrics::{TelemetryCollector, TimeRange, TranslationEvent};
use crate::terminology::{normalize_term, TerminologyManager};
use crate::validator::{PurityValidationResult, PurityViolation, ViolationType};

// Weights of the overall score, in percent
const WEIGHT_PURITY: f64 = 40.0;
const WEIGHT_TERMINOLOGY: f64 = 20.0;
const WEIGHT_RELEVANCE: f64 = 15.0;
const WEIGHT_READABILITY: f64 = 10.0;
const WEIGHT_PROFESSIONALISM: f64 = 10.0;
const WEIGHT_ENCODING: f64 = 5.0;

/// Words per sentence above which readability starts to drop.
const COMFORTABLE_SENTENCE_WORDS: f64 = 25.0;
const INFORMAL_PENALTY: f64 = 15.0;

const FRENCH_INFORMAL: &[&str] = &["lol", "mdr", "ptdr", "svp", "stp", "ouais", "cool", "bref", "ok"];
const ARABIC_INFORMAL: &[&str] = &["ههه", "هههه", "يعني", "اوكي", "طيب"];

/// Per-request metric floors used when no threshold of the same name is configured.
const REQUEST_MINIMUMS: &[(&str, f64, AlertSeverity)] = &[
    ("purity_score", 100.0, AlertSeverity::Critical),
    ("terminology_accuracy", 90.0, AlertSeverity::High),
    ("contextual_relevance", 70.0, AlertSeverity::Medium),
    ("readability", 60.0, AlertSeverity::Low),
    ("professionalism", 70.0, AlertSeverity::Low),
    ("encoding_integrity", 100.0, AlertSeverity::Critical),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub purity_score: f64,
    pub terminology_accuracy: f64,
    pub contextual_relevance: f64,
    pub readability_score: f64,
    pub professionalism_score: f64,
    pub encoding_integrity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_satisfaction: Option<f64>,
}

impl QualityMetrics {
    /// Fixed weighted sum; purity carries 40%.
    pub fn overall_score(&self) -> f64 {
        (WEIGHT_PURITY * self.purity_score
            + WEIGHT_TERMINOLOGY * self.terminology_accuracy
            + WEIGHT_RELEVANCE * self.contextual_relevance
            + WEIGHT_READABILITY * self.readability_score
            + WEIGHT_PROFESSIONALISM * self.professionalism_score
            + WEIGHT_ENCODING * self.encoding_integrity)
            / 100.0
    }

    /// Look a metric up by its threshold name.
    pub fn value(&self, name: &str) -> Option<f64> {
        match name {
            "purity_score" => Some(self.purity_score),
            "terminology_accuracy" => Some(self.terminology_accuracy),
            "contextual_relevance" => Some(self.contextual_relevance),
            "readability" => Some(self.readability_score),
            "professionalism" => Some(self.professionalism_score),
            "encoding_integrity" => Some(self.encoding_integrity),
            "user_satisfaction" => self.user_satisfaction,
            "overall_score" => Some(self.overall_score()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssueType {
    LanguageMixing,
    CorruptedCharacters,
    PoorTerminology,
    ContextLoss,
    EncodingError,
    Readability,
    UiContamination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityIssue {
    pub issue_type: QualityIssueType,
    pub severity: AlertSeverity,
    pub location: Option<(usize, usize)>,
    pub description: String,
    pub suggested_fix: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    ContentCleaning,
    TerminologyUpdate,
    EncodingFix,
    ContextEnhancement,
    StyleReview,
}

impl RecommendationType {
    fn for_issue(issue: QualityIssueType) -> Self {
        match issue {
            QualityIssueType::LanguageMixing | QualityIssueType::UiContamination => {
                RecommendationType::ContentCleaning
            }
            QualityIssueType::CorruptedCharacters | QualityIssueType::EncodingError => {
                RecommendationType::EncodingFix
            }
            QualityIssueType::PoorTerminology => RecommendationType::TerminologyUpdate,
            QualityIssueType::ContextLoss => RecommendationType::ContextEnhancement,
            QualityIssueType::Readability => RecommendationType::StyleReview,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            RecommendationType::ContentCleaning => {
                "Extend the cleaning rules to strip the foreign fragments and interface artifacts found"
            }
            RecommendationType::TerminologyUpdate => {
                "Review the legal dictionary entries involved and align them with the canonical renderings"
            }
            RecommendationType::EncodingFix => "Normalize the source encoding before translation",
            RecommendationType::ContextEnhancement => {
                "Provide the legal domain or prior translations as request context"
            }
            RecommendationType::StyleReview => "Have the output reviewed for register and sentence length",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRecommendation {
    pub recommendation_type: RecommendationType,
    pub priority: AlertSeverity,
    pub description: String,
    /// Issues this recommendation addresses
    pub addresses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub metrics: QualityMetrics,
    pub overall_score: f64,
    pub issues: Vec<QualityIssue>,
    pub recommendations: Vec<QualityRecommendation>,
    pub trend: Trend,
    pub timestamp: DateTime<Utc>,
}

// ==================== Alerts ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ThresholdBreach,
    Degradation,
    Anomaly,
    UserComplaint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAlert {
    pub id: u64,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub metric: Option<String>,
    pub value: Option<f64>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
    pub resolved: bool,
}

/// Delivery channel for alerts.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, alert: &QualityAlert);
}

/// Writes alerts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn deliver(&self, alert: &QualityAlert) {
        match alert.severity {
            AlertSeverity::Critical | AlertSeverity::High => error!(
                "🚨 Quality alert #{} ({:?}, {:?}): {}",
                alert.id, alert.alert_type, alert.severity, alert.message
            ),
            AlertSeverity::Medium | AlertSeverity::Low => warn!(
                "Quality alert #{} ({:?}, {:?}): {}",
                alert.id, alert.alert_type, alert.severity, alert.message
            ),
        }
    }
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    at: DateTime<Utc>,
    metrics: QualityMetrics,
    overall: f64,
}

#[derive(Debug, Default)]
struct MonitorState {
    history: VecDeque<HistoryEntry>,
    alerts: Vec<QualityAlert>,
    next_alert_id: u64,
    last_trend: Option<Trend>,
}

pub struct QualityMonitor {
    config: SharedConfig,
    telemetry: Arc<TelemetryCollector>,
    terminology: Arc<TerminologyManager>,
    sinks: Vec<Arc<dyn AlertSink>>,
    state: Mutex<MonitorState>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn length_score(source: &str, candidate: &str) -> f64 {
    let source_len = source.chars().filter(|c| !c.is_whitespace()).count();
    let candidate_len = candidate.chars().filter(|c| !c.is_whitespace()).count();
    if source_len == 0 {
        return 100.0;
    }
    let ratio = candidate_len as f64 / source_len as f64;
    if ratio < 0.5 {
        ratio / 0.5 * 100.0
    } else if ratio > 2.0 {
        2.0 / ratio * 100.0
    } else {
        100.0
    }
}

fn readability(text: &str) -> f64 {
    let sentences: Vec<usize> = text
        .split(['.', '!', '?', '؟', ';', '؛'])
        .map(|s| s.split_whitespace().count())
        .filter(|n| *n > 0)
        .collect();
    let Some(average) = mean(sentences.iter().map(|n| *n as f64)) else {
        return 0.0;
    };
    if average <= COMFORTABLE_SENTENCE_WORDS {
        100.0
    } else {
        (100.0 - (average - COMFORTABLE_SENTENCE_WORDS) * 2.0).max(0.0)
    }
}

fn professionalism(text: &str, language: Language) -> f64 {
    let informal = match language {
        Language::French => FRENCH_INFORMAL,
        Language::Arabic => ARABIC_INFORMAL,
    };
    let mut markers = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| informal.contains(&w.to_lowercase().as_str()))
        .count();
    markers += ["!!", "??", "?!", "؟؟"]
        .iter()
        .map(|p| text.matches(p).count())
        .sum::<usize>();
    markers += text
        .chars()
        .filter(|c| matches!(*c as u32, 0x1F300..=0x1FAFF | 0x2600..=0x27BF))
        .count();
    (100.0 - markers as f64 * INFORMAL_PENALTY).max(0.0)
}

fn issue_for_violation(violation: &PurityViolation) -> QualityIssue {
    let issue_type = match violation.violation_type {
        ViolationType::MixedScripts | ViolationType::ForeignFragment => QualityIssueType::LanguageMixing,
        ViolationType::CorruptedCharacter => QualityIssueType::CorruptedCharacters,
        ViolationType::TerminologyInconsistency => QualityIssueType::PoorTerminology,
        ViolationType::UiArtifact => QualityIssueType::UiContamination,
        ViolationType::Incoherence => QualityIssueType::ContextLoss,
    };
    QualityIssue {
        issue_type,
        severity: violation.severity,
        location: violation.location,
        description: if violation.text.is_empty() {
            format!("{:?}", violation.violation_type)
        } else {
            format!("{:?}: '{}'", violation.violation_type, violation.text)
        },
        suggested_fix: violation.suggested_fix.clone(),
        confidence: 1.0,
    }
}

fn issue_for_metric(metric: &str) -> QualityIssueType {
    match metric {
        "terminology_accuracy" => QualityIssueType::PoorTerminology,
        "contextual_relevance" => QualityIssueType::ContextLoss,
        "encoding_integrity" => QualityIssueType::EncodingError,
        "readability" | "professionalism" => QualityIssueType::Readability,
        _ => QualityIssueType::LanguageMixing,
    }
}

fn recommendations_for(issues: &[QualityIssue]) -> Vec<QualityRecommendation> {
    let mut recommendations: Vec<QualityRecommendation> = Vec::new();
    for issue in issues {
        let kind = RecommendationType::for_issue(issue.issue_type);
        match recommendations.iter_mut().find(|r| r.recommendation_type == kind) {
            Some(existing) => {
                existing.addresses += 1;
                existing.priority = existing.priority.max(issue.severity);
            }
            None => recommendations.push(QualityRecommendation {
                recommendation_type: kind,
                priority: issue.severity,
                description: kind.description().to_string(),
                addresses: 1,
            }),
        }
    }
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

impl QualityMonitor {
    pub fn new(
        config: SharedConfig,
        telemetry: Arc<TelemetryCollector>,
        terminology: Arc<TerminologyManager>,
    ) -> Self {
        Self {
            config,
            telemetry,
            terminology,
            sinks: vec![Arc::new(TracingAlertSink)],
            state: Mutex::new(MonitorState::default()),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Compute the six metrics for `text` in `target`.
    ///
    /// `source` is the original request text and language, when there is one;
    /// without it relevance cannot be measured and counts as 100.
    pub fn measure(
        &self,
        source: Option<(&str, Language)>,
        text: &str,
        target: Language,
        validation: &PurityValidationResult,
    ) -> QualityMetrics {
        let contextual_relevance = match source {
            None => 100.0,
            Some((source_text, source_language)) => {
                let length = length_score(source_text, text);
                let concepts = self.terminology.concepts(source_text, source_language, target);
                if concepts.is_empty() {
                    length
                } else {
                    let haystack = normalize_term(text);
                    let covered = concepts
                        .iter()
                        .filter(|c| haystack.contains(&normalize_term(&c.translation)))
                        .count();
                    let coverage = covered as f64 / concepts.len() as f64 * 100.0;
                    0.7 * coverage + 0.3 * length
                }
            }
        };

        QualityMetrics {
            purity_score: validation.score.overall,
            terminology_accuracy: validation.score.terminology_consistency,
            contextual_relevance,
            readability_score: readability(text),
            professionalism_score: professionalism(text, target),
            encoding_integrity: validation.score.encoding_integrity,
            user_satisfaction: None,
        }
    }

    /// Build a report without touching the history.
    pub fn evaluate(
        &self,
        source: Option<(&str, Language)>,
        text: &str,
        target: Language,
        validation: &PurityValidationResult,
    ) -> QualityReport {
        let metrics = self.measure(source, text, target, validation);
        let issues = self.detect_issues(&metrics, validation);
        let recommendations = recommendations_for(&issues);
        QualityReport {
            overall_score: metrics.overall_score(),
            metrics,
            issues,
            recommendations,
            trend: self.trend(),
            timestamp: Utc::now(),
        }
    }

    /// Evaluate a completed translation and add it to the history.
    pub fn assess(
        &self,
        source: Option<(&str, Language)>,
        text: &str,
        target: Language,
        validation: &PurityValidationResult,
    ) -> QualityReport {
        let mut report = self.evaluate(source, text, target, validation);
        let config = self.config.snapshot();
        let mut raised = Vec::new();

        {
            let mut state = self.lock();

            let recent: Vec<f64> = state
                .history
                .iter()
                .rev()
                .take(config.trend_window)
                .map(|e| e.overall)
                .collect();
            if recent.len() >= config.trend_window {
                if let Some(baseline) = mean(recent.into_iter()) {
                    if report.overall_score < baseline - config.anomaly_margin {
                        raised.push((
                            AlertType::Anomaly,
                            AlertSeverity::Medium,
                            report.overall_score,
                            format!(
                                "Quality score {:.1} is far below the recent mean {:.1}",
                                report.overall_score, baseline
                            ),
                        ));
                    }
                }
            }

            if state.history.len() >= config.history_capacity {
                state.history.pop_front();
            }
            state.history.push_back(HistoryEntry {
                at: report.timestamp,
                metrics: report.metrics,
                overall: report.overall_score,
            });

            let (trend, means) = trend_of(&state.history, config.trend_window, config.trend_margin);
            if trend == Trend::Declining && state.last_trend != Some(Trend::Declining) {
                if let Some((previous, recent)) = means {
                    raised.push((
                        AlertType::Degradation,
                        AlertSeverity::High,
                        recent,
                        format!(
                            "Quality declining: recent mean {:.1} vs previous {:.1}",
                            recent, previous
                        ),
                    ));
                }
            }
            state.last_trend = Some(trend);
            report.trend = trend;
        }

        for (alert_type, severity, value, message) in raised {
            self.raise(alert_type, severity, Some("overall_score"), Some(value), message);
        }
        report
    }

    fn detect_issues(&self, metrics: &QualityMetrics, validation: &PurityValidationResult) -> Vec<QualityIssue> {
        let config = self.config.snapshot();
        let mut issues: Vec<QualityIssue> = validation.violations.iter().map(issue_for_violation).collect();

        for (name, minimum, severity) in REQUEST_MINIMUMS {
            let Some(value) = metrics.value(name) else { continue };
            let configured = config.quality_thresholds.iter().find(|t| t.metric == *name);
            let (breached, severity) = match configured {
                Some(threshold) if threshold.enabled => (threshold.is_breached_by(value), threshold.severity),
                Some(_) => (false, *severity),
                None => (value < *minimum, *severity),
            };
            if !breached {
                continue;
            }
            let issue_type = issue_for_metric(name);
            // Violations already describe purity problems in detail
            if *name == "purity_score" && !validation.violations.is_empty() {
                continue;
            }
            issues.push(QualityIssue {
                issue_type,
                severity,
                location: None,
                description: format!("{} is {:.1}, below the acceptable level", name, value),
                suggested_fix: RecommendationType::for_issue(issue_type).description().to_string(),
                confidence: 0.8,
            });
        }
        issues
    }

    /// Current trend of the overall score.
    pub fn trend(&self) -> Trend {
        let config = self.config.snapshot();
        trend_of(&self.lock().history, config.trend_window, config.trend_margin).0
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Re-check every enabled threshold. Returns the alerts raised.
    pub fn tick(&self) -> Vec<QualityAlert> {
        let config = self.config.snapshot();
        let range = TimeRange::last(config.monitoring_window);
        let metrics = self.telemetry.get_metrics(range);
        let has_traffic = metrics.completed_requests > 0;

        let history: Vec<HistoryEntry> = self
            .lock()
            .history
            .iter()
            .filter(|e| range.contains(e.at))
            .cloned()
            .collect();

        let mut raised = Vec::new();
        for threshold in config.quality_thresholds.iter().filter(|t| t.enabled) {
            let value = match threshold.metric.as_str() {
                "purity_rate" => has_traffic.then_some(metrics.purity_rate),
                "error_rate" | "failure_rate" => has_traffic.then_some(metrics.failure_rate),
                "processing_time_ms" => has_traffic.then_some(metrics.average_processing_ms),
                "fallback_rate" => has_traffic.then_some(metrics.fallback_rate),
                "cache_hit_rate" => has_traffic.then_some(metrics.cache_hit_rate),
                name => mean(history.iter().filter_map(|e| e.metrics.value(name))),
            };
            let Some(value) = value else { continue };
            if threshold.is_breached_by(value) {
                raised.push(self.raise_breach(threshold, value));
            }
        }

        debug!(
            "Monitor tick: {} completed in window, purity rate {:.1}%, {} alerts raised",
            metrics.completed_requests,
            metrics.purity_rate,
            raised.len()
        );
        raised
    }

    fn raise_breach(&self, threshold: &QualityThreshold, value: f64) -> QualityAlert {
        let bound = match (threshold.min, threshold.max) {
            (Some(min), _) if value < min => format!("below minimum {}", min),
            (_, Some(max)) => format!("above maximum {}", max),
            _ => "out of bounds".to_string(),
        };
        self.raise(
            AlertType::ThresholdBreach,
            threshold.severity,
            Some(&threshold.metric),
            Some(value),
            format!("{} at {:.2} is {}", threshold.metric, value, bound),
        )
    }

    /// Record a user-reported problem.
    pub fn record_user_complaint(
        &self,
        request_id: Option<&str>,
        description: &str,
        severity: AlertSeverity,
    ) -> QualityAlert {
        self.telemetry.record(TranslationEvent::UserFeedback {
            request_id: request_id.map(str::to_string),
            description: description.to_string(),
            severity,
        });
        let message = match request_id {
            Some(id) => format!("User reported on {}: {}", id, description),
            None => format!("User reported: {}", description),
        };
        self.raise(AlertType::UserComplaint, severity, None, None, message)
    }

    fn raise(
        &self,
        alert_type: AlertType,
        severity: AlertSeverity,
        metric: Option<&str>,
        value: Option<f64>,
        message: String,
    ) -> QualityAlert {
        let retention = self.config.snapshot().alert_retention;
        let alert = {
            let mut state = self.lock();
            state.next_alert_id += 1;
            let alert = QualityAlert {
                id: state.next_alert_id,
                alert_type,
                severity,
                metric: metric.map(str::to_string),
                value,
                message,
                timestamp: Utc::now(),
                acknowledged: false,
                resolved: false,
            };
            state.alerts.push(alert.clone());
            while state.alerts.len() > retention {
                // Handled alerts go first, then the oldest non-critical one.
                // Critical alerts are only dropped when nothing else is left.
                let index = state
                    .alerts
                    .iter()
                    .position(|a| a.acknowledged || a.resolved)
                    .or_else(|| {
                        state
                            .alerts
                            .iter()
                            .position(|a| a.severity != AlertSeverity::Critical)
                    })
                    .unwrap_or(0);
                state.alerts.remove(index);
            }
            alert
        };
        for sink in &self.sinks {
            sink.deliver(&alert);
        }
        alert
    }

    pub fn acknowledge(&self, id: u64) -> bool {
        let mut state = self.lock();
        match state.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                info!("Alert #{} acknowledged", id);
                true
            }
            None => false,
        }
    }

    pub fn resolve(&self, id: u64) -> bool {
        let mut state = self.lock();
        match state.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                alert.resolved = true;
                info!("Alert #{} resolved", id);
                true
            }
            None => false,
        }
    }

    pub fn alerts(&self) -> Vec<QualityAlert> {
        self.lock().alerts.clone()
    }

    pub fn unacknowledged(&self) -> Vec<QualityAlert> {
        self.lock()
            .alerts
            .iter()
            .filter(|a| !a.acknowledged)
            .cloned()
            .collect()
    }
}

/// Compare the mean of the last `window` entries with the `window` before.
fn trend_of(history: &VecDeque<HistoryEntry>, window: usize, margin: f64) -> (Trend, Option<(f64, f64)>) {
    if window == 0 || history.len() < window * 2 {
        return (Trend::InsufficientData, None);
    }
    let scores: Vec<f64> = history.iter().rev().take(window * 2).map(|e| e.overall).collect();
    let (recent, previous) = scores.split_at(window);
    let (Some(recent), Some(previous)) = (
        mean(recent.iter().copied()),
        mean(previous.iter().copied()),
    ) else {
        return (Trend::InsufficientData, None);
    };
    let trend = if recent < previous - margin {
        Trend::Declining
    } else if recent > previous + margin {
        Trend::Improving
    } else {
        Trend::Stable
    };
    (trend, Some((previous, recent)))
}
