//! Translation telemetry.
//!
//! The collector keeps an append-only, capped event history plus one capped,
//! time-stamped buffer per metric name. Every figure in `TranslationMetrics`
//! is derived by filtering those buffers over a time range; there is no
//! separate running total that could drift from them.
//!
//! Writers append under a short lock. Readers copy what they need out of the
//! lock and aggregate on the copy.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use crate::config::AlertSeverity;
use crate::engine::TranslationMethod;
use crate::i18n::Language;

/// Purity rate below which the system is critical.
pub const CRITICAL_PURITY_RATE: f64 = 90.0;
/// Purity rate below which the system needs attention.
pub const WARNING_PURITY_RATE: f64 = 95.0;
/// Emergency-fallback rate above which the system needs attention.
pub const WARNING_FAILURE_RATE: f64 = 5.0;

// Metric buffer names
const PURITY: &str = "purity_score";
const PROCESSING_MS: &str = "processing_time_ms";
const ATTEMPT_OUTCOME: &str = "attempt_outcome";
const CACHE_LOOKUP: &str = "cache_lookup";
const FALLBACK_USED: &str = "fallback_used";
const REQUESTS_STARTED: &str = "requests_started";

/// A typed pipeline event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranslationEvent {
    Started {
        request_id: String,
        source: Language,
        target: Language,
    },
    Completed {
        request_id: String,
        method: TranslationMethod,
        purity_score: f64,
        processing_ms: u64,
        fallback_used: bool,
    },
    /// A method produced no usable candidate
    Failed {
        request_id: String,
        method: TranslationMethod,
        reason: String,
    },
    /// A candidate was produced but rejected by the purity gate
    PurityViolation {
        request_id: String,
        method: TranslationMethod,
        score: f64,
    },
    FallbackTriggered {
        request_id: String,
        reason: String,
    },
    CacheHit {
        request_id: String,
    },
    CacheMiss {
        request_id: String,
    },
    UserFeedback {
        request_id: Option<String>,
        description: String,
        severity: AlertSeverity,
    },
}

/// An event with its arrival time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedEvent {
    pub at: DateTime<Utc>,
    pub event: TranslationEvent,
}

#[derive(Debug, Clone, Copy)]
struct MetricPoint {
    at: DateTime<Utc>,
    value: f64,
    method: Option<TranslationMethod>,
}

/// A closed time interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// The window ending now.
    pub fn last(window: Duration) -> Self {
        let end = Utc::now();
        let span = ChronoDuration::from_std(window).unwrap_or_else(|_| ChronoDuration::days(36_500));
        Self {
            start: end.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end,
        }
    }

    /// Everything still buffered.
    pub fn all() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// How one method performed over a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodEffectiveness {
    pub attempts: usize,
    pub accepted: usize,
    /// 0-100
    pub acceptance_rate: f64,
}

/// Aggregates over a time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationMetrics {
    pub range: TimeRange,
    pub total_requests: usize,
    pub completed_requests: usize,
    /// Share of completed requests whose purity was exactly 100 (0-100)
    pub purity_rate: f64,
    /// Share of completed requests that ended in the emergency placeholder (0-100)
    pub failure_rate: f64,
    pub average_processing_ms: f64,
    pub cache_hit_rate: f64,
    pub fallback_rate: f64,
    pub method_effectiveness: BTreeMap<TranslationMethod, MethodEffectiveness>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub issues: Vec<String>,
    pub metrics: TranslationMetrics,
}

#[derive(Debug, Default)]
struct CollectorState {
    buffers: HashMap<&'static str, VecDeque<MetricPoint>>,
    events: VecDeque<RecordedEvent>,
}

/// Event log and windowed statistics.
#[derive(Debug)]
pub struct TelemetryCollector {
    state: Mutex<CollectorState>,
    buffer_capacity: usize,
    event_capacity: usize,
    health_window: Duration,
    max_average_processing: Duration,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl TelemetryCollector {
    pub fn new(
        buffer_capacity: usize,
        event_capacity: usize,
        health_window: Duration,
        max_average_processing: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(CollectorState::default()),
            buffer_capacity: buffer_capacity.max(1),
            event_capacity: event_capacity.max(1),
            health_window,
            max_average_processing,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record an event now.
    pub fn record(&self, event: TranslationEvent) {
        self.record_at(event, Utc::now());
    }

    /// Record an event with an explicit timestamp.
    pub fn record_at(&self, event: TranslationEvent, at: DateTime<Utc>) {
        let mut points: Vec<(&'static str, f64, Option<TranslationMethod>)> = Vec::new();
        match &event {
            TranslationEvent::Started { .. } => points.push((REQUESTS_STARTED, 1.0, None)),
            TranslationEvent::Completed {
                method,
                purity_score,
                processing_ms,
                fallback_used,
                ..
            } => {
                points.push((PURITY, *purity_score, Some(*method)));
                points.push((PROCESSING_MS, *processing_ms as f64, Some(*method)));
                points.push((ATTEMPT_OUTCOME, 1.0, Some(*method)));
                points.push((FALLBACK_USED, if *fallback_used { 1.0 } else { 0.0 }, None));
            }
            TranslationEvent::Failed { method, .. }
            | TranslationEvent::PurityViolation { method, .. } => {
                points.push((ATTEMPT_OUTCOME, 0.0, Some(*method)))
            }
            TranslationEvent::CacheHit { .. } => points.push((CACHE_LOOKUP, 1.0, None)),
            TranslationEvent::CacheMiss { .. } => points.push((CACHE_LOOKUP, 0.0, None)),
            TranslationEvent::FallbackTriggered { .. } | TranslationEvent::UserFeedback { .. } => {}
        }

        let mut state = self.lock();
        for (name, value, method) in points {
            let buffer = state.buffers.entry(name).or_default();
            if buffer.len() >= self.buffer_capacity {
                buffer.pop_front();
            }
            buffer.push_back(MetricPoint { at, value, method });
        }
        if state.events.len() >= self.event_capacity {
            state.events.pop_front();
        }
        state.events.push_back(RecordedEvent { at, event });
    }

    /// Copy of the event history, oldest first.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.lock().events.iter().cloned().collect()
    }

    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }

    /// Copy the points of every named buffer within `range` under a single
    /// lock, so all copies describe the same moment.
    fn points<const N: usize>(&self, names: [&str; N], range: TimeRange) -> [Vec<MetricPoint>; N] {
        let state = self.lock();
        names.map(|name| {
            state
                .buffers
                .get(name)
                .map(|b| b.iter().filter(|p| range.contains(p.at)).copied().collect())
                .unwrap_or_default()
        })
    }

    /// Aggregate the buffers over `range`.
    pub fn get_metrics(&self, range: TimeRange) -> TranslationMetrics {
        let [purity, processing, outcomes, cache, fallback, started] = self.points(
            [
                PURITY,
                PROCESSING_MS,
                ATTEMPT_OUTCOME,
                CACHE_LOOKUP,
                FALLBACK_USED,
                REQUESTS_STARTED,
            ],
            range,
        );

        let completed = purity.len();
        let pure = purity.iter().filter(|p| p.value >= 100.0).count();
        let emergency = purity
            .iter()
            .filter(|p| p.method == Some(TranslationMethod::EmergencyGeneric))
            .count();

        let average_processing_ms = if processing.is_empty() {
            0.0
        } else {
            processing.iter().map(|p| p.value).sum::<f64>() / processing.len() as f64
        };

        let mut method_effectiveness: BTreeMap<TranslationMethod, MethodEffectiveness> = BTreeMap::new();
        for point in &outcomes {
            let Some(method) = point.method else { continue };
            let entry = method_effectiveness.entry(method).or_insert(MethodEffectiveness {
                attempts: 0,
                accepted: 0,
                acceptance_rate: 0.0,
            });
            entry.attempts += 1;
            if point.value > 0.0 {
                entry.accepted += 1;
            }
        }
        for entry in method_effectiveness.values_mut() {
            entry.acceptance_rate = percent(entry.accepted, entry.attempts);
        }

        TranslationMetrics {
            range,
            total_requests: started.len(),
            completed_requests: completed,
            // No completed work means nothing impure has shipped
            purity_rate: if completed == 0 { 100.0 } else { percent(pure, completed) },
            failure_rate: percent(emergency, completed),
            average_processing_ms,
            cache_hit_rate: percent(cache.iter().filter(|p| p.value > 0.0).count(), cache.len()),
            fallback_rate: percent(fallback.iter().filter(|p| p.value > 0.0).count(), fallback.len()),
            method_effectiveness,
        }
    }

    /// Classify health over the configured window.
    pub fn get_system_health(&self) -> SystemHealth {
        let metrics = self.get_metrics(TimeRange::last(self.health_window));
        let ceiling_ms = self.max_average_processing.as_millis() as f64;
        let mut issues = Vec::new();

        let status = if metrics.purity_rate < CRITICAL_PURITY_RATE {
            issues.push(format!(
                "Purity rate {:.1}% is below {:.0}%",
                metrics.purity_rate, CRITICAL_PURITY_RATE
            ));
            HealthStatus::Critical
        } else {
            if metrics.purity_rate < WARNING_PURITY_RATE {
                issues.push(format!(
                    "Purity rate {:.1}% is below {:.0}%",
                    metrics.purity_rate, WARNING_PURITY_RATE
                ));
            }
            if metrics.failure_rate > WARNING_FAILURE_RATE {
                issues.push(format!(
                    "Emergency fallback rate {:.1}% exceeds {:.0}%",
                    metrics.failure_rate, WARNING_FAILURE_RATE
                ));
            }
            if metrics.average_processing_ms > ceiling_ms {
                issues.push(format!(
                    "Average processing time {:.0}ms exceeds {:.0}ms",
                    metrics.average_processing_ms, ceiling_ms
                ));
            }
            if issues.is_empty() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Warning
            }
        };

        debug!("System health {:?} ({} issues)", status, issues.len());
        SystemHealth {
            status,
            issues,
            metrics,
        }
    }
}
