use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::cleaner::{default_cleaning_rules, CleaningRule};

/// The only purity score that passes the gate.
pub const REQUIRED_PURITY: f64 = 100.0;

/// Largest concurrency limit the request semaphore can represent.
pub const MAX_CONCURRENT_REQUESTS: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
    Semaphore::MAX_PERMITS
} else {
    u32::MAX as usize
};

/// Metrics measured in milliseconds rather than percent.
const DURATION_METRICS: &[&str] = &["processing_time_ms"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("invalid cleaning pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Alert severity, also used for quality issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A bound on an aggregate metric; crossing it raises an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThreshold {
    pub metric: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub severity: AlertSeverity,
    pub enabled: bool,
}

impl QualityThreshold {
    pub fn min(metric: &str, value: f64, severity: AlertSeverity) -> Self {
        Self {
            metric: metric.to_string(),
            min: Some(value),
            max: None,
            severity,
            enabled: true,
        }
    }

    pub fn max(metric: &str, value: f64, severity: AlertSeverity) -> Self {
        Self {
            metric: metric.to_string(),
            min: None,
            max: Some(value),
            severity,
            enabled: true,
        }
    }

    /// True when `value` falls outside the configured bounds.
    pub fn is_breached_by(&self, value: f64) -> bool {
        self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max)
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.metric.trim().is_empty() {
            problems.push("threshold metric name is empty".to_string());
        }
        let name = &self.metric;
        if self.min.is_none() && self.max.is_none() {
            problems.push(format!("threshold '{}' has neither min nor max", name));
        }
        let percent = !DURATION_METRICS.contains(&name.as_str());
        for (label, bound) in [("min", self.min), ("max", self.max)] {
            let Some(value) = bound else { continue };
            if !value.is_finite() {
                problems.push(format!("threshold '{}' {} is not a number", name, label));
            } else if percent && !(0.0..=100.0).contains(&value) {
                problems.push(format!(
                    "threshold '{}' {} {} is outside 0..=100",
                    name, label, value
                ));
            } else if value < 0.0 {
                problems.push(format!("threshold '{}' {} {} is negative", name, label, value));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                problems.push(format!("threshold '{}' min {} exceeds max {}", name, min, max));
            }
        }
        problems
    }
}

/// Default aggregate thresholds checked by the monitor tick.
pub fn default_quality_thresholds() -> Vec<QualityThreshold> {
    vec![
        QualityThreshold::min("purity_rate", 100.0, AlertSeverity::Critical),
        QualityThreshold::min("terminology_accuracy", 90.0, AlertSeverity::High),
        QualityThreshold::max("error_rate", 5.0, AlertSeverity::High),
        QualityThreshold::max("processing_time_ms", 5000.0, AlertSeverity::Medium),
        QualityThreshold::min("contextual_relevance", 70.0, AlertSeverity::Medium),
    ]
}

/// Settings for an OpenAI-compatible chat-completion backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    /// Model used for the secondary method, if any
    pub secondary_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Gate
    pub zero_tolerance_enabled: bool,
    pub max_retry_attempts: u32,

    // Gateway
    pub concurrent_request_limit: usize,
    pub processing_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub max_input_chars: usize,

    // Cleaning
    pub cleaning_rules: Vec<CleaningRule>,

    // Monitoring
    pub quality_thresholds: Vec<QualityThreshold>,
    pub history_capacity: usize,
    pub trend_window: usize,
    pub trend_margin: f64,
    pub anomaly_margin: f64,
    pub monitor_interval: Duration,
    pub monitoring_window: Duration,
    pub alert_retention: usize,

    // Telemetry
    pub metrics_buffer_capacity: usize,
    pub event_history_capacity: usize,
    pub max_average_processing_time: Duration,

    // Backend
    pub backend: Option<BackendSettings>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zero_tolerance_enabled: true,
            max_retry_attempts: 5,
            concurrent_request_limit: 10,
            processing_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(3600),
            cache_capacity: 1000,
            max_input_chars: 20_000,
            cleaning_rules: default_cleaning_rules(),
            quality_thresholds: default_quality_thresholds(),
            history_capacity: 1000,
            trend_window: 10,
            trend_margin: 5.0,
            anomaly_margin: 25.0,
            monitor_interval: Duration::from_secs(5),
            monitoring_window: Duration::from_secs(300),
            alert_retention: 1000,
            metrics_buffer_capacity: 10_000,
            event_history_capacity: 10_000,
            max_average_processing_time: Duration::from_secs(5),
            backend: None,
        }
    }
}

/// Compile a runtime-supplied regular expression into a cleaning rule.
pub fn pattern_rule(pattern: &str) -> Result<CleaningRule, ConfigError> {
    CleaningRule::pattern(pattern).map_err(|source| ConfigError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let mut cleaning_rules = defaults.cleaning_rules.clone();
        if let Ok(literals) = std::env::var("CLEANING_LITERALS") {
            cleaning_rules.extend(
                literals
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(CleaningRule::literal),
            );
        }

        // Regexes may contain commas, so entries are separated by ";;"
        if let Ok(patterns) = std::env::var("CLEANING_PATTERNS") {
            for pattern in patterns.split(";;").map(str::trim).filter(|s| !s.is_empty()) {
                cleaning_rules.push(pattern_rule(pattern).context("CLEANING_PATTERNS")?);
            }
        }

        let backend = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| BackendSettings {
                api_key,
                api_url: std::env::var("OPENAI_API_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
                model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                secondary_model: std::env::var("SECONDARY_OPENAI_MODEL")
                    .ok()
                    .filter(|m| !m.trim().is_empty()),
            });

        let config = Self {
            zero_tolerance_enabled: env_parse("ZERO_TOLERANCE_ENABLED", defaults.zero_tolerance_enabled),
            max_retry_attempts: env_parse("MAX_RETRY_ATTEMPTS", defaults.max_retry_attempts),
            concurrent_request_limit: env_parse(
                "CONCURRENT_REQUEST_LIMIT",
                defaults.concurrent_request_limit,
            ),
            processing_timeout: env_secs("PROCESSING_TIMEOUT_SECS", defaults.processing_timeout),
            cache_ttl: env_secs("CACHE_TTL_SECS", defaults.cache_ttl),
            cache_capacity: env_parse("CACHE_CAPACITY", defaults.cache_capacity),
            max_input_chars: env_parse("MAX_INPUT_CHARS", defaults.max_input_chars),
            cleaning_rules,
            monitor_interval: env_secs("MONITOR_INTERVAL_SECS", defaults.monitor_interval),
            monitoring_window: env_secs("MONITORING_WINDOW_SECS", defaults.monitoring_window),
            backend,
            ..defaults
        };

        config
            .validate()
            .context("Configuration from environment is invalid")?;
        if !config.zero_tolerance_enabled {
            warn!("ZERO_TOLERANCE_ENABLED=false is ignored; the purity floor stays at 100");
        }
        Ok(config)
    }

    /// Minimum purity for acceptance. Always 100, whatever the flag says.
    pub fn effective_min_purity(&self) -> f64 {
        REQUIRED_PURITY
    }

    /// Check every setting, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !(1..=10).contains(&self.max_retry_attempts) {
            problems.push(format!(
                "max_retry_attempts must be within 1..=10, got {}",
                self.max_retry_attempts
            ));
        }
        if self.concurrent_request_limit == 0 {
            problems.push("concurrent_request_limit must be at least 1".to_string());
        } else if self.concurrent_request_limit > MAX_CONCURRENT_REQUESTS {
            problems.push(format!(
                "concurrent_request_limit must be at most {}, got {}",
                MAX_CONCURRENT_REQUESTS, self.concurrent_request_limit
            ));
        }
        if self.processing_timeout.is_zero() {
            problems.push("processing_timeout must be greater than zero".to_string());
        }
        if self.max_input_chars == 0 {
            problems.push("max_input_chars must be at least 1".to_string());
        }
        for (name, value) in [
            ("history_capacity", self.history_capacity),
            ("trend_window", self.trend_window),
            ("alert_retention", self.alert_retention),
            ("metrics_buffer_capacity", self.metrics_buffer_capacity),
            ("event_history_capacity", self.event_history_capacity),
        ] {
            if value == 0 {
                problems.push(format!("{} must be at least 1", name));
            }
        }
        if self.monitor_interval.is_zero() {
            problems.push("monitor_interval must be greater than zero".to_string());
        }
        for (name, value) in [
            ("trend_margin", self.trend_margin),
            ("anomaly_margin", self.anomaly_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                problems.push(format!("{} must be a non-negative number", name));
            }
        }
        for threshold in &self.quality_thresholds {
            problems.extend(threshold.problems());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

/// A partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub zero_tolerance_enabled: Option<bool>,
    pub max_retry_attempts: Option<u32>,
    pub concurrent_request_limit: Option<usize>,
    pub processing_timeout: Option<Duration>,
    pub quality_thresholds: Option<Vec<QualityThreshold>>,
    pub cleaning_rules: Option<Vec<CleaningRule>>,
    pub max_input_chars: Option<usize>,
}

impl ConfigUpdate {
    fn apply_to(&self, base: &PipelineConfig) -> PipelineConfig {
        let mut next = base.clone();
        if let Some(v) = self.zero_tolerance_enabled {
            next.zero_tolerance_enabled = v;
        }
        if let Some(v) = self.max_retry_attempts {
            next.max_retry_attempts = v;
        }
        if let Some(v) = self.concurrent_request_limit {
            next.concurrent_request_limit = v;
        }
        if let Some(v) = self.processing_timeout {
            next.processing_timeout = v;
        }
        if let Some(v) = &self.quality_thresholds {
            next.quality_thresholds = v.clone();
        }
        if let Some(v) = &self.cleaning_rules {
            next.cleaning_rules = v.clone();
        }
        if let Some(v) = self.max_input_chars {
            next.max_input_chars = v;
        }
        next
    }
}

/// Shared, hot-reloadable configuration. Readers get immutable snapshots.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<Arc<PipelineConfig>>>,
}

impl SharedConfig {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    pub fn snapshot(&self) -> Arc<PipelineConfig> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Validate and swap in an update. Nothing changes on error.
    pub fn apply(&self, update: &ConfigUpdate) -> Result<Arc<PipelineConfig>, ConfigError> {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let candidate = update.apply_to(&guard);
        if let Err(e) = candidate.validate() {
            warn!("Rejected configuration update: {}", e);
            return Err(e);
        }
        if !candidate.zero_tolerance_enabled && guard.zero_tolerance_enabled {
            warn!("Zero tolerance disabled by operator; purity floor remains 100");
        }
        let next = Arc::new(candidate);
        *guard = Arc::clone(&next);
        info!("Configuration updated");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "ZERO_TOLERANCE_ENABLED",
            "MAX_RETRY_ATTEMPTS",
            "CONCURRENT_REQUEST_LIMIT",
            "PROCESSING_TIMEOUT_SECS",
            "CACHE_TTL_SECS",
            "CACHE_CAPACITY",
            "MAX_INPUT_CHARS",
            "MONITOR_INTERVAL_SECS",
            "MONITORING_WINDOW_SECS",
            "CLEANING_LITERALS",
            "CLEANING_PATTERNS",
            "OPENAI_API_KEY",
            "OPENAI_API_URL",
            "OPENAI_MODEL",
            "SECONDARY_OPENAI_MODEL",
        ] {
            std::env::remove_var(name);
        }
    }

    // ==================== Default Tests ====================

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.zero_tolerance_enabled);
        assert_eq!(config.max_retry_attempts, 5);
        assert_eq!(config.concurrent_request_limit, 10);
        assert_eq!(config.processing_timeout, Duration::from_secs(30));
        assert_eq!(config.quality_thresholds.len(), 5);
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds = default_quality_thresholds();
        let purity = thresholds.iter().find(|t| t.metric == "purity_rate").unwrap();
        assert_eq!(purity.min, Some(100.0));
        assert_eq!(purity.severity, AlertSeverity::Critical);
        let latency = thresholds
            .iter()
            .find(|t| t.metric == "processing_time_ms")
            .unwrap();
        assert_eq!(latency.max, Some(5000.0));
        assert_eq!(latency.severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_threshold_breach() {
        let min = QualityThreshold::min("purity_rate", 100.0, AlertSeverity::Critical);
        assert!(min.is_breached_by(99.99));
        assert!(!min.is_breached_by(100.0));
        let max = QualityThreshold::max("error_rate", 5.0, AlertSeverity::High);
        assert!(max.is_breached_by(5.1));
        assert!(!max.is_breached_by(5.0));
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_rejects_unrepresentable_concurrency_limit() {
        let config = PipelineConfig {
            concurrent_request_limit: MAX_CONCURRENT_REQUESTS + 1,
            ..PipelineConfig::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid(problems)) => {
                assert_eq!(problems.len(), 1);
                assert!(problems[0].contains("at most"));
            }
            other => panic!("expected invalid config, got {:?}", other),
        }

        let config = PipelineConfig {
            concurrent_request_limit: MAX_CONCURRENT_REQUESTS,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let config = PipelineConfig {
            max_retry_attempts: 0,
            concurrent_request_limit: 0,
            quality_thresholds: vec![
                QualityThreshold {
                    metric: "purity_rate".to_string(),
                    min: Some(120.0),
                    max: None,
                    severity: AlertSeverity::Critical,
                    enabled: true,
                },
                QualityThreshold {
                    metric: "".to_string(),
                    min: None,
                    max: None,
                    severity: AlertSeverity::Low,
                    enabled: true,
                },
            ],
            ..PipelineConfig::default()
        };

        match config.validate() {
            Err(ConfigError::Invalid(problems)) => {
                assert_eq!(problems.len(), 5, "{:?}", problems);
                assert!(problems.iter().any(|p| p.contains("max_retry_attempts")));
                assert!(problems.iter().any(|p| p.contains("outside 0..=100")));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_min_above_max() {
        let config = PipelineConfig {
            quality_thresholds: vec![QualityThreshold {
                metric: "readability".to_string(),
                min: Some(80.0),
                max: Some(60.0),
                severity: AlertSeverity::Low,
                enabled: true,
            }],
            ..PipelineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds max"));
    }

    #[test]
    fn test_validate_duration_metric_allows_large_bounds() {
        let config = PipelineConfig {
            quality_thresholds: vec![QualityThreshold::max(
                "processing_time_ms",
                30_000.0,
                AlertSeverity::Medium,
            )],
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_min_purity_ignores_flag() {
        let config = PipelineConfig {
            zero_tolerance_enabled: false,
            ..PipelineConfig::default()
        };
        assert_eq!(config.effective_min_purity(), 100.0);
    }

    // ==================== SharedConfig Tests ====================

    #[test]
    fn test_shared_config_apply_valid_update() {
        let shared = SharedConfig::new(PipelineConfig::default()).unwrap();
        let update = ConfigUpdate {
            max_retry_attempts: Some(3),
            ..ConfigUpdate::default()
        };
        shared.apply(&update).expect("valid update");
        assert_eq!(shared.snapshot().max_retry_attempts, 3);
    }

    #[test]
    fn test_shared_config_rejects_invalid_update() {
        let shared = SharedConfig::new(PipelineConfig::default()).unwrap();
        let before = shared.snapshot();
        let update = ConfigUpdate {
            max_retry_attempts: Some(3),
            quality_thresholds: Some(vec![QualityThreshold::min(
                "purity_rate",
                -1.0,
                AlertSeverity::Critical,
            )]),
            ..ConfigUpdate::default()
        };
        assert!(matches!(shared.apply(&update), Err(ConfigError::Invalid(_))));
        // Nothing from a rejected update is applied
        assert_eq!(shared.snapshot().max_retry_attempts, before.max_retry_attempts);
        assert_eq!(shared.snapshot().quality_thresholds, before.quality_thresholds);
    }

    #[test]
    fn test_shared_config_snapshot_is_stable() {
        let shared = SharedConfig::new(PipelineConfig::default()).unwrap();
        let snapshot = shared.snapshot();
        shared
            .apply(&ConfigUpdate {
                concurrent_request_limit: Some(2),
                ..ConfigUpdate::default()
            })
            .unwrap();
        assert_eq!(snapshot.concurrent_request_limit, 10);
        assert_eq!(shared.snapshot().concurrent_request_limit, 2);
    }

    #[test]
    fn test_shared_config_disable_zero_tolerance_keeps_floor() {
        let shared = SharedConfig::new(PipelineConfig::default()).unwrap();
        let applied = shared
            .apply(&ConfigUpdate {
                zero_tolerance_enabled: Some(false),
                ..ConfigUpdate::default()
            })
            .unwrap();
        assert!(!applied.zero_tolerance_enabled);
        assert_eq!(applied.effective_min_purity(), 100.0);
    }

    // ==================== from_env Tests ====================

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = PipelineConfig::from_env().expect("defaults are valid");
        assert_eq!(config.max_retry_attempts, 5);
        assert!(config.backend.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("MAX_RETRY_ATTEMPTS", "3");
        std::env::set_var("PROCESSING_TIMEOUT_SECS", "12");
        std::env::set_var("CLEANING_LITERALS", "DRAFT, Sponsored ,");
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("SECONDARY_OPENAI_MODEL", "gpt-4o");

        let config = PipelineConfig::from_env().expect("valid env");
        clear_env();

        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.processing_timeout, Duration::from_secs(12));
        assert!(config.cleaning_rules.contains(&CleaningRule::literal("DRAFT")));
        assert!(config.cleaning_rules.contains(&CleaningRule::literal("Sponsored")));
        let backend = config.backend.expect("backend configured");
        assert_eq!(backend.model, "gpt-4o-mini");
        assert_eq!(backend.secondary_model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_out_of_range() {
        clear_env();
        std::env::set_var("MAX_RETRY_ATTEMPTS", "50");
        let result = PipelineConfig::from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_cleaning_patterns() {
        clear_env();
        std::env::set_var("CLEANING_PATTERNS", r"Ref\.\s*\d+;; \[ad\]");
        let config = PipelineConfig::from_env().expect("valid patterns");
        clear_env();
        let defaults = PipelineConfig::default().cleaning_rules.len();
        assert_eq!(config.cleaning_rules.len(), defaults + 2);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_pattern() {
        clear_env();
        std::env::set_var("CLEANING_PATTERNS", "([unclosed");
        let result = PipelineConfig::from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_pattern_rule_error_names_pattern() {
        let err = pattern_rule("(").unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
        assert!(err.to_string().contains("'('"));
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_unparseable_values() {
        clear_env();
        std::env::set_var("CONCURRENT_REQUEST_LIMIT", "lots");
        let config = PipelineConfig::from_env().expect("falls back to default");
        clear_env();
        assert_eq!(config.concurrent_request_limit, 10);
    }
}
