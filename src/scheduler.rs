use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::monitor::QualityMonitor;

/// Start the background quality monitor, ticking every `interval`.
pub async fn start_quality_monitor(monitor: Arc<QualityMonitor>, interval: Duration) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    info!("Scheduling quality monitor every {:?}", interval);
    let job = Job::new_repeated_async(interval, move |_uuid, _l| {
        let monitor = Arc::clone(&monitor);

        Box::pin(async move {
            let alerts = monitor.tick();
            if !alerts.is_empty() {
                warn!("Quality monitor raised {} alerts", alerts.len());
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Quality monitor started");

    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, SharedConfig};
    use crate::engine::TranslationMethod;
    use crate::metrics::{TelemetryCollector, TranslationEvent};
    use crate::terminology::TerminologyManager;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_monitor_job_ticks_in_background() {
        let telemetry = Arc::new(TelemetryCollector::new(
            100,
            100,
            Duration::from_secs(300),
            Duration::from_secs(5),
        ));
        let monitor = Arc::new(QualityMonitor::new(
            SharedConfig::new(PipelineConfig::default()).unwrap(),
            Arc::clone(&telemetry),
            Arc::new(TerminologyManager::with_builtin()),
        ));
        telemetry.record(TranslationEvent::Completed {
            request_id: "req-1".to_string(),
            method: TranslationMethod::EmergencyGeneric,
            purity_score: 80.0,
            processing_ms: 5,
            fallback_used: true,
        });

        let mut scheduler = start_quality_monitor(Arc::clone(&monitor), Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        scheduler.shutdown().await.unwrap();

        assert!(monitor
            .alerts()
            .iter()
            .any(|a| a.metric.as_deref() == Some("purity_rate")));
    }
}
