use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use legal_translation_purity::config::PipelineConfig;
use legal_translation_purity::metrics::HealthStatus;
use legal_translation_purity::scheduler;
use legal_translation_purity::{Language, TranslationGateway, TranslationRequest};

fn parse_language(arg: &str) -> Result<Language> {
    Language::from_code(arg).with_context(|| format!("Unsupported language '{}' (expected fr or ar)", arg))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("legal_translation_purity=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        bail!("Usage: legal-translate <source: fr|ar> <target: fr|ar> <text...>");
    }
    let source = parse_language(&args[0])?;
    let target = parse_language(&args[1])?;
    let text = args[2..].join(" ");

    let config = PipelineConfig::from_env()?;
    let interval = config.monitor_interval;
    if config.backend.is_none() {
        warn!("OPENAI_API_KEY not set; only dictionary-based methods are available");
    }
    let gateway = TranslationGateway::new(config).context("Failed to build translation gateway")?;

    let mut monitor = scheduler::start_quality_monitor(gateway.monitor(), interval).await?;

    let result = gateway
        .translate(TranslationRequest::new(text, source, target))
        .await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    // One final pass so alerts from this run are logged
    gateway.monitor().tick();
    let health = gateway.get_system_health();
    match health.status {
        HealthStatus::Healthy => info!("System health: healthy"),
        _ => warn!("System health: {:?} ({})", health.status, health.issues.join("; ")),
    }

    monitor.shutdown().await?;
    Ok(())
}
