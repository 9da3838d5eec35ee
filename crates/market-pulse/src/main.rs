use anyhow::Result;
use market_core::QuoteSource;
use quote_source::{HttpQuoteSource, SimulatedQuoteSource, TimedSource};
use refresh_scheduler::MarketDataService;
use tokio::signal::unix::SignalKind;

mod config;
mod output;

use config::{RunnerConfig, SourceKind};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting Market Pulse");

    // 2. Configuration
    let config = RunnerConfig::from_env()?;
    tracing::info!("  Refresh interval: {}ms", config.refresh_interval_ms);
    tracing::info!("  Fetch timeout: {}ms", config.quote_timeout_ms);
    tracing::info!("  Output: {:?}", config.output);

    // 3. Quote source
    let inner: Box<dyn QuoteSource> = match &config.source {
        SourceKind::Simulated => {
            tracing::info!("  Source: simulated");
            Box::new(SimulatedQuoteSource::new())
        }
        SourceKind::Http { base_url } => {
            tracing::info!("  Source: {}", base_url);
            Box::new(HttpQuoteSource::new(base_url.clone()))
        }
    };
    let source = TimedSource::with_timeout(inner, config.quote_timeout());

    // 4. Start polling
    let service = MarketDataService::new(source);
    let mut updates = service.subscribe();
    let handle = service.start(config.refresh_interval());

    // 5. Report every published state until SIGINT / SIGTERM
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    let shutdown = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    tracing::warn!("State channel closed");
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if let Err(e) = output::report(&state, config.output) {
                    tracing::error!("Failed to report market state: {}", e);
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping refresh...");
                break;
            }
        }
    }

    handle.stop();
    let stats = service.state().stats;
    tracing::info!(
        "Market Pulse shut down after {} cycles ({} failed).",
        stats.completed(),
        stats.failed
    );
    Ok(())
}
