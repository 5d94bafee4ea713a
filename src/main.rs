//! GLEANER: review-scored, point-budgeted giveaway entry agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the site and review clients, and runs the acquisition loop
//! until Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use gleaner::config;
use gleaner::engine::acquisition::AcquisitionLoop;
use gleaner::platforms::steam_store::SteamStoreClient;
use gleaner::platforms::steamgifts::SteamGiftsClient;

const BANNER: &str = r#"
  ____ _     _____    _    _   _ _____ ____
 / ___| |   | ____|  / \  | \ | | ____|  _ \
| |  _| |   |  _|   / _ \ |  \| |  _| | |_) |
| |_| | |___| |___ / ___ \| |\  | |___|  _ <
 \____|_____|_____/_/   \_\_| \_|_____|_| \_\

  Review-scored giveaway entry agent
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("GLEANER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        cycle_interval_secs = cfg.agent.cycle_interval_secs,
        sources = cfg.site.sources.len(),
        threshold = cfg.scoring.threshold,
        confidence = cfg.scoring.confidence,
        "GLEANER starting up"
    );

    // -- Initialise components -------------------------------------------

    let credentials = cfg.credentials()?;
    let site = Arc::new(SteamGiftsClient::new(&cfg.site.base_url, credentials)?);
    let store = Arc::new(SteamStoreClient::new(&cfg.reviews.store_base_url)?);

    let mut agent = AcquisitionLoop::new(site, store, &cfg)
        .context("Failed to initialise acquisition loop")?;

    // -- Main loop -------------------------------------------------------

    info!(
        interval_secs = cfg.agent.cycle_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let cycles = agent.run_until(cfg.cycle_interval(), shutdown).await;

    info!(
        cycles,
        ignored = agent.ignored().len(),
        "GLEANER shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gleaner=info"));

    let json_logging = std::env::var("GLEANER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
