use models::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod export;
mod models;
mod scraper;
mod server;
mod session;

use config::{load_config, Config};
use session::SessionRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    // Setup logging
    std::env::set_var("RUST_LOG", "listing_scraper=info,rocket=warn,hyper=warn");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(
            format!("listing_scraper={}", config.logging.level)
                .parse()
                .unwrap(),
        ))
        .init();

    let registry = SessionRegistry::new();

    info!(
        "Starting listing scraper (pacing {}..{} ms, {} retries per item)",
        config.scraping.pacing_min_ms,
        config.scraping.pacing_max_ms,
        config.scraping.max_item_retries
    );

    server::build_rocket(config, registry).launch().await?;

    Ok(())
}
