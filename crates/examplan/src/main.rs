use anyhow::Context;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use examplan::account::{AccountService, MemoryAccountService};
use examplan::catalog::Catalog;
use examplan::config::AppConfig;
use examplan::logging;
use examplan::schedule::store::{FileLocalStore, LocalStore};
use examplan::server::create_router;
use examplan::types::AppState;

const CONFIG_ENV: &str = "EXAMPLAN_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var(CONFIG_ENV).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load_from_path(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let current = read_catalog(&config.current_catalog_path)?;
    let historical = read_catalog(&config.historical_catalog_path)?;
    let catalog = Catalog::load(&current, &historical);

    let local: Arc<dyn LocalStore> = Arc::new(FileLocalStore::new(&config.storage_dir));
    // Authentication is handled elsewhere; the standalone server runs as a guest.
    let account: Arc<dyn AccountService> = Arc::new(MemoryAccountService::guest());

    let state = Arc::new(AppState::new(
        catalog,
        config.term_partition(),
        local,
        account,
        &config.storage_key,
    ));
    state.reconciler.lock().await.sync_auth();

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn read_catalog(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading catalog {}", path.display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
