//! Backend entry-point: loads settings, selects the store and serves the
//! ballot API.

mod server;

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use qvote_backend::inbound::http::health::HealthState;
use qvote_backend::outbound::memory::{InMemoryVoteStore, SeedDocument};
use qvote_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{ServerConfig, ServerSettings, StoreBackend, create_server};

/// Open the configured store: Postgres when a URL is set, otherwise the
/// in-memory store, optionally seeded.
async fn open_store(settings: &ServerSettings) -> std::io::Result<StoreBackend> {
    if let Some(url) = settings.database_url() {
        run_migrations(url).await.map_err(std::io::Error::other)?;
        let pool = DbPool::new(
            PoolConfig::new(url).with_max_size(settings.db_max_connections()),
        )
        .await
        .map_err(std::io::Error::other)?;
        info!(
            max_connections = settings.db_max_connections(),
            "using PostgreSQL store"
        );
        return Ok(StoreBackend::Postgres(pool));
    }

    let store = match &settings.seed_file {
        Some(path) => {
            let seed = SeedDocument::load(path).map_err(std::io::Error::other)?;
            info!(
                path = %path.display(),
                voting_codes = seed.voting_codes.len(),
                "seeding in-memory store"
            );
            InMemoryVoteStore::from_seed(seed)
        }
        None => InMemoryVoteStore::new(),
    };
    warn!("no database configured; ballots are kept in memory only");
    Ok(StoreBackend::Memory(Arc::new(store)))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    let bind_addr = settings.bind_addr()?;
    let store = open_store(&settings).await?;

    let config = ServerConfig::new(bind_addr, store);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(server::make_metrics()?));

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting server");
    create_server(health_state, config)?.await
}
