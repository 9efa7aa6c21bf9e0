//! MutualCloud gateway server.

use mc_api::config::Config;
use mc_api::server::{self, AppState};
use mc_runner::HttpJobRunner;
use mc_session::InMemorySessionStore;
use mc_store::{seed, InMemoryProviderStore, InMemoryUserStore, SqliteStore};
use mc_types::{ProviderStore, UserStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (users, providers) = match &config.database {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(path = %path.display(), "using SQLite store");
            (
                Arc::clone(&store) as Arc<dyn UserStore + Send + Sync>,
                store as Arc<dyn ProviderStore + Send + Sync>,
            )
        }
        None => {
            tracing::warn!("MC_DATABASE not set; accounts and providers are kept in memory");
            (
                Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore + Send + Sync>,
                Arc::new(InMemoryProviderStore::new()) as Arc<dyn ProviderStore + Send + Sync>,
            )
        }
    };
    if config.seed {
        seed::seed_if_empty(providers.as_ref()).await?;
    }

    let runner = Arc::new(HttpJobRunner::new(config.runner.clone()));
    tracing::info!(url = %config.runner.base_url, "job runner configured");

    let state = Arc::new(AppState::new(
        users,
        providers,
        Arc::new(InMemorySessionStore::new()),
        runner,
        config.jobs.clone(),
        config.provider_key.clone(),
    ));
    let app = server::router(state);
    tracing::info!("MutualCloud API listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
