//! Insert demo providers into the SQLite database named by MC_DATABASE.

use mc_store::{seed, SqliteStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::var("MC_DATABASE").unwrap_or_else(|_| "mutualcloud.db".to_string());
    let store = SqliteStore::open(&path)?;
    let inserted = seed::seed_if_empty(&store).await?;
    if inserted == 0 {
        println!("{}: providers already present, nothing inserted", path);
    } else {
        println!("{}: inserted {} demo providers", path, inserted);
    }
    Ok(())
}
