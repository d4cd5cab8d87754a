//! Storefront - catalog, accounts, cart and checkout over HTTP

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::publisher::{EventPublisher, LogPublisher, NatsPublisher};
use storefront::store::{MemoryStore, PgStore, Store};
use storefront::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url, config.database_max_connections).await?),
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; nothing will survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let publisher: Arc<dyn EventPublisher> = match &config.nats_url {
        Some(url) => match NatsPublisher::connect(url).await {
            Ok(nats) => Arc::new(nats),
            Err(e) => {
                warn!(error = %e, "NATS unavailable, events will only be logged");
                Arc::new(LogPublisher)
            }
        },
        None => Arc::new(LogPublisher),
    };

    let port = config.port;
    let app = router(AppState::new(store, publisher, config));

    info!("🚀 Storefront listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
