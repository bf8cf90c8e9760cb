//! OpenSASE Storefront - Self-hosted E-commerce Storefront

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_storefront::publisher::EventPublisher;
use opensase_storefront::store::{create_pool, MemoryStore, PgStore, Store};
use opensase_storefront::{app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opensase_storefront=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let events = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => EventPublisher::new(Some(client)),
            Err(e) => {
                warn!(error = %e, "NATS unavailable, events will not be published");
                EventPublisher::disabled()
            }
        },
        None => EventPublisher::disabled(),
    };

    let addr = config.socket_addr();
    let state = AppState::new(config, store, events);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 OpenSASE Storefront listening on {}", addr);
    axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
