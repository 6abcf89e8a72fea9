//! Storefront API server

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::api::{self, AppState, SERVICE_NAME};
use storefront_api::messaging::EventPublisher;
use storefront_api::services::Services;
use storefront_api::store::{MemoryStore, PgStore, Store};
use storefront_api::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url, config.database_max_connections).await.context("connecting to database")?;
            pg.migrate().await.context("running migrations")?;
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let state = AppState { services: Services::new(store, events, &config) };

    let app = api::router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("{} listening on {}", SERVICE_NAME, addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
