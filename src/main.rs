use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crypto_analytics::app;
use crypto_analytics::config::AppConfig;
use crypto_analytics::logging::{init_logging, LoggingConfig};
use crypto_analytics::services::csv_import_service;
use crypto_analytics::services::rate_limiter::RateLimiter;
use crypto_analytics::state::AppState;
use crypto_analytics::store::{InMemoryPricePointStore, PgPricePointStore, PricePointStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    let store: Arc<dyn PricePointStore> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .context("Failed to connect to DATABASE_URL")?;
            let store = PgPricePointStore::new(pool);
            store.migrate().await.context("Failed to run migrations")?;
            info!("🗄️  Using Postgres price store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory price store");
            Arc::new(InMemoryPricePointStore::new())
        }
    };

    let loaded = csv_import_service::import_directory(store.as_ref(), &config.price_data_dir).await?;
    info!(
        "📈 Loaded {} price points from {:?} ({} rows skipped)",
        loaded.imported,
        config.price_data_dir,
        loaded.errors.len()
    );

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        config.rate_limit_window(),
    ));
    rate_limiter.clone().spawn_cleanup(config.rate_limit_window());

    let state = AppState { store, rate_limiter };
    let app = app::create_app(state);

    let addr = config.socket_addr().map_err(anyhow::Error::msg)?;
    let listener = TcpListener::bind(&addr).await?;
    info!("🚀 Crypto analytics running at http://{}/", addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
