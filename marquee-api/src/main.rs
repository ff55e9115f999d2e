use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use marquee_api::{app, AppState};
use marquee_core::{ExpiryPolicy, ReservationManager};
use marquee_store::{DbClient, PgSeatStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = marquee_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let store = Arc::new(PgSeatStore::new(db.pool.clone()));
    let policy = ExpiryPolicy::from_minutes(config.business_rules.hold_duration_minutes);
    let manager = Arc::new(ReservationManager::new(store, policy));

    let app = app(AppState::new(manager));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
