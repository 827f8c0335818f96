use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

mod app;
mod app_state;
mod auth;
mod config;
mod db;
mod error;
mod middleware;
mod modules;
mod notifications;
mod payments;
mod services;
mod telemetry;

use app_state::AppState;
use db::{PgStore, Store};
use notifications::{HttpNotificationSender, NotificationSender};
use payments::CheckoutClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let env = config::init().context("Failed to load configuration")?.clone();

    let _telemetry = telemetry::init_telemetry(None)
        .await
        .context("Failed to initialize telemetry")?;

    let pool = db::init_pool()
        .await
        .context("Failed to initialize database pool")?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
    let checkout = Arc::new(
        CheckoutClient::new(env.payments.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build checkout client: {e}"))?,
    );

    let sender: Arc<dyn NotificationSender> = Arc::new(
        HttpNotificationSender::new(env.notifications.clone())
            .context("Failed to build notification sender")?,
    );
    let _outbox_worker = notifications::spawn_outbox_worker(store.clone(), sender);

    let state = AppState::new(pool, store, checkout, env.clone());
    let app = app::create_router(state);

    let addr = env.server_addr();
    info!("{} listening on {}", env.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to serve application")?;

    Ok(())
}
