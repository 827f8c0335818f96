use axum::{routing::post, Router};

use crate::app_state::AppState;

use super::handlers::handle_payment_webhook;

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/payments", post(handle_payment_webhook))
}
