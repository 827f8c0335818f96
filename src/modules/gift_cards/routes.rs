use axum::{routing::post, Router};

use crate::app_state::AppState;

use super::handlers::{create_gift_card_checkout, validate_gift_card};

pub fn gift_card_routes() -> Router<AppState> {
    Router::new()
        .route("/gift-cards/validate", post(validate_gift_card))
        .route("/gift-cards/checkout", post(create_gift_card_checkout))
}
