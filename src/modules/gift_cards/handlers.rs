use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{GiftCardQuote, NewGiftCardOrder};
use crate::error::AppResult;

#[derive(Debug, Deserialize, Validate)]
pub struct ValidatePayload {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(range(min = 1))]
    pub amount_cents: i64,
}

/// Read-only balance preview. An unknown or unusable code is a valid
/// 200 response with `valid=false`, not an error.
pub async fn validate_gift_card(
    State(state): State<AppState>,
    Json(payload): Json<ValidatePayload>,
) -> AppResult<Json<GiftCardQuote>> {
    payload.validate()?;
    let quote = state
        .gift_cards
        .validate(&payload.code, payload.amount_cents)
        .await?;
    Ok(Json(quote))
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_session_id: String,
    pub checkout_url: String,
}

/// Start a gift-card purchase: create the processor session, then persist
/// the order row that lets the webhook correlate the completed payment back
/// to the buyer.
pub async fn create_gift_card_checkout(
    State(state): State<AppState>,
    Json(payload): Json<NewGiftCardOrder>,
) -> AppResult<(StatusCode, Json<CheckoutResponse>)> {
    payload.validate()?;

    let session = state.checkout.create_gift_card_session(&payload).await?;
    state
        .store
        .create_gift_card_order(&payload, "eur", &session.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            checkout_session_id: session.id,
            checkout_url: session.url,
        }),
    ))
}
