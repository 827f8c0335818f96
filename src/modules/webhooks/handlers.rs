use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use secrecy::ExposeSecret;
use serde_json::json;
use time::OffsetDateTime;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::payments::{verify_signature, PaymentEvent, ReconcileOutcome};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Payment-processor event intake. The signature is verified against the
/// raw body before any field of the payload is trusted; only then is the
/// event parsed and handed to the reconciler.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Validation("missing signature header".into()))?;

    let payload = std::str::from_utf8(&body)
        .map_err(|_| AppError::Validation("event body must be UTF-8".into()))?;

    verify_signature(
        signature,
        payload,
        state.env.payments.webhook_secret.expose_secret(),
        OffsetDateTime::now_utc(),
    )
    .map_err(|err| AppError::Validation(err.to_string()))?;

    let event: PaymentEvent = serde_json::from_str(payload)
        .map_err(|err| AppError::Validation(format!("malformed event payload: {err}")))?;

    let outcome = state.reconciler.handle(&event).await?;
    Ok(Json(json!({
        "received": true,
        "outcome": outcome_label(&outcome),
    })))
}

fn outcome_label(outcome: &ReconcileOutcome) -> &'static str {
    match outcome {
        ReconcileOutcome::GiftCardCreated { .. } => "gift_card_created",
        ReconcileOutcome::BookingPaid => "booking_paid",
        ReconcileOutcome::AlreadyProcessed => "already_processed",
        ReconcileOutcome::Ignored => "ignored",
    }
}
