use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{BookingRequest, NewBookingRequest};
use crate::error::{AppError, AppResult};
use crate::payments::booking_confirmation_notifications;

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking: BookingRequest,
    /// Absent when the booking needed no payment.
    pub checkout_url: Option<String>,
}

/// Create a pending booking request and, unless a gift card covers the full
/// price, a checkout session to pay the remainder. The gift-card discount
/// here is a preview; the balance moves when the payment completes.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<NewBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    payload.validate()?;

    if state.store.coach_by_id(payload.coach_id).await?.is_none() {
        return Err(AppError::NotFound(format!("coach {}", payload.coach_id)));
    }
    let service = state
        .store
        .service_by_slug(&payload.service_slug)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::NotFound(format!("service {}", payload.service_slug)))?;

    let discount_cents = match &payload.gift_card_code {
        Some(code) => {
            let quote = state.gift_cards.validate(code, service.price_cents).await?;
            if !quote.valid {
                return Err(AppError::Validation(format!(
                    "gift card rejected: {}",
                    quote.message
                )));
            }
            quote.applicable_cents
        }
        None => 0,
    };

    let booking = state
        .store
        .create_booking(&payload, service.price_cents, discount_cents)
        .await?;
    let payable_cents = service.price_cents - discount_cents;

    if payable_cents == 0 {
        // Fully covered: no processor round-trip happens, so the redemption
        // and the paid transition that the webhook would normally perform
        // happen here instead.
        if let Some(code) = &payload.gift_card_code {
            state.gift_cards.redeem(code, discount_cents).await?;
        }
        let notifications = booking_confirmation_notifications(&booking);
        state
            .store
            .mark_booking_paid(booking.id, &notifications)
            .await?;

        let booking = state
            .store
            .booking_by_id(booking.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("booking {} disappeared", booking.id)))?;
        return Ok((
            StatusCode::CREATED,
            Json(BookingResponse {
                booking,
                checkout_url: None,
            }),
        ));
    }

    let session = state
        .checkout
        .create_booking_session(&booking, &service, payable_cents)
        .await?;
    state
        .store
        .attach_booking_session(booking.id, &session.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking,
            checkout_url: Some(session.url),
        }),
    ))
}
