//! Idempotent consumption of payment-completion events.

use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    BookingRequest, DatabaseError, NewGiftCard, NewOutboxNotification, RedeemOutcome, Store,
};
use crate::error::{AppError, AppResult};

use super::events::{
    CheckoutSession, PaymentEvent, CHECKOUT_COMPLETED, KIND_BOOKING, KIND_GIFT_CARD,
    METADATA_BOOKING_ID,
};

/// Unambiguous uppercase alphabet for human-readable codes (no 0/O, 1/I).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_PREFIX: &str = "MOVI";
/// Collision-retry budget before the event is surfaced as a failure.
const MAX_CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    GiftCardCreated { code: String },
    BookingPaid,
    /// The event's session was already reconciled; re-delivery is a no-op.
    AlreadyProcessed,
    /// Event type (or metadata kind) we never handle; acknowledged so the
    /// processor does not retry forever.
    Ignored,
}

pub struct Reconciler {
    store: Arc<dyn Store>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Process one verified event. Safe to call any number of times with
    /// the same event.
    pub async fn handle(&self, event: &PaymentEvent) -> AppResult<ReconcileOutcome> {
        if event.event_type != CHECKOUT_COMPLETED {
            tracing::debug!(event_id = %event.id, event_type = %event.event_type, "ignoring event");
            return Ok(ReconcileOutcome::Ignored);
        }

        let session = &event.data.object;
        match session.kind() {
            Some(KIND_GIFT_CARD) => self.reconcile_gift_card(event, session).await,
            Some(KIND_BOOKING) => self.reconcile_booking(event, session).await,
            other => {
                tracing::warn!(event_id = %event.id, kind = ?other, "completed session without a known kind");
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    async fn reconcile_gift_card(
        &self,
        event: &PaymentEvent,
        session: &CheckoutSession,
    ) -> AppResult<ReconcileOutcome> {
        if self.store.gift_card_by_session(&session.id).await?.is_some() {
            tracing::info!(event_id = %event.id, session_id = %session.id, "gift card already created");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        // The order row written at checkout initiation carries the buyer
        // metadata; without it the event cannot be correlated yet, so fail
        // and let the processor redeliver.
        let order = self
            .store
            .gift_card_order_by_session(&session.id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("no gift-card order for session {}", session.id))
            })?;

        let amount_cents = session.amount_total.unwrap_or(order.amount_cents);
        let currency = session
            .currency
            .clone()
            .unwrap_or_else(|| order.currency.clone());
        let recipient = order
            .recipient_email
            .clone()
            .unwrap_or_else(|| order.buyer_email.clone());

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            let card = NewGiftCard {
                code: code.clone(),
                amount_cents,
                currency: currency.clone(),
                buyer_email: order.buyer_email.clone(),
                recipient_email: order.recipient_email.clone(),
                checkout_session_id: Some(session.id.clone()),
            };
            let notification = NewOutboxNotification::email(
                recipient.clone(),
                "Votre carte cadeau movi-lab",
                gift_card_email_body(&code, amount_cents, order.message.as_deref()),
            );

            match self.store.create_gift_card(&card, Some(&notification)).await {
                Ok(card) => {
                    tracing::info!(event_id = %event.id, code = %card.code, "gift card created");
                    return Ok(ReconcileOutcome::GiftCardCreated { code: card.code });
                }
                Err(DatabaseError::Duplicate) => {
                    // Either a concurrent delivery of the same event won the
                    // session-id constraint, or the generated code collided.
                    if self.store.gift_card_by_session(&session.id).await?.is_some() {
                        return Ok(ReconcileOutcome::AlreadyProcessed);
                    }
                    tracing::warn!(event_id = %event.id, "gift-card code collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::Internal(format!(
            "could not allocate a unique gift-card code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    async fn reconcile_booking(
        &self,
        event: &PaymentEvent,
        session: &CheckoutSession,
    ) -> AppResult<ReconcileOutcome> {
        let booking_id = session
            .metadata
            .get(METADATA_BOOKING_ID)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "completed booking session {} carries no booking id",
                    session.id
                ))
            })?;

        let booking = self
            .store
            .booking_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

        let notifications = booking_confirmation_notifications(&booking);

        if !self
            .store
            .mark_booking_paid(booking_id, &notifications)
            .await?
        {
            tracing::info!(event_id = %event.id, %booking_id, "booking already paid");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        // The discount was only previewed at booking time; the balance moves
        // now, gated on the pending->paid transition so a re-delivery can
        // never redeem twice. The payment is already captured, so a card
        // that lost its balance in the meantime is logged, not fatal.
        if let (Some(code), discount) = (&booking.gift_card_code, booking.discount_cents) {
            if discount > 0 {
                match self.store.redeem_gift_card(code, discount).await? {
                    RedeemOutcome::Redeemed { remaining_cents } => {
                        tracing::info!(%booking_id, code, remaining_cents, "gift card redeemed");
                    }
                    outcome => {
                        tracing::error!(%booking_id, code, ?outcome, "gift-card redemption failed after payment");
                    }
                }
            }
        }

        tracing::info!(event_id = %event.id, %booking_id, "booking marked paid");
        Ok(ReconcileOutcome::BookingPaid)
    }
}

/// A fresh `MOVI-XXXX-XXXX` code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let mut group = || {
        (0..4)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect::<String>()
    };
    let first = group();
    let second = group();
    format!("{CODE_PREFIX}-{first}-{second}")
}

fn gift_card_email_body(code: &str, amount_cents: i64, message: Option<&str>) -> String {
    let mut body = format!(
        "Votre carte cadeau movi-lab de {:.2} € est prête.\nCode : {code}\n",
        amount_cents as f64 / 100.0
    );
    if let Some(message) = message {
        body.push_str(&format!("\nMessage : {message}\n"));
    }
    body
}

/// Confirmation messages for a paid booking: the email always, plus an SMS
/// when the customer left a phone number. Enqueued in the same transaction
/// as the pending->paid transition.
pub(crate) fn booking_confirmation_notifications(
    booking: &BookingRequest,
) -> Vec<NewOutboxNotification> {
    let mut notifications = vec![NewOutboxNotification::email(
        booking.customer_email.clone(),
        "Votre réservation movi-lab est confirmée",
        booking_email_body(&booking.service_slug, booking.starts_at),
    )];
    if let Some(phone) = &booking.customer_phone {
        notifications.push(NewOutboxNotification::sms(
            phone.clone(),
            booking_sms_body(&booking.service_slug, booking.starts_at),
        ));
    }
    notifications
}

fn booking_email_body(service_slug: &str, starts_at: time::OffsetDateTime) -> String {
    format!("Votre séance « {service_slug} » du {starts_at} est confirmée.")
}

fn booking_sms_body(service_slug: &str, starts_at: time::OffsetDateTime) -> String {
    format!("movi-lab : séance « {service_slug} » du {starts_at} confirmée.")
}
