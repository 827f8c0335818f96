use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub service_slug: String,
    pub starts_at: OffsetDateTime,
    pub amount_cents: i64,
    pub gift_card_code: Option<String>,
    pub discount_cents: i64,
    pub status: BookingStatus,
    pub checkout_session_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBookingRequest {
    pub coach_id: Uuid,
    #[validate(length(min = 1))]
    pub service_slug: String,
    pub starts_at: OffsetDateTime,
    /// Optional gift-card code, applied as a discount preview; the actual
    /// redemption happens when the payment completes.
    pub gift_card_code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(max = 30))]
    pub customer_phone: Option<String>,
}
