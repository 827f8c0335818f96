use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "gift_card_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GiftCardStatus {
    Active,
    Exhausted,
    /// Terminal administrative state; a void card is never usable again.
    Void,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct GiftCard {
    pub id: Uuid,
    pub code: String,
    /// Immutable face value.
    pub amount_cents: i64,
    /// 0 <= remaining_cents <= amount_cents, monotonically non-increasing.
    pub remaining_cents: i64,
    pub currency: String,
    pub status: GiftCardStatus,
    pub buyer_email: String,
    pub recipient_email: Option<String>,
    pub checkout_session_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewGiftCard {
    pub code: String,
    pub amount_cents: i64,
    pub currency: String,
    pub buyer_email: String,
    pub recipient_email: Option<String>,
    pub checkout_session_id: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct GiftCardOrder {
    pub id: Uuid,
    pub price_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub buyer_name: Option<String>,
    pub buyer_email: String,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
    pub checkout_session_id: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewGiftCardOrder {
    #[validate(length(min = 1))]
    pub price_id: String,
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    pub buyer_name: Option<String>,
    #[validate(email)]
    pub buyer_email: String,
    #[validate(email)]
    pub recipient_email: Option<String>,
    #[validate(length(max = 500))]
    pub message: Option<String>,
}

/// Result of the read-only validation preview.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GiftCardQuote {
    pub valid: bool,
    pub applicable_cents: i64,
    pub message: String,
}

impl GiftCardQuote {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            applicable_cents: 0,
            message: message.into(),
        }
    }
}

/// Normalized lookup form of a user-entered code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
