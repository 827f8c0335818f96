use serde::Deserialize;
use std::collections::HashMap;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Metadata keys attached to checkout sessions at creation time.
pub const METADATA_KIND: &str = "kind";
pub const KIND_GIFT_CARD: &str = "gift_card";
pub const KIND_BOOKING: &str = "booking";
pub const METADATA_BOOKING_ID: &str = "booking_id";

/// An at-least-once payment-completion notification, parsed only after the
/// delivery's signature has been verified.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: PaymentEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEventData {
    pub object: CheckoutSession,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
}

impl CheckoutSession {
    pub fn kind(&self) -> Option<&str> {
        self.metadata.get(METADATA_KIND).map(String::as_str)
    }
}
