//! Outbound checkout-session creation at the payment processor.

use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

use crate::config::PaymentsConfig;
use crate::db::{BookingRequest, NewGiftCardOrder, Service};
use crate::error::{AppError, AppResult};

use super::events::{KIND_BOOKING, KIND_GIFT_CARD, METADATA_BOOKING_ID, METADATA_KIND};

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Thin client over the processor's `/v1/checkout/sessions` endpoint.
/// All requests carry a bounded timeout; a timeout or non-2xx response
/// surfaces as `ExternalService`.
pub struct CheckoutClient {
    http: reqwest::Client,
    config: PaymentsConfig,
}

impl CheckoutClient {
    pub fn new(config: PaymentsConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    async fn create_session(&self, form: Vec<(String, String)>) -> AppResult<CheckoutSession> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("payment processor: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "checkout session creation rejected");
            return Err(AppError::ExternalService(format!(
                "payment processor returned {status}"
            )));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::ExternalService(format!("payment processor: {e}")))
    }

    pub async fn create_gift_card_session(
        &self,
        order: &NewGiftCardOrder,
    ) -> AppResult<CheckoutSession> {
        let mut form = self.base_form();
        form.push(("line_items[0][price]".into(), order.price_id.clone()));
        form.push(("line_items[0][quantity]".into(), "1".into()));
        form.push(("customer_email".into(), order.buyer_email.clone()));
        form.push((format!("metadata[{METADATA_KIND}]"), KIND_GIFT_CARD.into()));
        self.create_session(form).await
    }

    pub async fn create_booking_session(
        &self,
        booking: &BookingRequest,
        service: &Service,
        payable_cents: i64,
    ) -> AppResult<CheckoutSession> {
        let mut form = self.base_form();
        form.push((
            "line_items[0][price_data][currency]".into(),
            service.currency.clone(),
        ));
        form.push((
            "line_items[0][price_data][product_data][name]".into(),
            service.name.clone(),
        ));
        form.push((
            "line_items[0][price_data][unit_amount]".into(),
            payable_cents.to_string(),
        ));
        form.push(("line_items[0][quantity]".into(), "1".into()));
        form.push(("customer_email".into(), booking.customer_email.clone()));
        form.push((format!("metadata[{METADATA_KIND}]"), KIND_BOOKING.into()));
        form.push((
            format!("metadata[{METADATA_BOOKING_ID}]"),
            booking.id.to_string(),
        ));
        self.create_session(form).await
    }

    fn base_form(&self) -> Vec<(String, String)> {
        vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), self.config.success_url.clone()),
            ("cancel_url".into(), self.config.cancel_url.clone()),
        ]
    }
}
