use std::sync::Arc;

use crate::db::{
    normalize_code, GiftCard, GiftCardQuote, GiftCardStatus, RedeemOutcome, Store,
};
use crate::error::{AppError, AppResult};

/// Validation and redemption over gift-card balances. `validate` is a
/// read-only preview; only `redeem` moves money, and it re-clamps against
/// the balance current at redemption time.
pub struct GiftCardService {
    store: Arc<dyn Store>,
}

impl GiftCardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn validate(
        &self,
        code: &str,
        requested_amount_cents: i64,
    ) -> AppResult<GiftCardQuote> {
        if requested_amount_cents <= 0 {
            return Err(AppError::Validation("amount_cents must be positive".into()));
        }

        let code = normalize_code(code);
        let Some(card) = self.store.gift_card_by_code(&code).await? else {
            return Ok(GiftCardQuote::invalid("code not found"));
        };

        if card.status != GiftCardStatus::Active || card.remaining_cents <= 0 {
            return Ok(GiftCardQuote::invalid("no longer usable"));
        }

        let applicable_cents = requested_amount_cents.min(card.remaining_cents);
        if applicable_cents <= 0 {
            return Ok(GiftCardQuote::invalid("no applicable balance"));
        }

        Ok(GiftCardQuote {
            valid: true,
            applicable_cents,
            message: format!("{:.2} € applicable", applicable_cents as f64 / 100.0),
        })
    }

    /// Atomically deduct `amount_cents`, returning the new remaining
    /// balance. A previously previewed amount is never trusted here.
    pub async fn redeem(&self, code: &str, amount_cents: i64) -> AppResult<i64> {
        if amount_cents <= 0 {
            return Err(AppError::Validation("amount_cents must be positive".into()));
        }

        let code = normalize_code(code);
        match self.store.redeem_gift_card(&code, amount_cents).await? {
            RedeemOutcome::Redeemed { remaining_cents } => Ok(remaining_cents),
            RedeemOutcome::NotFound => Err(AppError::NotFound(format!("gift card {code}"))),
            RedeemOutcome::NotUsable => {
                Err(AppError::Conflict("gift card is no longer usable".into()))
            }
            RedeemOutcome::InsufficientBalance { remaining_cents } => {
                Err(AppError::InsufficientBalance(format!(
                    "requested {amount_cents} cents but only {remaining_cents} remain"
                )))
            }
        }
    }

    pub async fn void(&self, code: &str) -> AppResult<GiftCard> {
        let code = normalize_code(code);
        Ok(self.store.void_gift_card(&code).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fake::FakeStore;

    const CODE: &str = "MOVI-AB12-CD34";

    async fn service_with_card(amount_cents: i64) -> (Arc<FakeStore>, GiftCardService) {
        let store = Arc::new(FakeStore::new());
        store.seed_gift_card(CODE, amount_cents).await;
        let service = GiftCardService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn validate_clamps_to_remaining_balance() {
        // 250.00 € requested against a 150.00 € card applies 150.00 €.
        let (_, service) = service_with_card(15_000).await;
        let quote = service.validate("movi-ab12-cd34", 25_000).await.unwrap();
        assert!(quote.valid);
        assert_eq!(quote.applicable_cents, 15_000);
    }

    #[tokio::test]
    async fn validate_is_read_only() {
        let (store, service) = service_with_card(15_000).await;
        service.validate(CODE, 5_000).await.unwrap();
        let card = store.gift_card_by_code(CODE).await.unwrap().unwrap();
        assert_eq!(card.remaining_cents, 15_000);
    }

    #[tokio::test]
    async fn unknown_code_is_invalid_not_an_error() {
        let (_, service) = service_with_card(15_000).await;
        let quote = service.validate("MOVI-ZZZZ-ZZZZ", 1_000).await.unwrap();
        assert!(!quote.valid);
        assert_eq!(quote.message, "code not found");
    }

    #[tokio::test]
    async fn void_card_is_no_longer_usable() {
        let (_, service) = service_with_card(15_000).await;
        service.void(CODE).await.unwrap();

        let quote = service.validate(CODE, 1_000).await.unwrap();
        assert!(!quote.valid);
        assert_eq!(quote.message, "no longer usable");

        let err = service.redeem(CODE, 1_000).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn redeem_decrements_and_exhausts() {
        let (store, service) = service_with_card(10_000).await;

        assert_eq!(service.redeem(CODE, 4_000).await.unwrap(), 6_000);
        assert_eq!(service.redeem(CODE, 6_000).await.unwrap(), 0);

        let card = store.gift_card_by_code(CODE).await.unwrap().unwrap();
        assert_eq!(card.status, GiftCardStatus::Exhausted);

        let err = service.redeem(CODE, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn redeem_rejects_overdraw_without_partial_mutation() {
        let (store, service) = service_with_card(1_000).await;
        let err = service.redeem(CODE, 1_500).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance(_)));

        let card = store.gift_card_by_code(CODE).await.unwrap().unwrap();
        assert_eq!(card.remaining_cents, 1_000);
    }

    #[tokio::test]
    async fn concurrent_redemptions_never_overdraw() {
        let (store, _) = service_with_card(1_000).await;
        let a = GiftCardService::new(store.clone());
        let b = GiftCardService::new(store.clone());

        let (first, second) = tokio::join!(a.redeem(CODE, 700), b.redeem(CODE, 700));

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let loser = if first.is_err() { first } else { second };
        assert!(matches!(loser.unwrap_err(), AppError::InsufficientBalance(_)));

        let card = store.gift_card_by_code(CODE).await.unwrap().unwrap();
        assert_eq!(card.remaining_cents, 300);
    }

    #[tokio::test]
    async fn total_redeemed_never_exceeds_face_value() {
        let (store, service) = service_with_card(5_000).await;
        let mut redeemed = 0_i64;
        for _ in 0..10 {
            if service.redeem(CODE, 1_200).await.is_ok() {
                redeemed += 1_200;
            }
        }
        assert!(redeemed <= 5_000);
        let card = store.gift_card_by_code(CODE).await.unwrap().unwrap();
        assert_eq!(card.remaining_cents, 5_000 - redeemed);
    }
}
