use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::models::*;
use super::DatabaseError;

pub type StoreResult<T> = Result<T, DatabaseError>;

/// Outcome of an atomic redemption attempt. `InsufficientBalance` means the
/// card exists and is active but the conditional decrement matched no row,
/// i.e. another redemption won the race or the balance was too small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    Redeemed { remaining_cents: i64 },
    NotFound,
    NotUsable,
    InsufficientBalance { remaining_cents: i64 },
}

/// Storage handle for everything the service owns. Passed explicitly so
/// tests can substitute the in-memory fake.
#[async_trait]
pub trait Store: Send + Sync {
    // Coaches
    async fn create_coach(&self, new: &NewCoach) -> StoreResult<Coach>;
    async fn list_coaches(&self) -> StoreResult<Vec<Coach>>;
    async fn coach_by_id(&self, id: Uuid) -> StoreResult<Option<Coach>>;
    async fn update_coach(&self, id: Uuid, update: &UpdateCoach) -> StoreResult<Coach>;
    async fn delete_coach(&self, id: Uuid) -> StoreResult<()>;

    // Services
    async fn create_service(&self, new: &NewService) -> StoreResult<Service>;
    async fn list_services(&self) -> StoreResult<Vec<Service>>;
    async fn service_by_slug(&self, slug: &str) -> StoreResult<Option<Service>>;
    async fn update_service(&self, id: Uuid, update: &UpdateService) -> StoreResult<Service>;
    async fn delete_service(&self, id: Uuid) -> StoreResult<()>;

    // Availability rules. Creation and window updates reject a rule whose
    // active window overlaps an existing active rule for the same
    // (coach, weekday); the violation surfaces as `Duplicate`.
    async fn create_rule(&self, coach_id: Uuid, new: &NewAvailabilityRule)
        -> StoreResult<AvailabilityRule>;
    async fn rules_for_coach(&self, coach_id: Uuid) -> StoreResult<Vec<AvailabilityRule>>;
    async fn active_rules_for(&self, coach_id: Uuid, weekday: i16)
        -> StoreResult<Vec<AvailabilityRule>>;
    async fn update_rule(
        &self,
        coach_id: Uuid,
        rule_id: Uuid,
        update: &UpdateAvailabilityRule,
    ) -> StoreResult<AvailabilityRule>;
    async fn delete_rule(&self, coach_id: Uuid, rule_id: Uuid) -> StoreResult<()>;

    // Availability exceptions: one row per (coach, date), replaced atomically.
    async fn upsert_exception(
        &self,
        coach_id: Uuid,
        new: &NewAvailabilityException,
    ) -> StoreResult<AvailabilityException>;
    async fn exception_for(&self, coach_id: Uuid, date: Date)
        -> StoreResult<Option<AvailabilityException>>;
    async fn list_exceptions(&self, coach_id: Uuid) -> StoreResult<Vec<AvailabilityException>>;
    async fn delete_exception(&self, coach_id: Uuid, date: Date) -> StoreResult<()>;

    // Gift cards
    async fn gift_card_by_code(&self, code: &str) -> StoreResult<Option<GiftCard>>;
    async fn gift_card_by_session(&self, session_id: &str) -> StoreResult<Option<GiftCard>>;
    /// Atomic conditional decrement; flips status to exhausted in the same
    /// statement when the balance reaches zero.
    async fn redeem_gift_card(&self, code: &str, amount_cents: i64) -> StoreResult<RedeemOutcome>;
    /// Inserts the card and, when given, the notification row in one
    /// transaction. A uniqueness violation (code or session id) surfaces as
    /// `Duplicate` with nothing written.
    async fn create_gift_card(
        &self,
        new: &NewGiftCard,
        notification: Option<&NewOutboxNotification>,
    ) -> StoreResult<GiftCard>;
    async fn void_gift_card(&self, code: &str) -> StoreResult<GiftCard>;

    // Gift-card orders
    async fn create_gift_card_order(
        &self,
        new: &NewGiftCardOrder,
        currency: &str,
        checkout_session_id: &str,
    ) -> StoreResult<GiftCardOrder>;
    async fn gift_card_order_by_session(&self, session_id: &str)
        -> StoreResult<Option<GiftCardOrder>>;

    // Booking requests
    async fn create_booking(
        &self,
        new: &NewBookingRequest,
        amount_cents: i64,
        discount_cents: i64,
    ) -> StoreResult<BookingRequest>;
    async fn booking_by_id(&self, id: Uuid) -> StoreResult<Option<BookingRequest>>;
    async fn attach_booking_session(&self, id: Uuid, session_id: &str) -> StoreResult<()>;
    /// Returns true when the row transitioned to paid, false when it was
    /// already paid (idempotent re-delivery). The notification rows are
    /// written in the same transaction as the transition and are skipped
    /// entirely on a no-op.
    async fn mark_booking_paid(
        &self,
        id: Uuid,
        notifications: &[NewOutboxNotification],
    ) -> StoreResult<bool>;

    // Admin accounts
    async fn create_admin_account(&self, email: &str, password_hash: &str)
        -> StoreResult<AdminAccount>;
    async fn admin_account_by_email(&self, email: &str) -> StoreResult<Option<AdminAccount>>;
    async fn list_admin_accounts(&self) -> StoreResult<Vec<AdminAccount>>;
    async fn delete_admin_account(&self, id: Uuid) -> StoreResult<()>;

    // Notification outbox
    async fn enqueue_notification(&self, new: &NewOutboxNotification) -> StoreResult<()>;
    async fn due_notifications(&self, limit: i64) -> StoreResult<Vec<OutboxNotification>>;
    async fn mark_notification_sent(&self, id: Uuid) -> StoreResult<()>;
    async fn reschedule_notification(
        &self,
        id: Uuid,
        attempts: i32,
        next_attempt_at: OffsetDateTime,
        give_up: bool,
    ) -> StoreResult<()>;
}
