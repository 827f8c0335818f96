//! In-memory store used by tests in place of PostgreSQL. A single async
//! mutex around the whole state stands in for the database's row-level
//! serialization of conflicting writes.

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::*;
use super::store::{RedeemOutcome, Store, StoreResult};
use super::DatabaseError;

#[derive(Default)]
struct FakeState {
    coaches: Vec<Coach>,
    services: Vec<Service>,
    rules: Vec<AvailabilityRule>,
    exceptions: Vec<AvailabilityException>,
    gift_cards: Vec<GiftCard>,
    orders: Vec<GiftCardOrder>,
    bookings: Vec<BookingRequest>,
    accounts: Vec<AdminAccount>,
    outbox: Vec<OutboxNotification>,
}

#[derive(Default)]
pub struct FakeStore {
    state: Mutex<FakeState>,
    /// When set, the next gift-card insert fails as a duplicate exactly
    /// once, to exercise code-collision retry paths.
    pub fail_next_card_insert: std::sync::atomic::AtomicBool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_coach(&self) -> Uuid {
        let id = Uuid::now_v7();
        self.state.lock().await.coaches.push(Coach {
            id,
            name: "Coach".into(),
            email: format!("coach-{id}@movi-lab.fr"),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        });
        id
    }

    pub async fn seed_gift_card(&self, code: &str, amount_cents: i64) {
        let now = OffsetDateTime::now_utc();
        self.state.lock().await.gift_cards.push(GiftCard {
            id: Uuid::now_v7(),
            code: code.to_string(),
            amount_cents,
            remaining_cents: amount_cents,
            currency: "eur".into(),
            status: GiftCardStatus::Active,
            buyer_email: "buyer@example.com".into(),
            recipient_email: None,
            checkout_session_id: None,
            created_at: now,
            updated_at: now,
        });
    }

    pub async fn outbox_len(&self) -> usize {
        self.state.lock().await.outbox.len()
    }

    pub async fn gift_card_count(&self) -> usize {
        self.state.lock().await.gift_cards.len()
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn create_coach(&self, new: &NewCoach) -> StoreResult<Coach> {
        let mut state = self.state.lock().await;
        let email = new.email.to_lowercase();
        if state.coaches.iter().any(|c| c.email == email) {
            return Err(DatabaseError::Duplicate);
        }
        let coach = Coach {
            id: Uuid::now_v7(),
            name: new.name.clone(),
            email,
            is_active: new.is_active.unwrap_or(true),
            created_at: OffsetDateTime::now_utc(),
        };
        state.coaches.push(coach.clone());
        Ok(coach)
    }

    async fn list_coaches(&self) -> StoreResult<Vec<Coach>> {
        Ok(self.state.lock().await.coaches.clone())
    }

    async fn coach_by_id(&self, id: Uuid) -> StoreResult<Option<Coach>> {
        Ok(self
            .state
            .lock()
            .await
            .coaches
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn update_coach(&self, id: Uuid, update: &UpdateCoach) -> StoreResult<Coach> {
        let mut state = self.state.lock().await;
        let coach = state
            .coaches
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DatabaseError::NotFound)?;
        if let Some(name) = &update.name {
            coach.name = name.clone();
        }
        if let Some(email) = &update.email {
            coach.email = email.to_lowercase();
        }
        if let Some(is_active) = update.is_active {
            coach.is_active = is_active;
        }
        Ok(coach.clone())
    }

    async fn delete_coach(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let before = state.coaches.len();
        state.coaches.retain(|c| c.id != id);
        if state.coaches.len() == before {
            return Err(DatabaseError::NotFound);
        }
        state.rules.retain(|r| r.coach_id != id);
        state.exceptions.retain(|e| e.coach_id != id);
        Ok(())
    }

    async fn create_service(&self, new: &NewService) -> StoreResult<Service> {
        let mut state = self.state.lock().await;
        if state.services.iter().any(|s| s.slug == new.slug) {
            return Err(DatabaseError::Duplicate);
        }
        let service = Service {
            id: Uuid::now_v7(),
            slug: new.slug.clone(),
            name: new.name.clone(),
            description: new.description.clone(),
            duration_minutes: new.duration_minutes,
            price_cents: new.price_cents,
            currency: new.currency.clone().unwrap_or_else(|| "eur".into()),
            is_active: new.is_active.unwrap_or(true),
            created_at: OffsetDateTime::now_utc(),
        };
        state.services.push(service.clone());
        Ok(service)
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        Ok(self.state.lock().await.services.clone())
    }

    async fn service_by_slug(&self, slug: &str) -> StoreResult<Option<Service>> {
        Ok(self
            .state
            .lock()
            .await
            .services
            .iter()
            .find(|s| s.slug == slug)
            .cloned())
    }

    async fn update_service(&self, id: Uuid, update: &UpdateService) -> StoreResult<Service> {
        let mut state = self.state.lock().await;
        let service = state
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(DatabaseError::NotFound)?;
        if let Some(name) = &update.name {
            service.name = name.clone();
        }
        if update.description.is_some() {
            service.description = update.description.clone();
        }
        if let Some(duration) = update.duration_minutes {
            service.duration_minutes = duration;
        }
        if let Some(price) = update.price_cents {
            service.price_cents = price;
        }
        if let Some(is_active) = update.is_active {
            service.is_active = is_active;
        }
        Ok(service.clone())
    }

    async fn delete_service(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let before = state.services.len();
        state.services.retain(|s| s.id != id);
        if state.services.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn create_rule(
        &self,
        coach_id: Uuid,
        new: &NewAvailabilityRule,
    ) -> StoreResult<AvailabilityRule> {
        let mut state = self.state.lock().await;
        let is_active = new.is_active.unwrap_or(true);
        if is_active
            && state.rules.iter().any(|r| {
                r.coach_id == coach_id
                    && r.weekday == new.weekday
                    && r.is_active
                    && windows_overlap(r.start_minute, r.end_minute, new.start_minute, new.end_minute)
            })
        {
            return Err(DatabaseError::Duplicate);
        }
        let rule = AvailabilityRule {
            id: Uuid::now_v7(),
            coach_id,
            weekday: new.weekday,
            start_minute: new.start_minute,
            end_minute: new.end_minute,
            is_active,
            created_at: OffsetDateTime::now_utc(),
        };
        state.rules.push(rule.clone());
        Ok(rule)
    }

    async fn rules_for_coach(&self, coach_id: Uuid) -> StoreResult<Vec<AvailabilityRule>> {
        Ok(self
            .state
            .lock()
            .await
            .rules
            .iter()
            .filter(|r| r.coach_id == coach_id)
            .cloned()
            .collect())
    }

    async fn active_rules_for(
        &self,
        coach_id: Uuid,
        weekday: i16,
    ) -> StoreResult<Vec<AvailabilityRule>> {
        Ok(self
            .state
            .lock()
            .await
            .rules
            .iter()
            .filter(|r| r.coach_id == coach_id && r.weekday == weekday && r.is_active)
            .cloned()
            .collect())
    }

    async fn update_rule(
        &self,
        coach_id: Uuid,
        rule_id: Uuid,
        update: &UpdateAvailabilityRule,
    ) -> StoreResult<AvailabilityRule> {
        let mut state = self.state.lock().await;
        let current = state
            .rules
            .iter()
            .find(|r| r.id == rule_id && r.coach_id == coach_id)
            .cloned()
            .ok_or(DatabaseError::NotFound)?;

        let start_minute = update.start_minute.unwrap_or(current.start_minute);
        let end_minute = update.end_minute.unwrap_or(current.end_minute);
        let is_active = update.is_active.unwrap_or(current.is_active);

        if start_minute >= end_minute {
            return Err(DatabaseError::InvalidInput(
                "start_minute must be before end_minute".into(),
            ));
        }
        if is_active
            && state.rules.iter().any(|r| {
                r.id != rule_id
                    && r.coach_id == coach_id
                    && r.weekday == current.weekday
                    && r.is_active
                    && windows_overlap(r.start_minute, r.end_minute, start_minute, end_minute)
            })
        {
            return Err(DatabaseError::Duplicate);
        }

        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .expect("rule present");
        rule.start_minute = start_minute;
        rule.end_minute = end_minute;
        rule.is_active = is_active;
        Ok(rule.clone())
    }

    async fn delete_rule(&self, coach_id: Uuid, rule_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let before = state.rules.len();
        state
            .rules
            .retain(|r| !(r.id == rule_id && r.coach_id == coach_id));
        if state.rules.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn upsert_exception(
        &self,
        coach_id: Uuid,
        new: &NewAvailabilityException,
    ) -> StoreResult<AvailabilityException> {
        let mut state = self.state.lock().await;
        state
            .exceptions
            .retain(|e| !(e.coach_id == coach_id && e.date == new.date));
        let exception = AvailabilityException {
            id: Uuid::now_v7(),
            coach_id,
            date: new.date,
            start_minute: new.start_minute,
            end_minute: new.end_minute,
            is_available: new.is_available,
            note: new.note.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        state.exceptions.push(exception.clone());
        Ok(exception)
    }

    async fn exception_for(
        &self,
        coach_id: Uuid,
        date: Date,
    ) -> StoreResult<Option<AvailabilityException>> {
        Ok(self
            .state
            .lock()
            .await
            .exceptions
            .iter()
            .find(|e| e.coach_id == coach_id && e.date == date)
            .cloned())
    }

    async fn list_exceptions(&self, coach_id: Uuid) -> StoreResult<Vec<AvailabilityException>> {
        Ok(self
            .state
            .lock()
            .await
            .exceptions
            .iter()
            .filter(|e| e.coach_id == coach_id)
            .cloned()
            .collect())
    }

    async fn delete_exception(&self, coach_id: Uuid, date: Date) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let before = state.exceptions.len();
        state
            .exceptions
            .retain(|e| !(e.coach_id == coach_id && e.date == date));
        if state.exceptions.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn gift_card_by_code(&self, code: &str) -> StoreResult<Option<GiftCard>> {
        Ok(self
            .state
            .lock()
            .await
            .gift_cards
            .iter()
            .find(|c| c.code == code)
            .cloned())
    }

    async fn gift_card_by_session(&self, session_id: &str) -> StoreResult<Option<GiftCard>> {
        Ok(self
            .state
            .lock()
            .await
            .gift_cards
            .iter()
            .find(|c| c.checkout_session_id.as_deref() == Some(session_id))
            .cloned())
    }

    async fn redeem_gift_card(&self, code: &str, amount_cents: i64) -> StoreResult<RedeemOutcome> {
        let mut state = self.state.lock().await;
        let Some(card) = state.gift_cards.iter_mut().find(|c| c.code == code) else {
            return Ok(RedeemOutcome::NotFound);
        };
        if card.status != GiftCardStatus::Active || card.remaining_cents <= 0 {
            return Ok(RedeemOutcome::NotUsable);
        }
        if card.remaining_cents < amount_cents {
            return Ok(RedeemOutcome::InsufficientBalance {
                remaining_cents: card.remaining_cents,
            });
        }
        card.remaining_cents -= amount_cents;
        if card.remaining_cents == 0 {
            card.status = GiftCardStatus::Exhausted;
        }
        card.updated_at = OffsetDateTime::now_utc();
        Ok(RedeemOutcome::Redeemed {
            remaining_cents: card.remaining_cents,
        })
    }

    async fn create_gift_card(
        &self,
        new: &NewGiftCard,
        notification: Option<&NewOutboxNotification>,
    ) -> StoreResult<GiftCard> {
        use std::sync::atomic::Ordering;

        if self.fail_next_card_insert.swap(false, Ordering::SeqCst) {
            return Err(DatabaseError::Duplicate);
        }

        let mut state = self.state.lock().await;
        let session_taken = new.checkout_session_id.as_ref().is_some_and(|sid| {
            state
                .gift_cards
                .iter()
                .any(|c| c.checkout_session_id.as_ref() == Some(sid))
        });
        if session_taken || state.gift_cards.iter().any(|c| c.code == new.code) {
            return Err(DatabaseError::Duplicate);
        }

        let now = OffsetDateTime::now_utc();
        let card = GiftCard {
            id: Uuid::now_v7(),
            code: new.code.clone(),
            amount_cents: new.amount_cents,
            remaining_cents: new.amount_cents,
            currency: new.currency.clone(),
            status: GiftCardStatus::Active,
            buyer_email: new.buyer_email.clone(),
            recipient_email: new.recipient_email.clone(),
            checkout_session_id: new.checkout_session_id.clone(),
            created_at: now,
            updated_at: now,
        };
        state.gift_cards.push(card.clone());

        if let Some(notification) = notification {
            state.outbox.push(OutboxNotification {
                id: Uuid::now_v7(),
                channel: notification.channel,
                recipient: notification.recipient.clone(),
                subject: notification.subject.clone(),
                body: notification.body.clone(),
                status: NotificationStatus::Pending,
                attempts: 0,
                next_attempt_at: now,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(card)
    }

    async fn void_gift_card(&self, code: &str) -> StoreResult<GiftCard> {
        let mut state = self.state.lock().await;
        let card = state
            .gift_cards
            .iter_mut()
            .find(|c| c.code == code)
            .ok_or(DatabaseError::NotFound)?;
        card.status = GiftCardStatus::Void;
        card.updated_at = OffsetDateTime::now_utc();
        Ok(card.clone())
    }

    async fn create_gift_card_order(
        &self,
        new: &NewGiftCardOrder,
        currency: &str,
        checkout_session_id: &str,
    ) -> StoreResult<GiftCardOrder> {
        let mut state = self.state.lock().await;
        if state
            .orders
            .iter()
            .any(|o| o.checkout_session_id == checkout_session_id)
        {
            return Err(DatabaseError::Duplicate);
        }
        let order = GiftCardOrder {
            id: Uuid::now_v7(),
            price_id: new.price_id.clone(),
            amount_cents: new.amount_cents,
            currency: currency.to_string(),
            buyer_name: new.buyer_name.clone(),
            buyer_email: new.buyer_email.clone(),
            recipient_email: new.recipient_email.clone(),
            message: new.message.clone(),
            checkout_session_id: checkout_session_id.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn gift_card_order_by_session(
        &self,
        session_id: &str,
    ) -> StoreResult<Option<GiftCardOrder>> {
        Ok(self
            .state
            .lock()
            .await
            .orders
            .iter()
            .find(|o| o.checkout_session_id == session_id)
            .cloned())
    }

    async fn create_booking(
        &self,
        new: &NewBookingRequest,
        amount_cents: i64,
        discount_cents: i64,
    ) -> StoreResult<BookingRequest> {
        let now = OffsetDateTime::now_utc();
        let booking = BookingRequest {
            id: Uuid::now_v7(),
            coach_id: new.coach_id,
            service_slug: new.service_slug.clone(),
            starts_at: new.starts_at,
            amount_cents,
            gift_card_code: new.gift_card_code.clone(),
            discount_cents,
            status: BookingStatus::Pending,
            checkout_session_id: None,
            customer_name: new.customer_name.clone(),
            customer_email: new.customer_email.clone(),
            customer_phone: new.customer_phone.clone(),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn booking_by_id(&self, id: Uuid) -> StoreResult<Option<BookingRequest>> {
        Ok(self
            .state
            .lock()
            .await
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }

    async fn attach_booking_session(&self, id: Uuid, session_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(DatabaseError::NotFound)?;
        booking.checkout_session_id = Some(session_id.to_string());
        Ok(())
    }

    async fn mark_booking_paid(
        &self,
        id: Uuid,
        notifications: &[NewOutboxNotification],
    ) -> StoreResult<bool> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(DatabaseError::NotFound)?;
        if booking.status == BookingStatus::Paid {
            return Ok(false);
        }
        booking.status = BookingStatus::Paid;
        booking.updated_at = now;

        for notification in notifications {
            state.outbox.push(OutboxNotification {
                id: Uuid::now_v7(),
                channel: notification.channel,
                recipient: notification.recipient.clone(),
                subject: notification.subject.clone(),
                body: notification.body.clone(),
                status: NotificationStatus::Pending,
                attempts: 0,
                next_attempt_at: now,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(true)
    }

    async fn create_admin_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<AdminAccount> {
        let mut state = self.state.lock().await;
        let email = email.to_lowercase();
        if state.accounts.iter().any(|a| a.email == email) {
            return Err(DatabaseError::Duplicate);
        }
        let account = AdminAccount {
            id: Uuid::now_v7(),
            email,
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn admin_account_by_email(&self, email: &str) -> StoreResult<Option<AdminAccount>> {
        let email = email.to_lowercase();
        Ok(self
            .state
            .lock()
            .await
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn list_admin_accounts(&self) -> StoreResult<Vec<AdminAccount>> {
        Ok(self.state.lock().await.accounts.clone())
    }

    async fn delete_admin_account(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let before = state.accounts.len();
        state.accounts.retain(|a| a.id != id);
        if state.accounts.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn enqueue_notification(&self, new: &NewOutboxNotification) -> StoreResult<()> {
        let now = OffsetDateTime::now_utc();
        self.state.lock().await.outbox.push(OutboxNotification {
            id: Uuid::now_v7(),
            channel: new.channel,
            recipient: new.recipient.clone(),
            subject: new.subject.clone(),
            body: new.body.clone(),
            status: NotificationStatus::Pending,
            attempts: 0,
            next_attempt_at: now,
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn due_notifications(&self, limit: i64) -> StoreResult<Vec<OutboxNotification>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .state
            .lock()
            .await
            .outbox
            .iter()
            .filter(|n| n.status == NotificationStatus::Pending && n.next_attempt_at <= now)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_notification_sent(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(notification) = state.outbox.iter_mut().find(|n| n.id == id) {
            notification.status = NotificationStatus::Sent;
            notification.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn reschedule_notification(
        &self,
        id: Uuid,
        attempts: i32,
        next_attempt_at: OffsetDateTime,
        give_up: bool,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(notification) = state.outbox.iter_mut().find(|n| n.id == id) {
            notification.attempts = attempts;
            notification.next_attempt_at = next_attempt_at;
            notification.status = if give_up {
                NotificationStatus::Failed
            } else {
                NotificationStatus::Pending
            };
            notification.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }
}
