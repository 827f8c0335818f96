use async_trait::async_trait;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::models::*;
use super::store::{RedeemOutcome, Store, StoreResult};
use super::DatabaseError;

/// PostgreSQL-backed store. All multi-statement mutations run inside a
/// transaction; single-row invariants are expressed as conditional
/// statements so concurrent writers serialize at the row level.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn overlapping_rule_exists(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        coach_id: Uuid,
        weekday: i16,
        start_minute: i32,
        end_minute: i32,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool> {
        // Advisory pre-check for a precise error before the write. The
        // authoritative guard is the availability_rules_no_overlap exclusion
        // constraint, which holds even when two transactions race past this
        // check; its violation surfaces as Duplicate like any other.
        let rows = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            SELECT id, coach_id, weekday, start_minute, end_minute, is_active, created_at
            FROM availability_rules
            WHERE coach_id = $1 AND weekday = $2 AND is_active
            FOR UPDATE
            "#,
        )
        .bind(coach_id)
        .bind(weekday)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.iter().any(|rule| {
            Some(rule.id) != exclude
                && windows_overlap(rule.start_minute, rule.end_minute, start_minute, end_minute)
        }))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_coach(&self, new: &NewCoach) -> StoreResult<Coach> {
        let coach = sqlx::query_as::<_, Coach>(
            r#"
            INSERT INTO coaches (id, name, email, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, is_active, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&new.name)
        .bind(new.email.to_lowercase())
        .bind(new.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        Ok(coach)
    }

    async fn list_coaches(&self) -> StoreResult<Vec<Coach>> {
        let coaches = sqlx::query_as::<_, Coach>(
            "SELECT id, name, email, is_active, created_at FROM coaches ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(coaches)
    }

    async fn coach_by_id(&self, id: Uuid) -> StoreResult<Option<Coach>> {
        let coach = sqlx::query_as::<_, Coach>(
            "SELECT id, name, email, is_active, created_at FROM coaches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coach)
    }

    async fn update_coach(&self, id: Uuid, update: &UpdateCoach) -> StoreResult<Coach> {
        let coach = sqlx::query_as::<_, Coach>(
            r#"
            UPDATE coaches
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING id, name, email, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.email.as_deref().map(str::to_lowercase))
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;

        Ok(coach)
    }

    async fn delete_coach(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM coaches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn create_service(&self, new: &NewService) -> StoreResult<Service> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (id, slug, name, description, duration_minutes, price_cents, currency, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, slug, name, description, duration_minutes, price_cents, currency, is_active, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&new.slug)
        .bind(&new.name)
        .bind(new.description.as_deref())
        .bind(new.duration_minutes)
        .bind(new.price_cents)
        .bind(new.currency.as_deref().unwrap_or("eur"))
        .bind(new.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        Ok(service)
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, slug, name, description, duration_minutes, price_cents, currency, is_active, created_at
            FROM services
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    async fn service_by_slug(&self, slug: &str) -> StoreResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, slug, name, description, duration_minutes, price_cents, currency, is_active, created_at
            FROM services
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    async fn update_service(&self, id: Uuid, update: &UpdateService) -> StoreResult<Service> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                duration_minutes = COALESCE($4, duration_minutes),
                price_cents = COALESCE($5, price_cents),
                is_active = COALESCE($6, is_active)
            WHERE id = $1
            RETURNING id, slug, name, description, duration_minutes, price_cents, currency, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.duration_minutes)
        .bind(update.price_cents)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;

        Ok(service)
    }

    async fn delete_service(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn create_rule(
        &self,
        coach_id: Uuid,
        new: &NewAvailabilityRule,
    ) -> StoreResult<AvailabilityRule> {
        let mut tx = self.pool.begin().await?;

        let is_active = new.is_active.unwrap_or(true);
        if is_active
            && Self::overlapping_rule_exists(
                &mut tx,
                coach_id,
                new.weekday,
                new.start_minute,
                new.end_minute,
                None,
            )
            .await?
        {
            return Err(DatabaseError::Duplicate);
        }

        let rule = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            INSERT INTO availability_rules (id, coach_id, weekday, start_minute, end_minute, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, coach_id, weekday, start_minute, end_minute, is_active, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(coach_id)
        .bind(new.weekday)
        .bind(new.start_minute)
        .bind(new.end_minute)
        .bind(is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rule)
    }

    async fn rules_for_coach(&self, coach_id: Uuid) -> StoreResult<Vec<AvailabilityRule>> {
        let rules = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            SELECT id, coach_id, weekday, start_minute, end_minute, is_active, created_at
            FROM availability_rules
            WHERE coach_id = $1
            ORDER BY weekday, start_minute
            "#,
        )
        .bind(coach_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    async fn active_rules_for(
        &self,
        coach_id: Uuid,
        weekday: i16,
    ) -> StoreResult<Vec<AvailabilityRule>> {
        let rules = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            SELECT id, coach_id, weekday, start_minute, end_minute, is_active, created_at
            FROM availability_rules
            WHERE coach_id = $1 AND weekday = $2 AND is_active
            ORDER BY start_minute
            "#,
        )
        .bind(coach_id)
        .bind(weekday)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    async fn update_rule(
        &self,
        coach_id: Uuid,
        rule_id: Uuid,
        update: &UpdateAvailabilityRule,
    ) -> StoreResult<AvailabilityRule> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            SELECT id, coach_id, weekday, start_minute, end_minute, is_active, created_at
            FROM availability_rules
            WHERE id = $1 AND coach_id = $2
            FOR UPDATE
            "#,
        )
        .bind(rule_id)
        .bind(coach_id)
        .fetch_optional(&mut *tx)
        .await?
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
            && Self::overlapping_rule_exists(
                &mut tx,
                coach_id,
                current.weekday,
                start_minute,
                end_minute,
                Some(rule_id),
            )
            .await?
        {
            return Err(DatabaseError::Duplicate);
        }

        let rule = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            UPDATE availability_rules
            SET start_minute = $3, end_minute = $4, is_active = $5
            WHERE id = $1 AND coach_id = $2
            RETURNING id, coach_id, weekday, start_minute, end_minute, is_active, created_at
            "#,
        )
        .bind(rule_id)
        .bind(coach_id)
        .bind(start_minute)
        .bind(end_minute)
        .bind(is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rule)
    }

    async fn delete_rule(&self, coach_id: Uuid, rule_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM availability_rules WHERE id = $1 AND coach_id = $2")
            .bind(rule_id)
            .bind(coach_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn upsert_exception(
        &self,
        coach_id: Uuid,
        new: &NewAvailabilityException,
    ) -> StoreResult<AvailabilityException> {
        // The UNIQUE (coach_id, date) constraint makes the replacement
        // atomic even under concurrent admin edits.
        let exception = sqlx::query_as::<_, AvailabilityException>(
            r#"
            INSERT INTO availability_exceptions (id, coach_id, date, start_minute, end_minute, is_available, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (coach_id, date) DO UPDATE
            SET start_minute = EXCLUDED.start_minute,
                end_minute = EXCLUDED.end_minute,
                is_available = EXCLUDED.is_available,
                note = EXCLUDED.note
            RETURNING id, coach_id, date, start_minute, end_minute, is_available, note, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(coach_id)
        .bind(new.date)
        .bind(new.start_minute)
        .bind(new.end_minute)
        .bind(new.is_available)
        .bind(new.note.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(exception)
    }

    async fn exception_for(
        &self,
        coach_id: Uuid,
        date: Date,
    ) -> StoreResult<Option<AvailabilityException>> {
        let exception = sqlx::query_as::<_, AvailabilityException>(
            r#"
            SELECT id, coach_id, date, start_minute, end_minute, is_available, note, created_at
            FROM availability_exceptions
            WHERE coach_id = $1 AND date = $2
            "#,
        )
        .bind(coach_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exception)
    }

    async fn list_exceptions(&self, coach_id: Uuid) -> StoreResult<Vec<AvailabilityException>> {
        let exceptions = sqlx::query_as::<_, AvailabilityException>(
            r#"
            SELECT id, coach_id, date, start_minute, end_minute, is_available, note, created_at
            FROM availability_exceptions
            WHERE coach_id = $1
            ORDER BY date
            "#,
        )
        .bind(coach_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(exceptions)
    }

    async fn delete_exception(&self, coach_id: Uuid, date: Date) -> StoreResult<()> {
        let result =
            sqlx::query("DELETE FROM availability_exceptions WHERE coach_id = $1 AND date = $2")
                .bind(coach_id)
                .bind(date)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn gift_card_by_code(&self, code: &str) -> StoreResult<Option<GiftCard>> {
        let card = sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT id, code, amount_cents, remaining_cents, currency, status,
                   buyer_email, recipient_email, checkout_session_id, created_at, updated_at
            FROM gift_cards
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    async fn gift_card_by_session(&self, session_id: &str) -> StoreResult<Option<GiftCard>> {
        let card = sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT id, code, amount_cents, remaining_cents, currency, status,
                   buyer_email, recipient_email, checkout_session_id, created_at, updated_at
            FROM gift_cards
            WHERE checkout_session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    async fn redeem_gift_card(&self, code: &str, amount_cents: i64) -> StoreResult<RedeemOutcome> {
        // Single conditional read-modify-write: the WHERE clause re-checks
        // the balance at redemption time, so concurrent redemptions cannot
        // jointly overdraw the card.
        let remaining = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE gift_cards
            SET remaining_cents = remaining_cents - $2,
                status = CASE WHEN remaining_cents - $2 = 0 THEN 'exhausted'::gift_card_status ELSE status END,
                updated_at = now()
            WHERE code = $1 AND status = 'active' AND remaining_cents >= $2
            RETURNING remaining_cents
            "#,
        )
        .bind(code)
        .bind(amount_cents)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining_cents) = remaining {
            return Ok(RedeemOutcome::Redeemed { remaining_cents });
        }

        match self.gift_card_by_code(code).await? {
            None => Ok(RedeemOutcome::NotFound),
            Some(card) if card.status != GiftCardStatus::Active || card.remaining_cents <= 0 => {
                Ok(RedeemOutcome::NotUsable)
            }
            Some(card) => Ok(RedeemOutcome::InsufficientBalance {
                remaining_cents: card.remaining_cents,
            }),
        }
    }

    async fn create_gift_card(
        &self,
        new: &NewGiftCard,
        notification: Option<&NewOutboxNotification>,
    ) -> StoreResult<GiftCard> {
        let mut tx = self.pool.begin().await?;

        let card = sqlx::query_as::<_, GiftCard>(
            r#"
            INSERT INTO gift_cards (id, code, amount_cents, remaining_cents, currency,
                                    buyer_email, recipient_email, checkout_session_id)
            VALUES ($1, $2, $3, $3, $4, $5, $6, $7)
            RETURNING id, code, amount_cents, remaining_cents, currency, status,
                      buyer_email, recipient_email, checkout_session_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&new.code)
        .bind(new.amount_cents)
        .bind(&new.currency)
        .bind(&new.buyer_email)
        .bind(new.recipient_email.as_deref())
        .bind(new.checkout_session_id.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        if let Some(notification) = notification {
            insert_notification(&mut tx, notification).await?;
        }

        tx.commit().await?;
        Ok(card)
    }

    async fn void_gift_card(&self, code: &str) -> StoreResult<GiftCard> {
        let card = sqlx::query_as::<_, GiftCard>(
            r#"
            UPDATE gift_cards
            SET status = 'void', updated_at = now()
            WHERE code = $1
            RETURNING id, code, amount_cents, remaining_cents, currency, status,
                      buyer_email, recipient_email, checkout_session_id, created_at, updated_at
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;

        Ok(card)
    }

    async fn create_gift_card_order(
        &self,
        new: &NewGiftCardOrder,
        currency: &str,
        checkout_session_id: &str,
    ) -> StoreResult<GiftCardOrder> {
        let order = sqlx::query_as::<_, GiftCardOrder>(
            r#"
            INSERT INTO gift_card_orders (id, price_id, amount_cents, currency, buyer_name,
                                          buyer_email, recipient_email, message, checkout_session_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, price_id, amount_cents, currency, buyer_name, buyer_email,
                      recipient_email, message, checkout_session_id, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&new.price_id)
        .bind(new.amount_cents)
        .bind(currency)
        .bind(new.buyer_name.as_deref())
        .bind(&new.buyer_email)
        .bind(new.recipient_email.as_deref())
        .bind(new.message.as_deref())
        .bind(checkout_session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(order)
    }

    async fn gift_card_order_by_session(
        &self,
        session_id: &str,
    ) -> StoreResult<Option<GiftCardOrder>> {
        let order = sqlx::query_as::<_, GiftCardOrder>(
            r#"
            SELECT id, price_id, amount_cents, currency, buyer_name, buyer_email,
                   recipient_email, message, checkout_session_id, created_at
            FROM gift_card_orders
            WHERE checkout_session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn create_booking(
        &self,
        new: &NewBookingRequest,
        amount_cents: i64,
        discount_cents: i64,
    ) -> StoreResult<BookingRequest> {
        let booking = sqlx::query_as::<_, BookingRequest>(
            r#"
            INSERT INTO booking_requests (id, coach_id, service_slug, starts_at, amount_cents,
                                          gift_card_code, discount_cents, customer_name,
                                          customer_email, customer_phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, coach_id, service_slug, starts_at, amount_cents, gift_card_code,
                      discount_cents, status, checkout_session_id, customer_name,
                      customer_email, customer_phone, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(new.coach_id)
        .bind(&new.service_slug)
        .bind(new.starts_at)
        .bind(amount_cents)
        .bind(new.gift_card_code.as_deref())
        .bind(discount_cents)
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(new.customer_phone.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn booking_by_id(&self, id: Uuid) -> StoreResult<Option<BookingRequest>> {
        let booking = sqlx::query_as::<_, BookingRequest>(
            r#"
            SELECT id, coach_id, service_slug, starts_at, amount_cents, gift_card_code,
                   discount_cents, status, checkout_session_id, customer_name,
                   customer_email, customer_phone, created_at, updated_at
            FROM booking_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn attach_booking_session(&self, id: Uuid, session_id: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE booking_requests SET checkout_session_id = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn mark_booking_paid(
        &self,
        id: Uuid,
        notifications: &[NewOutboxNotification],
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Guarded transition: re-delivery of the same completion event
        // matches no row and is reported as a no-op.
        let result = sqlx::query(
            "UPDATE booking_requests SET status = 'paid', updated_at = now() WHERE id = $1 AND status <> 'paid'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return match self.booking_by_id(id).await? {
                Some(_) => Ok(false),
                None => Err(DatabaseError::NotFound),
            };
        }

        for notification in notifications {
            insert_notification(&mut tx, notification).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn create_admin_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<AdminAccount> {
        let account = sqlx::query_as::<_, AdminAccount>(
            r#"
            INSERT INTO admin_accounts (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(email.to_lowercase())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn admin_account_by_email(&self, email: &str) -> StoreResult<Option<AdminAccount>> {
        let account = sqlx::query_as::<_, AdminAccount>(
            "SELECT id, email, password_hash, created_at FROM admin_accounts WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn list_admin_accounts(&self) -> StoreResult<Vec<AdminAccount>> {
        let accounts = sqlx::query_as::<_, AdminAccount>(
            "SELECT id, email, password_hash, created_at FROM admin_accounts ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn delete_admin_account(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM admin_accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn enqueue_notification(&self, new: &NewOutboxNotification) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_notification(&mut tx, new).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn due_notifications(&self, limit: i64) -> StoreResult<Vec<OutboxNotification>> {
        let notifications = sqlx::query_as::<_, OutboxNotification>(
            r#"
            SELECT id, channel, recipient, subject, body, status, attempts,
                   next_attempt_at, created_at, updated_at
            FROM notification_outbox
            WHERE status = 'pending' AND next_attempt_at <= now()
            ORDER BY next_attempt_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_notification_sent(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "UPDATE notification_outbox SET status = 'sent', updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reschedule_notification(
        &self,
        id: Uuid,
        attempts: i32,
        next_attempt_at: OffsetDateTime,
        give_up: bool,
    ) -> StoreResult<()> {
        let status = if give_up { "failed" } else { "pending" };
        sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = $2::notification_status, attempts = $3, next_attempt_at = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(attempts)
        .bind(next_attempt_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

async fn insert_notification(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new: &NewOutboxNotification,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notification_outbox (id, channel, recipient, subject, body)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(new.channel)
    .bind(&new.recipient)
    .bind(new.subject.as_deref())
    .bind(&new.body)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
