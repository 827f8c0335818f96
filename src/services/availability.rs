use std::sync::Arc;
use time::Date;
use uuid::Uuid;

use crate::db::{
    resolve_windows, weekday_index, NewAvailabilityException, NewAvailabilityRule, Store,
    TimeWindow, UpdateAvailabilityRule,
};
use crate::db::{AvailabilityException, AvailabilityRule, DatabaseError};
use crate::error::{AppError, AppResult};

/// Read path for effective coach availability, plus the admin mutations
/// over the rules and exceptions it reads.
pub struct AvailabilityService {
    store: Arc<dyn Store>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Effective bookable windows for one coach and date, sorted and
    /// non-overlapping. Weekdays are numbered 0=Sunday .. 6=Saturday.
    pub async fn resolve(&self, coach_id: Uuid, date: Date) -> AppResult<Vec<TimeWindow>> {
        if self.store.coach_by_id(coach_id).await?.is_none() {
            return Err(AppError::NotFound(format!("coach {coach_id}")));
        }

        let exception = self.store.exception_for(coach_id, date).await?;
        let rules = self
            .store
            .active_rules_for(coach_id, weekday_index(date))
            .await?;

        Ok(resolve_windows(exception.as_ref(), &rules))
    }

    pub async fn create_rule(
        &self,
        coach_id: Uuid,
        new: &NewAvailabilityRule,
    ) -> AppResult<AvailabilityRule> {
        if new.start_minute >= new.end_minute {
            return Err(AppError::Validation(
                "start_minute must be before end_minute".into(),
            ));
        }
        self.ensure_coach(coach_id).await?;
        self.store.create_rule(coach_id, new).await.map_err(|err| {
            if err.is_duplicate() {
                AppError::Conflict("rule overlaps an existing active rule for this weekday".into())
            } else {
                err.into()
            }
        })
    }

    pub async fn list_rules(&self, coach_id: Uuid) -> AppResult<Vec<AvailabilityRule>> {
        self.ensure_coach(coach_id).await?;
        Ok(self.store.rules_for_coach(coach_id).await?)
    }

    pub async fn update_rule(
        &self,
        coach_id: Uuid,
        rule_id: Uuid,
        update: &UpdateAvailabilityRule,
    ) -> AppResult<AvailabilityRule> {
        self.store
            .update_rule(coach_id, rule_id, update)
            .await
            .map_err(|err| match err {
                DatabaseError::Duplicate => AppError::Conflict(
                    "rule overlaps an existing active rule for this weekday".into(),
                ),
                other => other.into(),
            })
    }

    pub async fn delete_rule(&self, coach_id: Uuid, rule_id: Uuid) -> AppResult<()> {
        Ok(self.store.delete_rule(coach_id, rule_id).await?)
    }

    /// Replace the exception for (coach, date); at most one row survives.
    pub async fn upsert_exception(
        &self,
        coach_id: Uuid,
        new: &NewAvailabilityException,
    ) -> AppResult<AvailabilityException> {
        if !new.window_is_valid() {
            return Err(AppError::Validation(
                "an available exception requires start_minute < end_minute".into(),
            ));
        }
        self.ensure_coach(coach_id).await?;
        Ok(self.store.upsert_exception(coach_id, new).await?)
    }

    pub async fn list_exceptions(&self, coach_id: Uuid) -> AppResult<Vec<AvailabilityException>> {
        self.ensure_coach(coach_id).await?;
        Ok(self.store.list_exceptions(coach_id).await?)
    }

    pub async fn delete_exception(&self, coach_id: Uuid, date: Date) -> AppResult<()> {
        Ok(self.store.delete_exception(coach_id, date).await?)
    }

    async fn ensure_coach(&self, coach_id: Uuid) -> AppResult<()> {
        if self.store.coach_by_id(coach_id).await?.is_none() {
            return Err(AppError::NotFound(format!("coach {coach_id}")));
        }
        Ok(())
    }
}
