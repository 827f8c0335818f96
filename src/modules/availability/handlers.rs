use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use time::macros::format_description;
use time::Date;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::TimeWindow;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub coach_id: Uuid,
    pub date: Date,
    pub windows: Vec<TimeWindow>,
}

/// Effective bookable windows for one coach on one calendar date.
pub async fn get_availability(
    State(state): State<AppState>,
    Path((coach_id, date)): Path<(Uuid, String)>,
) -> AppResult<Json<AvailabilityResponse>> {
    let date = Date::parse(&date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::Validation("date must be YYYY-MM-DD".into()))?;

    let windows = state.availability.resolve(coach_id, date).await?;
    Ok(Json(AvailabilityResponse {
        coach_id,
        date,
        windows,
    }))
}
