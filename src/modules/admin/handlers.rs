use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::{
    clear_session_cookie, hash_password, issue_session_token, session_cookie, verify_password,
};
use crate::db::{
    AdminAccount, AvailabilityException, AvailabilityRule, Coach, GiftCard, LoginPayload,
    NewAdminAccount, NewAvailabilityException, NewAvailabilityRule, NewCoach, NewService, Service,
    UpdateAvailabilityRule, UpdateCoach, UpdateService,
};
use crate::error::{AppError, AppResult};

// Sessions

/// Verify credentials and set the session cookie. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let account = state.store.admin_account_by_email(&payload.email).await?;
    let verified = account
        .as_ref()
        .is_some_and(|a| verify_password(&payload.password, &a.password_hash));
    let Some(account) = account.filter(|_| verified) else {
        return Err(AppError::Unauthorized("invalid credentials".into()));
    };

    let token = issue_session_token(
        account.id,
        state.env.auth.session_secret.expose_secret(),
        OffsetDateTime::now_utc(),
    );
    let cookie = session_cookie(&token, state.env.is_production());

    tracing::info!(account_id = %account.id, "admin logged in");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "account_id": account.id })),
    ))
}

pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({ "ok": true })),
    )
}

// Coaches

pub async fn list_coaches(State(state): State<AppState>) -> AppResult<Json<Vec<Coach>>> {
    Ok(Json(state.store.list_coaches().await?))
}

pub async fn create_coach(
    State(state): State<AppState>,
    Json(payload): Json<NewCoach>,
) -> AppResult<(StatusCode, Json<Coach>)> {
    payload.validate()?;
    let coach = state.store.create_coach(&payload).await?;
    Ok((StatusCode::CREATED, Json(coach)))
}

pub async fn update_coach(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCoach>,
) -> AppResult<Json<Coach>> {
    payload.validate()?;
    Ok(Json(state.store.update_coach(id, &payload).await?))
}

pub async fn delete_coach(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.store.delete_coach(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Services

pub async fn list_services(State(state): State<AppState>) -> AppResult<Json<Vec<Service>>> {
    Ok(Json(state.store.list_services().await?))
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<NewService>,
) -> AppResult<(StatusCode, Json<Service>)> {
    payload.validate()?;
    let service = state.store.create_service(&payload).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateService>,
) -> AppResult<Json<Service>> {
    payload.validate()?;
    Ok(Json(state.store.update_service(id, &payload).await?))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.store.delete_service(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Admin accounts

pub async fn list_accounts(State(state): State<AppState>) -> AppResult<Json<Vec<AdminAccount>>> {
    Ok(Json(state.store.list_admin_accounts().await?))
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<NewAdminAccount>,
) -> AppResult<(StatusCode, Json<AdminAccount>)> {
    payload.validate()?;
    let hash = hash_password(&payload.password)
        .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))?;
    let account = state
        .store
        .create_admin_account(&payload.email, &hash)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.store.delete_admin_account(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Availability rules

pub async fn list_rules(
    State(state): State<AppState>,
    Path(coach_id): Path<Uuid>,
) -> AppResult<Json<Vec<AvailabilityRule>>> {
    Ok(Json(state.availability.list_rules(coach_id).await?))
}

pub async fn create_rule(
    State(state): State<AppState>,
    Path(coach_id): Path<Uuid>,
    Json(payload): Json<NewAvailabilityRule>,
) -> AppResult<(StatusCode, Json<AvailabilityRule>)> {
    payload.validate()?;
    let rule = state.availability.create_rule(coach_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn update_rule(
    State(state): State<AppState>,
    Path((coach_id, rule_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateAvailabilityRule>,
) -> AppResult<Json<AvailabilityRule>> {
    payload.validate()?;
    Ok(Json(
        state
            .availability
            .update_rule(coach_id, rule_id, &payload)
            .await?,
    ))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Path((coach_id, rule_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state.availability.delete_rule(coach_id, rule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Availability exceptions

pub async fn list_exceptions(
    State(state): State<AppState>,
    Path(coach_id): Path<Uuid>,
) -> AppResult<Json<Vec<AvailabilityException>>> {
    Ok(Json(state.availability.list_exceptions(coach_id).await?))
}

pub async fn upsert_exception(
    State(state): State<AppState>,
    Path(coach_id): Path<Uuid>,
    Json(payload): Json<NewAvailabilityException>,
) -> AppResult<Json<AvailabilityException>> {
    payload.validate()?;
    Ok(Json(
        state
            .availability
            .upsert_exception(coach_id, &payload)
            .await?,
    ))
}

pub async fn delete_exception(
    State(state): State<AppState>,
    Path((coach_id, date)): Path<(Uuid, String)>,
) -> AppResult<StatusCode> {
    let date = Date::parse(&date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::Validation("date must be YYYY-MM-DD".into()))?;
    state.availability.delete_exception(coach_id, date).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Gift-card back office

#[derive(Debug, Deserialize, Validate)]
pub struct RedeemPayload {
    #[validate(range(min = 1))]
    pub amount_cents: i64,
}

/// In-studio redemption against a card's balance.
pub async fn redeem_gift_card(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<RedeemPayload>,
) -> AppResult<Json<serde_json::Value>> {
    payload.validate()?;
    let remaining_cents = state
        .gift_cards
        .redeem(&code, payload.amount_cents)
        .await?;
    Ok(Json(json!({
        "code": code,
        "redeemed_cents": payload.amount_cents,
        "remaining_cents": remaining_cents,
    })))
}

pub async fn void_gift_card(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<GiftCard>> {
    Ok(Json(state.gift_cards.void(&code).await?))
}
