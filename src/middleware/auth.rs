//! Cookie-based admin session guard.

use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::{verify_session_token, SESSION_COOKIE};
use crate::error::AppError;

/// The authenticated admin account, inserted into request extensions for
/// handlers that want to know who acted.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession {
    pub account_id: Uuid,
}

/// Rejects with 401 unless the request carries a valid, unexpired session
/// cookie. Applied to every admin route except login.
pub async fn require_admin_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_cookie_value(&request)
        .ok_or_else(|| AppError::Unauthorized("missing session cookie".into()))?;

    let account_id = verify_session_token(
        &token,
        state.env.auth.session_secret.expose_secret(),
        OffsetDateTime::now_utc(),
    )
    .map_err(|err| AppError::Unauthorized(err.to_string()))?;

    request.extensions_mut().insert(AdminSession { account_id });
    Ok(next.run(request).await)
}

fn session_cookie_value(request: &Request) -> Option<String> {
    let header = request.headers().get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}
