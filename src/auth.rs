//! Admin session tokens and password hashing.
//!
//! A session token is `v1.<payload>.<signature>` where the payload is a
//! base64url JSON document and the signature is HMAC-SHA256 over the
//! payload part keyed with the configured session secret.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";
pub const SESSION_COOKIE: &str = "movilab_session";
/// Fixed session lifetime.
pub const SESSION_TTL: Duration = Duration::hours(24);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,
    #[error("unsupported token version")]
    UnsupportedVersion,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("session expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    account_id: Uuid,
    #[serde(with = "time::serde::timestamp")]
    expires_at: OffsetDateTime,
}

fn sign(payload: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Mint a token for the given admin account, valid for [`SESSION_TTL`].
pub fn issue_session_token(account_id: Uuid, secret: &str, now: OffsetDateTime) -> String {
    let claims = SessionClaims {
        account_id,
        expires_at: now + SESSION_TTL,
    };
    let payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("claims serialize"));
    let signature = sign(&payload, secret);
    format!("{TOKEN_VERSION}.{payload}.{signature}")
}

/// Verify a token and return the authenticated account id.
pub fn verify_session_token(
    token: &str,
    secret: &str,
    now: OffsetDateTime,
) -> Result<Uuid, SessionError> {
    let mut parts = token.splitn(3, '.');
    let (version, payload, signature) = match (parts.next(), parts.next(), parts.next()) {
        (Some(v), Some(p), Some(s)) if !p.is_empty() && !s.is_empty() => (v, p, s),
        _ => return Err(SessionError::Malformed),
    };
    if version != TOKEN_VERSION {
        return Err(SessionError::UnsupportedVersion);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    let provided = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| SessionError::Malformed)?;
    mac.verify_slice(&provided)
        .map_err(|_| SessionError::InvalidSignature)?;

    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| SessionError::Malformed)?;
    let claims: SessionClaims =
        serde_json::from_slice(&raw).map_err(|_| SessionError::Malformed)?;

    if claims.expires_at <= now {
        return Err(SessionError::Expired);
    }
    Ok(claims.account_id)
}

/// `Set-Cookie` value carrying a freshly minted session token.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        SESSION_TTL.whole_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
