//! Session cookie handling and the caller extractors.
//!
//! The cookie only carries a signed, expiring user id. Handlers get the caller through
//! [`CurrentUser`] or [`MaybeUser`] and pass it on explicitly.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use rb_core::error::{AppError, Result};
use rb_core::models::Caller;

pub const SESSION_COOKIE: &str = "rb_session";

fn cookie_attributes(state: &AppState) -> &'static str {
    if state.secure_cookies {
        "Path=/; HttpOnly; SameSite=Lax; Secure"
    } else {
        "Path=/; HttpOnly; SameSite=Lax"
    }
}

/// `Set-Cookie` header that logs `user_id` in. The cookie lives as long as
/// the signed token does.
pub fn login_cookie(state: &AppState, user_id: i64) -> Result<HeaderValue> {
    let token = state.signer.sign(user_id)?;
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Max-Age={}; {}",
        state.signer.max_age().as_secs(),
        cookie_attributes(state),
    ))
    .map_err(|e| AppError::Internal(format!("session cookie: {e}")))
}

/// `Set-Cookie` header that clears the session.
pub fn logout_cookie(state: &AppState) -> (HeaderName, HeaderValue) {
    let value = if state.secure_cookies {
        "rb_session=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax; Secure"
    } else {
        "rb_session=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax"
    };
    (SET_COOKIE, HeaderValue::from_static(value))
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
}

async fn caller_from(parts: &Parts, state: &AppState) -> Result<Option<Caller>> {
    let Some(token) = session_token(&parts.headers) else {
        return Ok(None);
    };
    let Some(user_id) = state.signer.verify(token) else {
        tracing::warn!("session cookie with a bad signature");
        return Ok(None);
    };
    match state.kitchen.identify(user_id).await {
        Ok(caller) => Ok(Some(caller)),
        Err(AppError::Unauthorized(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// A logged-in caller. Anonymous requests are redirected to `/login`.
pub struct CurrentUser(pub Caller);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        caller_from(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| ApiError(AppError::Unauthorized("login required".into())))
    }
}

/// The caller, if any. Used by pages anyone may see.
pub struct MaybeUser(pub Option<Caller>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        Ok(MaybeUser(caller_from(parts, state).await?))
    }
}
