//! Per-request identity resolution.
//!
//! The bearer token travels in the `token` cookie (set by the credential
//! routes) with the `Authorization: Bearer` header as a fallback for API
//! clients. An absent, invalid or expired token yields an anonymous
//! context, and operations that need an identity reject with
//! `Unauthenticated` themselves. A store failure while looking the user
//! up is not anonymity and propagates as an error instead.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, models::User, state::AppState};

pub const SESSION_COOKIE: &str = "token";

const SESSION_COOKIE_DAYS: i64 = 365;

/// Build the persistent session cookie carrying a signed token.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_COOKIE_DAYS))
        .build()
}

/// Cookie removal (not mere expiry) for signout.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .build()
}

/// Identity context for operations that require a signed-in caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Identity context for operations that accept anonymous callers.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

fn bearer_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let value = cookie.value();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// `Ok(None)` means anonymous; a store error is kept distinct so an
/// outage surfaces as a server error rather than a silent signout.
async fn resolve_user(state: &AppState, parts: &Parts) -> Result<Option<User>, AppError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };

    let decoded = match decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.config.app_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(decoded) => decoded,
        Err(_) => return Ok(None),
    };

    let Ok(user_id) = Uuid::parse_str(&decoded.claims.sub) else {
        return Ok(None);
    };

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?;
    Ok(user)
}

impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(MaybeUser(resolve_user(&state, parts).await?))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        match resolve_user(&state, parts).await? {
            Some(user) => Ok(AuthUser { user }),
            None => Err(AppError::Unauthenticated),
        }
    }
}
