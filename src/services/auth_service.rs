use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    config::ResetMailPolicy,
    dto::auth::{Claims, RequestResetRequest, ResetPasswordRequest, SigninRequest, SignupRequest},
    error::{AppError, AppResult},
    mail::reset_email_html,
    models::{Permission, User},
    state::AppState,
};

const RESET_TOKEN_BYTES: usize = 20;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

// Token lifetime matches the session cookie max-age.
const TOKEN_TTL_DAYS: i64 = 365;

pub fn hash_password(plaintext: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plaintext: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Sign a bearer token carrying the user id. Claims are signed, not
/// encrypted, so nothing secret goes in them.
pub fn issue_token(secret: &str, user_id: Uuid) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(TOKEN_TTL_DAYS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<(User, String)> {
    let SignupRequest {
        email,
        name,
        password,
    } = payload;
    let email = email.to_lowercase();

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, permissions)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.as_str())
    .bind(name)
    .bind(password_hash)
    .bind(vec![Permission::User])
    .fetch_one(&state.pool)
    .await?;

    let token = issue_token(&state.config.app_secret, user.id)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_signup",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((user, token))
}

pub async fn signin(state: &AppState, payload: SigninRequest) -> AppResult<(User, String)> {
    let SigninRequest { email, password } = payload;
    let email = email.to_lowercase();

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound(format!("no user found for {email}"))),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::InvalidCredential);
    }

    let token = issue_token(&state.config.app_secret, user.id)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_signin",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((user, token))
}

pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn request_reset(state: &AppState, payload: RequestResetRequest) -> AppResult<()> {
    let email = payload.email.to_lowercase();

    let reset_token = generate_reset_token();
    let expiry = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

    let user: Option<User> = sqlx::query_as(
        r#"
        UPDATE users
        SET reset_token = $1, reset_token_expiry = $2
        WHERE email = $3
        RETURNING *
        "#,
    )
    .bind(reset_token.as_str())
    .bind(expiry)
    .bind(email.as_str())
    .fetch_optional(&state.pool)
    .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound(format!("no user found for {email}"))),
    };

    let html = reset_email_html(&state.config.frontend_url, &reset_token);
    let send_result = state
        .mailer
        .send(&user.email, "Your password reset token", html)
        .await;

    if let Err(err) = send_result {
        match state.config.reset_mail_policy {
            ResetMailPolicy::Silent => {
                tracing::warn!(error = %err, "reset mail delivery failed");
            }
            ResetMailPolicy::Strict => return Err(err.into()),
        }
    }

    Ok(())
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<(User, String)> {
    let ResetPasswordRequest {
        reset_token,
        password,
        confirm_password,
    } = payload;

    if password != confirm_password {
        return Err(AppError::PasswordMismatch);
    }

    let password_hash = hash_password(&password)?;

    // Single conditional update: the strict expiry check, the token check
    // and the single-use clearing happen in one statement, so a concurrent
    // reset with the same token cannot also succeed.
    let user: Option<User> = sqlx::query_as(
        r#"
        UPDATE users
        SET password_hash = $1, reset_token = NULL, reset_token_expiry = NULL
        WHERE reset_token = $2 AND reset_token_expiry > now()
        RETURNING *
        "#,
    )
    .bind(password_hash)
    .bind(reset_token.as_str())
    .fetch_optional(&state.pool)
    .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::InvalidResetToken),
    };

    let token = issue_token(&state.config.app_secret, user.id)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "password_reset",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((user, token))
}
