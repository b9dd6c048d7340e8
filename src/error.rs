use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    mail::MailError,
    models::Permission,
    response::{ApiResponse, Meta},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("You must be logged in to do that")]
    Unauthenticated,

    #[error("You don't have permission to do that (requires one of {required:?})")]
    Forbidden { required: Vec<Permission> },

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid password")]
    InvalidCredential,

    #[error("Your passwords don't match")]
    PasswordMismatch,

    #[error("This token is either invalid or expired")]
    InvalidResetToken,

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Payment state unknown: {0}")]
    PaymentPending(String),

    #[error("Order could not be recorded for charge {charge_id}")]
    Inconsistent { charge_id: String },

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Mail error")]
    Mail(#[from] MailError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated | AppError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PasswordMismatch
            | AppError::InvalidResetToken
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::PaymentPending(_) => StatusCode::CONFLICT,
            AppError::Inconsistent { charge_id } => {
                // Money was taken but no order row exists; the charge id is
                // the key a reconciliation job needs.
                tracing::error!(charge_id = %charge_id, "order persistence failed after charge");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Mail(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiResponse::success(
            self.to_string(),
            ErrorData {
                error: self.to_string(),
            },
            Some(Meta::empty()),
        );

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
