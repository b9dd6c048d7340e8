//! Payment gateway collaborator. The production implementation talks to an
//! external HTTP charge API; tests substitute their own implementation of
//! [`PaymentGateway`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PaymentConfig;

/// Gateway receipt. `amount` is the settled amount and is the source of
/// truth for an order's total, never the client-side figure.
#[derive(Debug, Clone)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway rejected the charge (declined card, invalid token, ...).
    #[error("charge declined: {0}")]
    Declined(String),

    /// The charge outcome is unknown (timeout, connection dropped mid-call).
    /// Must never be treated as a decline; the charge may have settled.
    #[error("charge state unknown: {0}")]
    Ambiguous(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge `amount` minor units against the opaque `source` token.
    /// `idempotency_key` makes retries of the same logical charge safe.
    async fn charge(
        &self,
        amount: i64,
        source: &str,
        idempotency_key: &str,
    ) -> Result<Charge, PaymentError>;
}

#[derive(Serialize)]
struct ChargeRequest<'a> {
    amount: i64,
    currency: &'a str,
    source: &'a str,
    idempotency_key: &'a str,
}

#[derive(Deserialize)]
struct ChargeResponse {
    id: String,
    amount: i64,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    message: Option<String>,
}

pub struct HttpPaymentGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl HttpPaymentGateway {
    pub fn new(config: PaymentConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(
        &self,
        amount: i64,
        source: &str,
        idempotency_key: &str,
    ) -> Result<Charge, PaymentError> {
        let url = format!("{}/charges", self.config.api_url.trim_end_matches('/'));
        let body = ChargeRequest {
            amount,
            currency: &self.config.currency,
            source,
            idempotency_key,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    PaymentError::Ambiguous(err.to_string())
                } else {
                    PaymentError::Declined(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<GatewayErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("gateway returned {status}"));
            return Err(PaymentError::Declined(message));
        }

        let receipt: ChargeResponse = response.json().await.map_err(|err| {
            // The charge went through but we could not read the receipt.
            PaymentError::Ambiguous(err.to_string())
        })?;

        Ok(Charge {
            id: receipt.id,
            amount: receipt.amount,
        })
    }
}
