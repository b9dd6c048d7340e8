#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_storefront_api::{
    config::{AppConfig, MailConfig, PaymentConfig, ResetMailPolicy},
    db::create_pool,
    mail::{MailError, MailSender},
    middleware::session::AuthUser,
    models::{Item, Permission, User},
    payment::{Charge, PaymentError, PaymentGateway},
    services::auth_service,
    state::AppState,
};
use uuid::Uuid;

pub enum GatewayMode {
    /// Settle exactly the requested amount.
    Succeed,
    /// Settle a fixed amount regardless of the request, as a gateway
    /// applying fees or currency conversion would.
    SettleAt(i64),
    Decline,
    /// Fail without a verdict, the way a timeout does: the charge may or
    /// may not have settled on the gateway side.
    Ambiguous,
}

pub struct MockGateway {
    pub mode: GatewayMode,
    /// (amount, idempotency_key) per call.
    pub calls: Mutex<Vec<(i64, String)>>,
}

impl MockGateway {
    pub fn new(mode: GatewayMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(
        &self,
        amount: i64,
        _source: &str,
        idempotency_key: &str,
    ) -> Result<Charge, PaymentError> {
        self.calls
            .lock()
            .unwrap()
            .push((amount, idempotency_key.to_string()));
        match self.mode {
            GatewayMode::Succeed => Ok(Charge {
                id: format!("ch_{}", Uuid::new_v4().simple()),
                amount,
            }),
            GatewayMode::SettleAt(settled) => Ok(Charge {
                id: format!("ch_{}", Uuid::new_v4().simple()),
                amount: settled,
            }),
            GatewayMode::Decline => Err(PaymentError::Declined("card declined".to_string())),
            GatewayMode::Ambiguous => {
                Err(PaymentError::Ambiguous("gateway timed out".to_string()))
            }
        }
    }
}

pub struct MockMailer {
    /// (to, subject, html) per send.
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl MockMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl MailSender for MockMailer {
    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html));
        Ok(())
    }
}

pub fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".to_string(),
        port: 0,
        app_secret: "test-secret".to_string(),
        frontend_url: "http://localhost:7777".to_string(),
        mail: MailConfig {
            smtp_host: "localhost".to_string(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "store@example.com".to_string(),
        },
        payment: PaymentConfig {
            api_url: "http://localhost:0".to_string(),
            api_key: String::new(),
            currency: "USD".to_string(),
            timeout_secs: 1,
        },
        reset_mail_policy: ResetMailPolicy::Silent,
    }
}

/// Connect and migrate, or `None` when no database is configured so the
/// test can skip instead of failing.
pub async fn setup_state(
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn MailSender>,
) -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(Some(AppState {
        pool,
        config: test_config(database_url),
        gateway,
        mailer,
    }))
}

/// Insert a user with a unique email; tests never truncate shared tables.
pub async fn create_user(
    state: &AppState,
    permissions: &[Permission],
) -> anyhow::Result<AuthUser> {
    let email = format!("user-{}@example.com", Uuid::new_v4().simple());
    let password_hash = auth_service::hash_password("secret123")?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, permissions)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind("Test User")
    .bind(password_hash)
    .bind(permissions.to_vec())
    .fetch_one(&state.pool)
    .await?;

    Ok(AuthUser { user })
}

pub async fn create_item(
    state: &AppState,
    owner_id: Uuid,
    title: &str,
    price: i64,
) -> anyhow::Result<Item> {
    let item: Item = sqlx::query_as(
        r#"
        INSERT INTO items (id, title, description, price, user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind("An item for testing")
    .bind(price)
    .bind(owner_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(item)
}

pub async fn cart_row_count(state: &AppState, user_id: Uuid) -> anyhow::Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count.0)
}

pub async fn order_count(state: &AppState, user_id: Uuid) -> anyhow::Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count.0)
}
