use std::env;

/// How a failure to deliver the password-reset mail is reported.
///
/// `Silent` logs a warning and still acknowledges the request (resists
/// account enumeration); `Strict` surfaces the failure to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMailPolicy {
    Silent,
    Strict,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub api_url: String,
    pub api_key: String,
    pub currency: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub app_secret: String,
    pub frontend_url: String,
    pub mail: MailConfig,
    pub payment: PaymentConfig,
    pub reset_mail_policy: ResetMailPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let app_secret = env::var("APP_SECRET")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:7777".to_string());

        let mail = MailConfig {
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_address: env::var("MAIL_FROM").unwrap_or_else(|_| "store@example.com".to_string()),
        };

        let payment = PaymentConfig {
            api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.payment.test".to_string()),
            api_key: env::var("PAYMENT_API_KEY").unwrap_or_default(),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            timeout_secs: env::var("PAYMENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };

        let reset_mail_policy = match env::var("RESET_MAIL_POLICY").as_deref() {
            Ok("strict") => ResetMailPolicy::Strict,
            _ => ResetMailPolicy::Silent,
        };

        Ok(Self {
            database_url,
            host,
            port,
            app_secret,
            frontend_url,
            mail,
            payment,
            reset_mail_policy,
        })
    }
}
