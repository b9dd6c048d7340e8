use std::sync::Arc;

use crate::{config::AppConfig, db::DbPool, mail::MailSender, payment::PaymentGateway};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn MailSender>,
}
