use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use campusdesk_config::{CorsConfig, EmailConfig, JwtConfig, PaymentConfig, StorageConfig};
use campusdesk_core::file_storage::{FileStorage, LocalFileStorage};
use campusdesk_db::{PgPool, init_db_pool, run_migrations};

use crate::utils::payment::{PaymentGateway, StripeGateway};

/// Cloneable handles shared by every request. No mutable state lives here.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub payment_config: PaymentConfig,
    pub storage_config: StorageConfig,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub file_storage: Arc<dyn FileStorage>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_config", &"<redacted>")
            .field("email_config", &self.email_config.smtp_host)
            .field("cors_config", &self.cors_config)
            .field("payment_currency", &self.payment_config.currency)
            .field("storage_config", &self.storage_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Builds state from environment configuration around an existing pool.
    pub fn new(db: PgPool) -> Self {
        let payment_config = PaymentConfig::from_env();
        let storage_config = StorageConfig::from_env();

        let payment_gateway: Arc<dyn PaymentGateway> =
            Arc::new(StripeGateway::new(payment_config.clone()));
        let file_storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::with_max_size(
            storage_config.upload_dir.clone(),
            storage_config.public_url.clone(),
            storage_config.max_upload_bytes,
        ));

        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            email_config: EmailConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            payment_config,
            storage_config,
            payment_gateway,
            file_storage,
        }
    }

    pub fn with_payment_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.payment_gateway = gateway;
        self
    }

    pub fn with_file_storage(mut self, storage: Arc<dyn FileStorage>) -> Self {
        self.file_storage = storage;
        self
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = init_db_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&db)
        .await
        .context("Failed to run database migrations")?;

    Ok(AppState::new(db))
}
