//! # Campusdesk DB
//!
//! PostgreSQL pool initialization and the embedded migration set.
//!
//! ```ignore
//! let pool = campusdesk_db::init_db_pool(&database_url).await?;
//! campusdesk_db::run_migrations(&pool).await?;
//! ```

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use sqlx::PgPool;

/// Opens a pool against `database_url`.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    info!(max_connections, "Database pool initialized");
    Ok(pool)
}

/// Applies the SQL migrations under `./migrations` at the workspace root.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
