pub mod seeder;

use anyhow::{Context, bail};
use sqlx::PgPool;

use campusdesk_core::hash_password;
use campusdesk_models::users::USER_COLUMNS;
use campusdesk_models::{User, UserRole};

/// Admins cannot self-register; this is the only way to create one.
pub async fn create_admin(
    db: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<User> {
    if password.len() < 6 {
        bail!("Password must be at least 6 characters");
    }

    let hashed_password =
        hash_password(password).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e.message()))?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password, role, approval_status, account_status)
         VALUES ($1, $2, $3, $4, 'approved', 'active')
         ON CONFLICT (email) DO NOTHING
         RETURNING {USER_COLUMNS}"
    ))
    .bind(name.trim())
    .bind(email.trim().to_lowercase())
    .bind(hashed_password)
    .bind(UserRole::Admin)
    .fetch_optional(db)
    .await
    .context("Failed to insert admin")?;

    match user {
        Some(user) => Ok(user),
        None => bail!("A user with this email already exists"),
    }
}
