use campusdesk_core::AppError;
use tracing::error;

/// Maps a unique-constraint violation to 409 with `message`; any other
/// database error is a 500.
pub fn conflict_on_unique(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::conflict(anyhow::anyhow!(message.to_string()));
    }
    error!(error = %e, "database error");
    AppError::database(e)
}

pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
