//! Physical deletion of expired notices and exams.
//!
//! Reads already hide expired notices with `expires_at > NOW()` filters;
//! this sweep only reclaims them. Closed exams are kept for
//! `exam_retention_days` so instructors can still open them. Results
//! outlive the purge: they keep their own title, course and `exam_id`.

use std::time::Duration;

use campusdesk_db::PgPool;
use tracing::{info, instrument, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub notices: u64,
    pub exams: u64,
}

#[instrument(skip(db))]
pub async fn purge_expired(
    db: &PgPool,
    exam_retention_days: i64,
) -> Result<PurgeReport, sqlx::Error> {
    let notices = sqlx::query("DELETE FROM notices WHERE expires_at <= NOW()")
        .execute(db)
        .await?
        .rows_affected();

    let exams = sqlx::query(
        "DELETE FROM exams WHERE expires_at <= NOW() - make_interval(days => $1::int)",
    )
    .bind(exam_retention_days.clamp(0, i64::from(i32::MAX)) as i32)
    .execute(db)
    .await?
    .rows_affected();

    let report = PurgeReport { notices, exams };
    if notices > 0 || exams > 0 {
        info!(notices, exams, "purged expired rows");
    }
    Ok(report)
}

/// Runs [`purge_expired`] forever on a fixed interval. A failed sweep is
/// logged and retried on the next tick.
pub fn spawn_purge_task(
    db: PgPool,
    interval_secs: u64,
    exam_retention_days: i64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            if let Err(e) = purge_expired(&db, exam_retention_days).await {
                warn!(error = %e, "expiry purge failed");
            }
        }
    })
}
