use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};

use campusdesk_core::AppError;
use campusdesk_models::{NoticeId, UserRole};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::ensure_owner_or_admin;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::notices::model::{
    CreateNoticeDto, Notice, NoticeAudience, NoticeWithAuthor, default_notice_expiry,
};

const NOTICE_COLUMNS: &str = "id, title, content, audience, created_by, expires_at, created_at";

fn visible_audiences(role: UserRole) -> Vec<String> {
    [
        NoticeAudience::All,
        NoticeAudience::Faculty,
        NoticeAudience::Student,
    ]
    .into_iter()
    .filter(|a| a.is_visible_to(role))
    .map(|a| match a {
        NoticeAudience::All => "all",
        NoticeAudience::Faculty => "faculty",
        NoticeAudience::Student => "student",
    })
    .map(String::from)
    .collect()
}

pub struct NoticeService;

impl NoticeService {
    #[instrument(skip(db, dto), fields(author = %auth_user.user_id))]
    pub async fn create(
        db: &PgPool,
        auth_user: &AuthUser,
        dto: CreateNoticeDto,
    ) -> Result<Notice, AppError> {
        let now = Utc::now();
        let expires_at = match dto.expires_at {
            Some(at) if at <= now => {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Expiry time must be in the future"
                )));
            }
            Some(at) => at,
            None => default_notice_expiry(now),
        };

        let mut tx = db.begin().await?;

        let notice = sqlx::query_as::<_, Notice>(&format!(
            "INSERT INTO notices (title, content, audience, created_by, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(dto.title.trim())
        .bind(dto.content.trim())
        .bind(dto.audience)
        .bind(auth_user.user_id)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Notice,
            format!("Posted notice '{}'", notice.title),
        )
        .await?;

        tx.commit().await?;
        info!(notice.id = %notice.id, "notice posted");
        Ok(notice)
    }

    /// Unexpired notices the caller's role may read, newest first.
    #[instrument(skip(db))]
    pub async fn list_visible(
        db: &PgPool,
        role: UserRole,
    ) -> Result<Vec<NoticeWithAuthor>, AppError> {
        let notices = sqlx::query_as::<_, NoticeWithAuthor>(
            "SELECT n.id, n.title, n.content, n.audience, n.created_by, n.expires_at, n.created_at,
                    u.name AS author_name
             FROM notices n
             LEFT JOIN users u ON u.id = n.created_by
             WHERE n.expires_at > NOW() AND n.audience::text = ANY($1)
             ORDER BY n.created_at DESC",
        )
        .bind(visible_audiences(role))
        .fetch_all(db)
        .await?;
        Ok(notices)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, auth_user: &AuthUser, id: NoticeId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let notice = sqlx::query_as::<_, Notice>(&format!(
            "SELECT {NOTICE_COLUMNS} FROM notices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notice not found")))?;

        ensure_owner_or_admin(auth_user, notice.created_by, "author")?;

        sqlx::query("DELETE FROM notices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Notice,
            format!("Deleted notice '{}'", notice.title),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn students_read_general_and_student_notices() {
        assert_eq!(visible_audiences(UserRole::Student), vec!["all", "student"]);
        assert_eq!(visible_audiences(UserRole::Faculty), vec!["all", "faculty"]);
        assert_eq!(visible_audiences(UserRole::Admin).len(), 3);
    }
}
