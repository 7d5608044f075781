use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};

use campusdesk_core::{AppError, PaginationParams};
use campusdesk_models::{NotificationId, UserId, UserRole};

use crate::metrics;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::ensure_owner_or_admin;
use crate::modules::notifications::model::{
    MarkedReadResponse, NotificationView, SendNotificationDto, SentNotification,
};

/// Who a notification goes to: explicit users, every user of some roles, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    pub user_ids: Vec<UserId>,
    pub roles: Vec<UserRole>,
}

impl Recipients {
    pub fn user(id: UserId) -> Self {
        Self {
            user_ids: vec![id],
            roles: Vec::new(),
        }
    }

    pub fn role(role: UserRole) -> Self {
        Self {
            user_ids: Vec::new(),
            roles: vec![role],
        }
    }
}

/// Explicit ids first, then role members, each id kept once in first-seen order.
pub fn merge_receivers(explicit: &[UserId], resolved: &[UserId]) -> Vec<UserId> {
    let mut seen = std::collections::HashSet::new();
    explicit
        .iter()
        .chain(resolved)
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

pub struct NotificationService;

impl NotificationService {
    /// Writes one notification on the caller's connection, normally the open
    /// transaction of the workflow that triggered it. Returns `None` when no
    /// receiver resolves.
    #[instrument(skip(conn, message))]
    pub async fn notify(
        conn: &mut PgConnection,
        sender_id: Option<UserId>,
        title: &str,
        message: &str,
        recipients: Recipients,
    ) -> Result<Option<NotificationId>, AppError> {
        let resolved = if recipients.roles.is_empty() {
            Vec::new()
        } else {
            let roles: Vec<String> = recipients
                .roles
                .iter()
                .map(|r| r.as_str().to_string())
                .collect();
            sqlx::query_scalar::<_, UserId>(
                "SELECT id FROM users WHERE role::text = ANY($1) ORDER BY created_at",
            )
            .bind(&roles)
            .fetch_all(&mut *conn)
            .await?
        };

        let receivers = merge_receivers(&recipients.user_ids, &resolved);
        if receivers.is_empty() {
            debug!("notification has no receivers, skipped");
            return Ok(None);
        }

        let id = sqlx::query_scalar::<_, NotificationId>(
            "INSERT INTO notifications (sender_id, title, message, receiver_ids)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(sender_id)
        .bind(title)
        .bind(message)
        .bind(&receivers)
        .fetch_one(&mut *conn)
        .await?;

        metrics::track_notifications_sent(receivers.len());
        debug!(notification.id = %id, receivers = receivers.len(), "notification stored");
        Ok(Some(id))
    }

    /// Manual send from the notifications endpoint. Faculty may only reach students.
    #[instrument(skip(db, dto), fields(sender = %sender.user_id))]
    pub async fn send(
        db: &PgPool,
        sender: &AuthUser,
        dto: SendNotificationDto,
    ) -> Result<NotificationId, AppError> {
        if sender.is_faculty() && dto.roles.iter().any(|r| *r != UserRole::Student) {
            return Err(AppError::forbidden("Faculty can only notify students"));
        }

        let mut tx = db.begin().await?;

        if !dto.receiver_ids.is_empty() {
            let found: Vec<(UserId, UserRole)> =
                sqlx::query_as("SELECT id, role FROM users WHERE id = ANY($1)")
                    .bind(&dto.receiver_ids)
                    .fetch_all(&mut *tx)
                    .await?;

            let unknown = dto
                .receiver_ids
                .iter()
                .any(|id| !found.iter().any(|(f, _)| f == id));
            if unknown {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "One or more receiver ids do not exist"
                )));
            }
            if sender.is_faculty() && found.iter().any(|(_, role)| *role != UserRole::Student) {
                return Err(AppError::forbidden("Faculty can only notify students"));
            }
        }

        let recipients = Recipients {
            user_ids: dto.receiver_ids,
            roles: dto.roles,
        };
        let id = Self::notify(
            &mut tx,
            Some(sender.user_id),
            &dto.title,
            &dto.message,
            recipients,
        )
        .await?
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("No receivers matched")))?;

        tx.commit().await?;
        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn list_for_user(
        db: &PgPool,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<Vec<NotificationView>, AppError> {
        let notifications = sqlx::query_as::<_, NotificationView>(
            "SELECT n.id, n.sender_id, u.name AS sender_name, n.title, n.message,
                    ($1 = ANY(n.read_by)) AS is_read, n.created_at
             FROM notifications n
             LEFT JOIN users u ON u.id = n.sender_id
             WHERE $1 = ANY(n.receiver_ids)
             ORDER BY n.created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(notifications)
    }

    #[instrument(skip(db))]
    pub async fn unread_count(db: &PgPool, user_id: UserId) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications
             WHERE $1 = ANY(receiver_ids) AND NOT ($1 = ANY(read_by))",
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;

        Ok(count)
    }

    /// Idempotent: marking an already-read notification reports `updated: 0`.
    #[instrument(skip(db))]
    pub async fn mark_read(
        db: &PgPool,
        id: NotificationId,
        user_id: UserId,
    ) -> Result<MarkedReadResponse, AppError> {
        let is_receiver = sqlx::query_scalar::<_, bool>(
            "SELECT $2 = ANY(receiver_ids) FROM notifications WHERE id = $1",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        if is_receiver != Some(true) {
            return Err(AppError::not_found(anyhow::anyhow!("Notification not found")));
        }

        let updated = sqlx::query(
            "UPDATE notifications SET read_by = array_append(read_by, $2)
             WHERE id = $1 AND NOT ($2 = ANY(read_by))",
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

        Ok(MarkedReadResponse { updated })
    }

    #[instrument(skip(db))]
    pub async fn mark_all_read(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<MarkedReadResponse, AppError> {
        let updated = sqlx::query(
            "UPDATE notifications SET read_by = array_append(read_by, $1)
             WHERE $1 = ANY(receiver_ids) AND NOT ($1 = ANY(read_by))",
        )
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

        Ok(MarkedReadResponse { updated })
    }

    #[instrument(skip(db))]
    pub async fn list_sent(
        db: &PgPool,
        sender_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<Vec<SentNotification>, AppError> {
        let sent = sqlx::query_as::<_, SentNotification>(
            "SELECT id, title, message,
                    cardinality(receiver_ids) AS recipient_count,
                    cardinality(read_by) AS read_count,
                    created_at
             FROM notifications
             WHERE sender_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(sender_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(sent)
    }

    #[instrument(skip(db))]
    pub async fn delete(
        db: &PgPool,
        id: NotificationId,
        auth_user: &AuthUser,
    ) -> Result<(), AppError> {
        let sender_id = sqlx::query_scalar::<_, Option<UserId>>(
            "SELECT sender_id FROM notifications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notification not found")))?;

        ensure_owner_or_admin(auth_user, sender_id, "sender")?;

        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(())
    }
}
