use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use campusdesk_core::AppError;
use campusdesk_models::{LeaveId, UserId, UserRole};

use crate::metrics;
use crate::middleware::auth::AuthUser;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::leaves::model::{
    CreateLeaveDto, Leave, LeaveDecisionDto, LeaveFilterParams, LeaveStatus, LeaveWithRequester,
};
use crate::modules::notifications::{NotificationService, Recipients};

const LEAVE_COLUMNS: &str = "id, requester_id, requester_role, start_date, end_date, reason, \
     leave_type, status, decided_by, decision_note, decided_at, created_at, updated_at";

fn not_pending(current: LeaveStatus) -> AppError {
    AppError::bad_request(anyhow::anyhow!(
        "Leave request is already {}",
        current.as_str()
    ))
}

pub struct LeaveService;

impl LeaveService {
    async fn find(conn: &mut PgConnection, id: LeaveId) -> Result<Leave, AppError> {
        sqlx::query_as::<_, Leave>(&format!("SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Leave request not found")))
    }

    /// Moves a pending request to `next`. The status check lives in the
    /// `WHERE` clause so two concurrent decisions cannot both succeed.
    async fn transition(
        conn: &mut PgConnection,
        id: LeaveId,
        next: LeaveStatus,
        decided_by: Option<UserId>,
        note: Option<&str>,
    ) -> Result<Leave, AppError> {
        let updated = sqlx::query_as::<_, Leave>(&format!(
            "UPDATE leaves
             SET status = $2,
                 decided_by = COALESCE($3, decided_by),
                 decision_note = COALESCE($4, decision_note),
                 decided_at = CASE WHEN $3::uuid IS NULL THEN decided_at ELSE NOW() END,
                 updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {LEAVE_COLUMNS}"
        ))
        .bind(id)
        .bind(next)
        .bind(decided_by)
        .bind(note)
        .fetch_optional(&mut *conn)
        .await?;

        match updated {
            Some(leave) => Ok(leave),
            None => {
                let current = Self::find(conn, id).await?;
                Err(not_pending(current.status))
            }
        }
    }

    #[instrument(skip(db, dto), fields(requester = %auth_user.user_id))]
    pub async fn submit(
        db: &PgPool,
        auth_user: &AuthUser,
        dto: CreateLeaveDto,
    ) -> Result<Leave, AppError> {
        let mut tx = db.begin().await?;

        let leave = sqlx::query_as::<_, Leave>(&format!(
            "INSERT INTO leaves (requester_id, requester_role, start_date, end_date, reason, leave_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {LEAVE_COLUMNS}"
        ))
        .bind(auth_user.user_id)
        .bind(auth_user.role)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(dto.reason.trim())
        .bind(dto.leave_type)
        .fetch_one(&mut *tx)
        .await?;

        NotificationService::notify(
            &mut tx,
            Some(auth_user.user_id),
            "New leave request",
            &format!(
                "{} requested leave from {} to {}",
                auth_user.email, leave.start_date, leave.end_date
            ),
            Recipients::role(UserRole::Admin),
        )
        .await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Leave,
            format!(
                "Requested leave from {} to {}",
                leave.start_date, leave.end_date
            ),
        )
        .await?;

        tx.commit().await?;
        info!(leave.id = %leave.id, "leave requested");
        Ok(leave)
    }

    #[instrument(skip(db, dto))]
    pub async fn approve(
        db: &PgPool,
        admin_id: UserId,
        id: LeaveId,
        dto: LeaveDecisionDto,
    ) -> Result<Leave, AppError> {
        Self::decide(db, admin_id, id, LeaveStatus::Approved, dto).await
    }

    #[instrument(skip(db, dto))]
    pub async fn reject(
        db: &PgPool,
        admin_id: UserId,
        id: LeaveId,
        dto: LeaveDecisionDto,
    ) -> Result<Leave, AppError> {
        Self::decide(db, admin_id, id, LeaveStatus::Rejected, dto).await
    }

    async fn decide(
        db: &PgPool,
        admin_id: UserId,
        id: LeaveId,
        next: LeaveStatus,
        dto: LeaveDecisionDto,
    ) -> Result<Leave, AppError> {
        let mut tx = db.begin().await?;

        let note = dto.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let leave = Self::transition(&mut tx, id, next, Some(admin_id), note).await?;

        let mut message = format!(
            "Your leave request from {} to {} was {}",
            leave.start_date,
            leave.end_date,
            next.as_str()
        );
        if let Some(note) = note {
            message.push_str(&format!(": {note}"));
        }

        NotificationService::notify(
            &mut tx,
            Some(admin_id),
            "Leave request update",
            &message,
            Recipients::user(leave.requester_id),
        )
        .await?;

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::Leave,
            format!("Leave request {} {}", leave.id, next.as_str()),
        )
        .await?;

        tx.commit().await?;

        metrics::track_leave_decision(next.as_str());
        info!(leave.id = %leave.id, status = next.as_str(), "leave decided");
        Ok(leave)
    }

    #[instrument(skip(db))]
    pub async fn cancel(
        db: &PgPool,
        auth_user: &AuthUser,
        id: LeaveId,
    ) -> Result<Leave, AppError> {
        let mut tx = db.begin().await?;

        let current = Self::find(&mut tx, id).await?;
        if current.requester_id != auth_user.user_id {
            return Err(AppError::forbidden(
                "Only the requester can cancel this leave request",
            ));
        }
        if !current.status.can_transition_to(LeaveStatus::Cancelled) {
            return Err(not_pending(current.status));
        }

        let leave = Self::transition(&mut tx, id, LeaveStatus::Cancelled, None, None).await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Leave,
            format!("Cancelled leave request {}", leave.id),
        )
        .await?;

        tx.commit().await?;
        Ok(leave)
    }

    #[instrument(skip(db))]
    pub async fn list_for_requester(
        db: &PgPool,
        requester_id: UserId,
    ) -> Result<Vec<Leave>, AppError> {
        let leaves = sqlx::query_as::<_, Leave>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves
             WHERE requester_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(requester_id)
        .fetch_all(db)
        .await?;
        Ok(leaves)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        filters: LeaveFilterParams,
    ) -> Result<Vec<LeaveWithRequester>, AppError> {
        let leaves = sqlx::query_as::<_, LeaveWithRequester>(
            "SELECT l.id, l.requester_id, l.requester_role, l.start_date, l.end_date, l.reason,
                    l.leave_type, l.status, l.decided_by, l.decision_note, l.decided_at,
                    l.created_at, l.updated_at,
                    u.name AS requester_name, u.email AS requester_email
             FROM leaves l
             JOIN users u ON u.id = l.requester_id
             WHERE ($1::leave_status IS NULL OR l.status = $1)
             ORDER BY l.created_at DESC",
        )
        .bind(filters.status)
        .fetch_all(db)
        .await?;
        Ok(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_pending_names_current_status() {
        let err = not_pending(LeaveStatus::Approved);
        assert_eq!(err.status.as_u16(), 400);
        assert_eq!(err.message(), "Leave request is already approved");
    }
}
