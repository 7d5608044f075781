use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use campusdesk_core::password::{hash_password, verify_password};
use campusdesk_core::{AppError, PaginationMeta, PaginationParams};
use campusdesk_models::UserId;

use crate::middleware::auth::AuthUser;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::notifications::{NotificationService, Recipients};
use crate::modules::users::model::{
    ApprovalStatus, ChangePasswordDto, PaginatedUsersResponse, StudentFilterParams,
    USER_COLUMNS, UpdateAccountStatusDto, UpdateProfileDto, User, UserFilterParams, UserRole,
};
use crate::utils::db_errors::is_foreign_key_violation;
use crate::utils::email::EmailService;

pub struct UserService;

impl UserService {
    pub async fn find(conn: &mut PgConnection, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        filters: UserFilterParams,
        pagination: PaginationParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        const WHERE: &str = "WHERE ($1::user_role IS NULL OR role = $1)
               AND ($2::approval_status IS NULL OR approval_status = $2)
               AND ($3::uuid IS NULL OR department_id = $3)";

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users {WHERE}"))
            .bind(filters.role)
            .bind(filters.approval_status)
            .bind(filters.department_id)
            .fetch_one(db)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users {WHERE}
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5"
        ))
        .bind(filters.role)
        .bind(filters.approval_status)
        .bind(filters.department_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::new(&pagination, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn pending_faculty(db: &PgPool) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE role = 'faculty' AND approval_status = 'pending'
             ORDER BY created_at"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    #[instrument(skip(db))]
    pub async fn approve_faculty(
        db: &PgPool,
        admin_id: UserId,
        id: UserId,
    ) -> Result<User, AppError> {
        Self::decide_faculty(db, admin_id, id, ApprovalStatus::Approved).await
    }

    #[instrument(skip(db))]
    pub async fn reject_faculty(
        db: &PgPool,
        admin_id: UserId,
        id: UserId,
    ) -> Result<User, AppError> {
        Self::decide_faculty(db, admin_id, id, ApprovalStatus::Rejected).await
    }

    /// Approval also activates the account; rejection keeps it inactive.
    async fn decide_faculty(
        db: &PgPool,
        admin_id: UserId,
        id: UserId,
        decision: ApprovalStatus,
    ) -> Result<User, AppError> {
        let (approval, account, verb) = match decision {
            ApprovalStatus::Approved => ("approved", "active", "approved"),
            _ => ("rejected", "inactive", "rejected"),
        };

        let mut tx = db.begin().await?;

        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET approval_status = $2::approval_status,
                 account_status = $3::account_status,
                 updated_at = NOW()
             WHERE id = $1 AND role = 'faculty' AND approval_status = 'pending'
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(approval)
        .bind(account)
        .fetch_optional(&mut *tx)
        .await?;

        let user = match updated {
            Some(user) => user,
            None => {
                let current = Self::find(&mut tx, id).await?;
                let message = if current.role != UserRole::Faculty {
                    "User is not a faculty member"
                } else {
                    "Faculty account is not pending approval"
                };
                return Err(AppError::bad_request(anyhow::anyhow!(message)));
            }
        };

        NotificationService::notify(
            &mut tx,
            Some(admin_id),
            "Account review",
            &format!("Your faculty account has been {verb}"),
            Recipients::user(user.id),
        )
        .await?;

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::User,
            format!("Faculty account {} {verb}", user.email),
        )
        .await?;

        tx.commit().await?;
        info!(user.id = %user.id, decision = verb, "faculty reviewed");
        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn set_account_status(
        db: &PgPool,
        admin: &AuthUser,
        id: UserId,
        dto: UpdateAccountStatusDto,
    ) -> Result<User, AppError> {
        if id == admin.user_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot change the status of your own account"
            )));
        }

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET account_status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(dto.account_status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        ActivityService::log(
            &mut tx,
            Some(admin.user_id),
            ActivityType::User,
            format!(
                "Set account {} to {:?}",
                user.email, user.account_status
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Faculty still assigned to courses cannot be removed.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, admin: &AuthUser, id: UserId) -> Result<(), AppError> {
        if id == admin.user_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot delete your own account"
            )));
        }

        let mut tx = db.begin().await?;

        let email = sqlx::query_scalar::<_, String>("DELETE FROM users WHERE id = $1 RETURNING email")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::conflict(anyhow::anyhow!(
                        "User is still the instructor of one or more courses"
                    ));
                }
                AppError::database(e)
            })?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        ActivityService::log(
            &mut tx,
            Some(admin.user_id),
            ActivityType::User,
            format!("Deleted user {email}"),
        )
        .await?;

        tx.commit().await?;
        warn!(user.id = %id, "user deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn students(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE role = 'student'
               AND ($1::uuid IS NULL OR department_id = $1)
               AND ($2::int IS NULL OR year = $2)
               AND ($3::int IS NULL OR semester = $3)
             ORDER BY name"
        ))
        .bind(filters.department_id)
        .bind(filters.year)
        .bind(filters.semester)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    #[instrument(skip(db))]
    pub async fn profile(db: &PgPool, user_id: UserId) -> Result<User, AppError> {
        let mut conn = db.acquire().await?;
        Self::find(&mut conn, user_id).await
    }

    #[instrument(skip(db, dto))]
    pub async fn update_profile(
        db: &PgPool,
        user_id: UserId,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 phone = COALESCE($3, phone),
                 department_id = COALESCE($4, department_id),
                 year = COALESCE($5, year),
                 semester = COALESCE($6, semester),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.phone)
        .bind(dto.department_id)
        .bind(dto.year)
        .bind(dto.semester)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::bad_request(anyhow::anyhow!("Department does not exist"));
            }
            AppError::database(e)
        })?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db, email, dto))]
    pub async fn change_password(
        db: &PgPool,
        email: &EmailService,
        user_id: UserId,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let (name, address, hash) = sqlx::query_as::<_, (String, String, String)>(
            "SELECT name, email, password FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if !verify_password(&dto.current_password, &hash)? {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Current password is incorrect"
            )));
        }

        let new_hash = hash_password(&dto.new_password)?;

        let mut tx = db.begin().await?;
        sqlx::query(
            "UPDATE users
             SET password = $2, reset_token_hash = NULL, reset_token_expires_at = NULL,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(&new_hash)
        .execute(&mut *tx)
        .await?;

        ActivityService::log(
            &mut tx,
            Some(user_id),
            ActivityType::Auth,
            "Changed password",
        )
        .await?;
        tx.commit().await?;

        if let Err(e) = email.send_password_changed_email(&address, &name).await {
            warn!(error = %e, "password change notice not delivered");
        }
        Ok(())
    }
}
