use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use campusdesk_auth::create_access_token;
use campusdesk_config::JwtConfig;
use campusdesk_core::{AppError, hash_password, verify_password};
use campusdesk_models::users::{USER_COLUMNS, UserWithPassword};
use campusdesk_models::{AccountStatus, ApprovalStatus, User, UserRole};

use crate::metrics;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::auth::model::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
};
use crate::modules::notifications::{NotificationService, Recipients};
use crate::utils::db_errors::{conflict_on_unique, is_foreign_key_violation};
use crate::utils::email::EmailService;
use crate::utils::tokens::{generate_reset_token, hash_token};

/// Students can sign in straight away; faculty wait for an admin.
pub fn initial_statuses(role: UserRole) -> Result<(ApprovalStatus, AccountStatus), AppError> {
    match role {
        UserRole::Student => Ok((ApprovalStatus::Approved, AccountStatus::Active)),
        UserRole::Faculty => Ok((ApprovalStatus::Pending, AccountStatus::Inactive)),
        UserRole::Admin => Err(AppError::bad_request(anyhow::anyhow!(
            "Admin accounts cannot be self-registered"
        ))),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto), fields(role = %dto.role))]
    pub async fn register(db: &PgPool, dto: RegisterRequest) -> Result<User, AppError> {
        let (approval_status, account_status) = initial_statuses(dto.role)?;
        let email = normalize_email(&dto.email);
        let password = hash_password(&dto.password)?;

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users
                (name, email, password, role, approval_status, account_status,
                 department_id, year, semester, phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(dto.name.trim())
        .bind(&email)
        .bind(&password)
        .bind(dto.role)
        .bind(approval_status)
        .bind(account_status)
        .bind(dto.department_id)
        .bind(dto.year)
        .bind(dto.semester)
        .bind(&dto.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::bad_request(anyhow::anyhow!("Department does not exist"));
            }
            conflict_on_unique(e, "Email is already registered")
        })?;

        if user.role == UserRole::Faculty {
            NotificationService::notify(
                &mut tx,
                Some(user.id),
                "Faculty approval needed",
                &format!("{} ({}) registered as faculty", user.name, user.email),
                Recipients::role(UserRole::Admin),
            )
            .await?;
        }

        ActivityService::log(
            &mut tx,
            Some(user.id),
            ActivityType::Auth,
            format!("Registered as {}", user.role),
        )
        .await?;

        tx.commit().await?;

        metrics::track_user_registered(user.role.as_str());
        info!(user.id = %user.id, "user registered");
        Ok(user)
    }

    #[instrument(skip(db, dto, jwt_config))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let record = sqlx::query_as::<_, UserWithPassword>(&format!(
            "SELECT {USER_COLUMNS}, password FROM users WHERE email = $1"
        ))
        .bind(normalize_email(&dto.email))
        .fetch_optional(db)
        .await?;

        let Some(record) = record else {
            metrics::track_login_failure("unknown_email");
            return Err(AppError::unauthorized("Invalid email or password"));
        };

        if !verify_password(&dto.password, &record.password)? {
            metrics::track_login_failure("bad_password");
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        let user = record.user;
        if !user.can_sign_in() {
            metrics::track_login_failure("not_active");
            let message = match user.approval_status {
                ApprovalStatus::Pending => "Account is awaiting admin approval",
                ApprovalStatus::Rejected => "Account registration was rejected",
                ApprovalStatus::Approved => "Account is inactive",
            };
            return Err(AppError::forbidden(message));
        }

        let token = create_access_token(
            user.id.into_inner(),
            &user.email,
            user.role.as_str(),
            jwt_config,
        )?;

        let mut conn = db.acquire().await?;
        ActivityService::log(&mut conn, Some(user.id), ActivityType::Auth, "login").await?;

        metrics::track_login_success(user.role.as_str());
        info!(user.id = %user.id, "user logged in");
        Ok(LoginResponse { token, user })
    }

    /// Never reveals whether the address is registered.
    #[instrument(skip(db, email, dto))]
    pub async fn forgot_password(
        db: &PgPool,
        email: &EmailService,
        dto: ForgotPasswordRequest,
    ) -> Result<(), AppError> {
        let address = normalize_email(&dto.email);
        let user = sqlx::query_as::<_, (String, String)>(
            "SELECT name, email FROM users WHERE email = $1",
        )
        .bind(&address)
        .fetch_optional(db)
        .await?;

        let Some((name, address)) = user else {
            info!("password reset requested for unknown email");
            return Ok(());
        };

        let reset = generate_reset_token(Utc::now());
        sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3, updated_at = NOW()
             WHERE email = $1",
        )
        .bind(&address)
        .bind(&reset.hash)
        .bind(reset.expires_at)
        .execute(db)
        .await?;

        if let Err(e) = email
            .send_password_reset_email(&address, &name, &reset.token)
            .await
        {
            warn!(error = %e, "password reset email not delivered");
        }
        Ok(())
    }

    #[instrument(skip(db, email, dto))]
    pub async fn reset_password(
        db: &PgPool,
        email: &EmailService,
        dto: ResetPasswordRequest,
    ) -> Result<(), AppError> {
        let token_hash = hash_token(dto.token.trim());
        let password = hash_password(&dto.new_password)?;

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET password = $2, reset_token_hash = NULL, reset_token_expires_at = NULL,
                 updated_at = NOW()
             WHERE reset_token_hash = $1 AND reset_token_expires_at > NOW()
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&token_hash)
        .bind(&password)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Invalid or expired reset token")))?;

        ActivityService::log(&mut tx, Some(user.id), ActivityType::Auth, "Reset password").await?;
        tx.commit().await?;

        if let Err(e) = email
            .send_password_changed_email(&user.email, &user.name)
            .await
        {
            warn!(error = %e, "password change notice not delivered");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faculty_start_pending_and_inactive() {
        assert_eq!(
            initial_statuses(UserRole::Faculty).unwrap(),
            (ApprovalStatus::Pending, AccountStatus::Inactive)
        );
        assert_eq!(
            initial_statuses(UserRole::Student).unwrap(),
            (ApprovalStatus::Approved, AccountStatus::Active)
        );
    }

    #[test]
    fn admin_cannot_self_register() {
        let err = initial_statuses(UserRole::Admin).unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[test]
    fn emails_are_compared_lowercase() {
        assert_eq!(normalize_email("  Ada@College.EDU "), "ada@college.edu");
    }
}
