use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse, PaginationParams};
use campusdesk_models::UserId;
use campusdesk_models::auth::MessageResponse;

use crate::middleware::auth::{AuthUser, RequireAdmin, RequireFacultyOrAdmin};
use crate::modules::users::model::{
    ChangePasswordDto, PaginatedUsersResponse, StudentFilterParams, UpdateAccountStatusDto,
    UpdateProfileDto, User, UserFilterParams,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::{ValidatedJson, query_params};

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Users", body = PaginatedUsersResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    filters: Result<Query<UserFilterParams>, QueryRejection>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let filters = query_params(filters)?;
    let pagination = query_params(pagination)?;
    Ok(Json(UserService::list(&state.db, filters, pagination).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/pending-faculty",
    responses(
        (status = 200, description = "Faculty awaiting approval", body = Vec<User>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_pending_faculty(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(UserService::pending_faculty(&state.db).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/approve",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 200, description = "Faculty approved and activated", body = User),
        (status = 400, description = "Not a pending faculty account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn approve_faculty(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        UserService::approve_faculty(&state.db, admin.user_id, id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/reject",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 200, description = "Faculty rejected", body = User),
        (status = 400, description = "Not a pending faculty account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reject_faculty(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        UserService::reject_faculty(&state.db, admin.user_id, id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/status",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = UpdateAccountStatusDto,
    responses(
        (status = 200, description = "Account status updated", body = User),
        (status = 400, description = "Cannot change own status", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_account_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateAccountStatusDto>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        UserService::set_account_status(&state.db, &admin, id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete own account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User still teaches courses", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    UserService::delete(&state.db, &admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/users/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Students", body = Vec<User>),
        (status = 403, description = "Faculty or admin access required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    RequireFacultyOrAdmin(_auth_user): RequireFacultyOrAdmin,
    filters: Result<Query<StudentFilterParams>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    let filters = query_params(filters)?;
    Ok(Json(UserService::students(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Caller's profile", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::profile(&state.db, auth_user.user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        UserService::update_profile(&state.db, auth_user.user_id, dto).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/users/profile/change-password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    UserService::change_password(&state.db, &email, auth_user.user_id, dto).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
