use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse, PaginationParams};
use campusdesk_models::NotificationId;

use crate::middleware::auth::{AuthUser, RequireFacultyOrAdmin};
use crate::modules::notifications::model::{
    MarkedReadResponse, NotificationCreatedResponse, NotificationView, SendNotificationDto,
    SentNotification, UnreadCountResponse,
};
use crate::modules::notifications::service::NotificationService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, query_params};

#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = SendNotificationDto,
    responses(
        (status = 201, description = "Notification sent", body = NotificationCreatedResponse),
        (status = 400, description = "Invalid input or no receivers", body = ErrorResponse),
        (status = 403, description = "Faculty targeting non-students", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn send_notification(
    State(state): State<AppState>,
    RequireFacultyOrAdmin(auth_user): RequireFacultyOrAdmin,
    ValidatedJson(dto): ValidatedJson<SendNotificationDto>,
) -> Result<(StatusCode, Json<NotificationCreatedResponse>), AppError> {
    let id = NotificationService::send(&state.db, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(NotificationCreatedResponse { id })))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(PaginationParams),
    responses(
        (status = 200, description = "Notifications addressed to the caller", body = Vec<NotificationView>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Vec<NotificationView>>, AppError> {
    let pagination = query_params(pagination)?;
    let notifications =
        NotificationService::list_for_user(&state.db, auth_user.user_id, &pagination).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = NotificationService::unread_count(&state.db, auth_user.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id" = NotificationId, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read", body = MarkedReadResponse),
        (status = 404, description = "Not found or not addressed to the caller", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<MarkedReadResponse>, AppError> {
    let response = NotificationService::mark_read(&state.db, id, auth_user.user_id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked as read", body = MarkedReadResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MarkedReadResponse>, AppError> {
    let response = NotificationService::mark_all_read(&state.db, auth_user.user_id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/notifications/sent",
    params(PaginationParams),
    responses(
        (status = 200, description = "Notifications sent by the caller", body = Vec<SentNotification>)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_sent_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Vec<SentNotification>>, AppError> {
    let pagination = query_params(pagination)?;
    let sent = NotificationService::list_sent(&state.db, auth_user.user_id, &pagination).await?;
    Ok(Json(sent))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = NotificationId, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 403, description = "Not the sender", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    NotificationService::delete(&state.db, id, &auth_user).await?;
    Ok(StatusCode::NO_CONTENT)
}
