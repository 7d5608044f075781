use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::NoticeId;

use crate::middleware::auth::{AuthUser, RequireFacultyOrAdmin};
use crate::modules::notices::model::{CreateNoticeDto, Notice, NoticeWithAuthor};
use crate::modules::notices::service::NoticeService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/notices",
    request_body = CreateNoticeDto,
    responses(
        (status = 201, description = "Notice posted", body = Notice),
        (status = 400, description = "Missing fields or expiry in the past", body = ErrorResponse),
        (status = 403, description = "Faculty or admin access required", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_notice(
    State(state): State<AppState>,
    RequireFacultyOrAdmin(auth_user): RequireFacultyOrAdmin,
    ValidatedJson(dto): ValidatedJson<CreateNoticeDto>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    let notice = NoticeService::create(&state.db, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(notice)))
}

#[utoipa::path(
    get,
    path = "/api/notices",
    responses((status = 200, description = "Active notices for the caller's role", body = Vec<NoticeWithAuthor>)),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_notices(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<NoticeWithAuthor>>, AppError> {
    Ok(Json(
        NoticeService::list_visible(&state.db, auth_user.role).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/notices/{id}",
    params(("id" = NoticeId, Path, description = "Notice ID")),
    responses(
        (status = 204, description = "Notice deleted"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Notice not found", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_notice(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NoticeId>,
) -> Result<StatusCode, AppError> {
    NoticeService::delete(&state.db, &auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
