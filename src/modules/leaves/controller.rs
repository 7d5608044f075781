use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::LeaveId;

use crate::middleware::auth::{AuthUser, RequireAdmin, RequireFacultyOrStudent};
use crate::modules::leaves::model::{
    CreateLeaveDto, Leave, LeaveDecisionDto, LeaveFilterParams, LeaveWithRequester,
};
use crate::modules::leaves::service::LeaveService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, query_params};

#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeaveDto,
    responses(
        (status = 201, description = "Leave requested", body = Leave),
        (status = 400, description = "Invalid dates or missing reason", body = ErrorResponse),
        (status = 403, description = "Faculty or student access required", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn submit_leave(
    State(state): State<AppState>,
    RequireFacultyOrStudent(auth_user): RequireFacultyOrStudent,
    ValidatedJson(dto): ValidatedJson<CreateLeaveDto>,
) -> Result<(StatusCode, Json<Leave>), AppError> {
    let leave = LeaveService::submit(&state.db, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(leave)))
}

#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilterParams),
    responses(
        (status = 200, description = "All leave requests", body = Vec<LeaveWithRequester>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_leaves(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    filters: Result<Query<LeaveFilterParams>, QueryRejection>,
) -> Result<Json<Vec<LeaveWithRequester>>, AppError> {
    let filters = query_params(filters)?;
    Ok(Json(LeaveService::list(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/leave/my",
    responses((status = 200, description = "Caller's leave requests", body = Vec<Leave>)),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_leaves(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Leave>>, AppError> {
    Ok(Json(
        LeaveService::list_for_requester(&state.db, auth_user.user_id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/approve",
    params(("id" = LeaveId, Path, description = "Leave request ID")),
    request_body = LeaveDecisionDto,
    responses(
        (status = 200, description = "Leave approved", body = Leave),
        (status = 400, description = "Leave request is not pending", body = ErrorResponse),
        (status = 404, description = "Leave request not found", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn approve_leave(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<LeaveId>,
    ValidatedJson(dto): ValidatedJson<LeaveDecisionDto>,
) -> Result<Json<Leave>, AppError> {
    Ok(Json(
        LeaveService::approve(&state.db, admin.user_id, id, dto).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/reject",
    params(("id" = LeaveId, Path, description = "Leave request ID")),
    request_body = LeaveDecisionDto,
    responses(
        (status = 200, description = "Leave rejected", body = Leave),
        (status = 400, description = "Leave request is not pending", body = ErrorResponse),
        (status = 404, description = "Leave request not found", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn reject_leave(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<LeaveId>,
    ValidatedJson(dto): ValidatedJson<LeaveDecisionDto>,
) -> Result<Json<Leave>, AppError> {
    Ok(Json(
        LeaveService::reject(&state.db, admin.user_id, id, dto).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/cancel",
    params(("id" = LeaveId, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave cancelled", body = Leave),
        (status = 400, description = "Leave request is not pending", body = ErrorResponse),
        (status = 403, description = "Not the requester", body = ErrorResponse),
        (status = 404, description = "Leave request not found", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn cancel_leave(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<LeaveId>,
) -> Result<Json<Leave>, AppError> {
    Ok(Json(LeaveService::cancel(&state.db, &auth_user, id).await?))
}
