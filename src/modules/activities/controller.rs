use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse, PaginationParams};

use crate::middleware::auth::AuthUser;
use crate::modules::activities::model::{ActivityFilterParams, PaginatedActivitiesResponse};
use crate::modules::activities::service::ActivityService;
use crate::state::AppState;
use crate::validator::query_params;

/// Recent activity across the college. Admin only (router-level gate).
#[utoipa::path(
    get,
    path = "/api/activity",
    params(ActivityFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Recent activity", body = PaginatedActivitiesResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Activity",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_activities(
    State(state): State<AppState>,
    filters: Result<Query<ActivityFilterParams>, QueryRejection>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedActivitiesResponse>, AppError> {
    let filters = query_params(filters)?;
    let pagination = query_params(pagination)?;
    let activities = ActivityService::list(&state.db, filters, pagination).await?;
    Ok(Json(activities))
}

#[utoipa::path(
    get,
    path = "/api/activity/my",
    params(PaginationParams),
    responses(
        (status = 200, description = "The caller's own activity", body = PaginatedActivitiesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Activity",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_activities(
    State(state): State<AppState>,
    auth_user: AuthUser,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedActivitiesResponse>, AppError> {
    let pagination = query_params(pagination)?;
    let activities =
        ActivityService::list_for_actor(&state.db, auth_user.user_id, pagination).await?;
    Ok(Json(activities))
}
