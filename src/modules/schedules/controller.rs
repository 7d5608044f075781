use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::ScheduleId;

use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::schedules::model::{
    CreateScheduleDto, ScheduleFilterParams, ScheduleSlotView, UpdateScheduleDto, WeeklySchedule,
};
use crate::modules::schedules::service::ScheduleService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, query_params};

#[utoipa::path(
    post,
    path = "/api/schedules",
    request_body = CreateScheduleDto,
    responses(
        (status = 201, description = "Slot created", body = WeeklySchedule),
        (status = 400, description = "Invalid times or faculty", body = ErrorResponse),
        (status = 404, description = "Course or faculty not found", body = ErrorResponse),
        (status = 409, description = "Faculty already booked at this time", body = ErrorResponse)
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_schedule(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateScheduleDto>,
) -> Result<(StatusCode, Json<WeeklySchedule>), AppError> {
    let slot = ScheduleService::create(&state.db, admin.user_id, dto).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

#[utoipa::path(
    get,
    path = "/api/schedules",
    params(ScheduleFilterParams),
    responses((status = 200, description = "Timetable slots", body = Vec<ScheduleSlotView>)),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_schedules(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    filters: Result<Query<ScheduleFilterParams>, QueryRejection>,
) -> Result<Json<Vec<ScheduleSlotView>>, AppError> {
    let filters = query_params(filters)?;
    Ok(Json(ScheduleService::list(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/schedules/my",
    responses((status = 200, description = "Caller's weekly timetable", body = Vec<ScheduleSlotView>)),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_schedule(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<ScheduleSlotView>>, AppError> {
    Ok(Json(
        ScheduleService::my_schedule(&state.db, &auth_user).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/schedules/{id}",
    params(("id" = ScheduleId, Path, description = "Schedule slot ID")),
    request_body = UpdateScheduleDto,
    responses(
        (status = 200, description = "Slot updated", body = WeeklySchedule),
        (status = 404, description = "Slot not found", body = ErrorResponse),
        (status = 409, description = "Faculty already booked at this time", body = ErrorResponse)
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_schedule(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ScheduleId>,
    ValidatedJson(dto): ValidatedJson<UpdateScheduleDto>,
) -> Result<Json<WeeklySchedule>, AppError> {
    Ok(Json(
        ScheduleService::update(&state.db, admin.user_id, id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/schedules/{id}",
    params(("id" = ScheduleId, Path, description = "Schedule slot ID")),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 404, description = "Slot not found", body = ErrorResponse)
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_schedule(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ScheduleId>,
) -> Result<StatusCode, AppError> {
    ScheduleService::delete(&state.db, admin.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
