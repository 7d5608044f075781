use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::CourseId;

use crate::middleware::auth::{AuthUser, RequireFacultyOrAdmin, RequireStudent};
use crate::modules::attendance::model::{
    AttendanceFilterParams, AttendanceWithStudent, MarkAttendanceDto, MarkAttendanceResponse,
    MyAttendanceResponse,
};
use crate::modules::attendance::service::AttendanceService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, query_params};

#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendanceDto,
    responses(
        (status = 201, description = "Attendance recorded; existing records reported as skipped", body = MarkAttendanceResponse),
        (status = 400, description = "Future date or student not enrolled", body = ErrorResponse),
        (status = 403, description = "Not the course instructor", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn mark_attendance(
    State(state): State<AppState>,
    RequireFacultyOrAdmin(auth_user): RequireFacultyOrAdmin,
    ValidatedJson(dto): ValidatedJson<MarkAttendanceDto>,
) -> Result<(StatusCode, Json<MarkAttendanceResponse>), AppError> {
    let response = AttendanceService::mark(&state.db, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/course/{course_id}",
    params(("course_id" = CourseId, Path, description = "Course ID"), AttendanceFilterParams),
    responses(
        (status = 200, description = "Attendance for the course", body = Vec<AttendanceWithStudent>),
        (status = 403, description = "Not the course instructor", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course_attendance(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<CourseId>,
    filters: Result<Query<AttendanceFilterParams>, QueryRejection>,
) -> Result<Json<Vec<AttendanceWithStudent>>, AppError> {
    let filters = query_params(filters)?;
    Ok(Json(
        AttendanceService::list_for_course(&state.db, &auth_user, course_id, filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/attendance/my",
    responses(
        (status = 200, description = "Own records and per-course summary", body = MyAttendanceResponse),
        (status = 403, description = "Student access required", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_attendance(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
) -> Result<Json<MyAttendanceResponse>, AppError> {
    Ok(Json(
        AttendanceService::list_for_student(&state.db, student.user_id).await?,
    ))
}
