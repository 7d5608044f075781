use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::results::ExamResult;
use campusdesk_models::{CourseId, ExamId};

use crate::middleware::auth::{AuthUser, RequireFacultyOrAdmin, RequireStudent};
use crate::modules::exams::model::{CreateExamDto, ExamDetail, SubmitExamDto};
use crate::modules::exams::service::ExamService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/exams",
    request_body = CreateExamDto,
    responses(
        (status = 201, description = "Exam created", body = ExamDetail),
        (status = 400, description = "Invalid questions or expiry in the past", body = ErrorResponse),
        (status = 403, description = "Not the course instructor", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_exam(
    State(state): State<AppState>,
    RequireFacultyOrAdmin(auth_user): RequireFacultyOrAdmin,
    ValidatedJson(dto): ValidatedJson<CreateExamDto>,
) -> Result<(StatusCode, Json<ExamDetail>), AppError> {
    let exam = ExamService::create(&state.db, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

#[utoipa::path(
    get,
    path = "/api/exams/course/{course_id}",
    params(("course_id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Exams for the course", body = Vec<ExamDetail>),
        (status = 403, description = "Student not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course_exams(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Vec<ExamDetail>>, AppError> {
    Ok(Json(
        ExamService::list_for_course(&state.db, &auth_user, course_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/exams/{id}",
    params(("id" = ExamId, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Exam with questions", body = ExamDetail),
        (status = 403, description = "Student not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_exam(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ExamId>,
) -> Result<Json<ExamDetail>, AppError> {
    Ok(Json(ExamService::get(&state.db, &auth_user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/exams/{id}/submit",
    params(("id" = ExamId, Path, description = "Exam ID")),
    request_body = SubmitExamDto,
    responses(
        (status = 201, description = "Submission graded", body = ExamResult),
        (status = 400, description = "Exam expired or unknown question", body = ErrorResponse),
        (status = 403, description = "Not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse),
        (status = 409, description = "Exam already submitted", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn submit_exam(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    Path(id): Path<ExamId>,
    ValidatedJson(dto): ValidatedJson<SubmitExamDto>,
) -> Result<(StatusCode, Json<ExamResult>), AppError> {
    let result = ExamService::submit(&state.db, student.user_id, id, dto).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    delete,
    path = "/api/exams/{id}",
    params(("id" = ExamId, Path, description = "Exam ID")),
    responses(
        (status = 204, description = "Exam deleted"),
        (status = 403, description = "Not the instructor", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_exam(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ExamId>,
) -> Result<StatusCode, AppError> {
    ExamService::delete(&state.db, &auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
