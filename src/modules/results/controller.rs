use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::{ExamId, ResultId};

use crate::middleware::auth::{AuthUser, RequireStudent};
use crate::modules::results::model::{ExamResult, ResultWithStudent};
use crate::modules::results::service::ResultService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/result/my",
    responses(
        (status = 200, description = "Caller's graded submissions", body = Vec<ExamResult>),
        (status = 403, description = "Student access required", body = ErrorResponse)
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_results(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
) -> Result<Json<Vec<ExamResult>>, AppError> {
    Ok(Json(
        ResultService::list_for_student(&state.db, student.user_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/result/exam/{exam_id}",
    params(("exam_id" = ExamId, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Submissions with student details", body = Vec<ResultWithStudent>),
        (status = 403, description = "Not the course instructor", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_exam_results(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(exam_id): Path<ExamId>,
) -> Result<Json<Vec<ResultWithStudent>>, AppError> {
    Ok(Json(
        ResultService::list_for_exam(&state.db, &auth_user, exam_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/result/{id}",
    params(("id" = ResultId, Path, description = "Result ID")),
    responses(
        (status = 200, description = "Result with answer breakdown", body = ExamResult),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "Result not found", body = ErrorResponse)
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_result(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ResultId>,
) -> Result<Json<ExamResult>, AppError> {
    Ok(Json(ResultService::get(&state.db, &auth_user, id).await?))
}
