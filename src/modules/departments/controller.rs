use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::DepartmentId;

use crate::middleware::auth::RequireAdmin;
use crate::modules::departments::model::{
    CreateDepartmentDto, Department, UpdateDepartmentDto,
};
use crate::modules::departments::service::DepartmentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentDto,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 409, description = "Name or code already in use", body = ErrorResponse)
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_department(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateDepartmentDto>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    let department = DepartmentService::create(&state.db, admin.user_id, dto).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// Public: the registration form lists departments before anyone signs in.
#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "All departments", body = Vec<Department>)),
    tag = "Departments"
)]
#[instrument(skip(state))]
pub async fn get_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Department>>, AppError> {
    Ok(Json(DepartmentService::list(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = DepartmentId, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department", body = Department),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    tag = "Departments"
)]
#[instrument(skip(state))]
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<DepartmentId>,
) -> Result<Json<Department>, AppError> {
    Ok(Json(DepartmentService::get(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(("id" = DepartmentId, Path, description = "Department ID")),
    request_body = UpdateDepartmentDto,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 404, description = "Department not found", body = ErrorResponse),
        (status = 409, description = "Name or code already in use", body = ErrorResponse)
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_department(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DepartmentId>,
    ValidatedJson(dto): ValidatedJson<UpdateDepartmentDto>,
) -> Result<Json<Department>, AppError> {
    Ok(Json(DepartmentService::update(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = DepartmentId, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_department(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DepartmentId>,
) -> Result<StatusCode, AppError> {
    DepartmentService::delete(&state.db, admin.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
