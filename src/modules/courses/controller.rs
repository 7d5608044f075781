use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse, PaginationParams};
use campusdesk_models::CourseId;

use crate::middleware::auth::{AuthUser, RequireAdmin, RequireFacultyOrAdmin, RequireStudent};
use crate::modules::courses::model::{
    Course, CourseDetail, CourseFilterParams, CreateCourseDto, EnrolledStudent,
    EnrollmentResponse, PaginatedCoursesResponse, UpdateCourseDto,
};
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, query_params};

/// Faculty-created courses wait for admin approval; admin-created ones are active at once.
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid course code or missing instructor", body = ErrorResponse),
        (status = 404, description = "Instructor not found", body = ErrorResponse),
        (status = 409, description = "Course code already exists", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    RequireFacultyOrAdmin(auth_user): RequireFacultyOrAdmin,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::create(&state.db, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Approved courses", body = PaginatedCoursesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_courses(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    filters: Result<Query<CourseFilterParams>, QueryRejection>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedCoursesResponse>, AppError> {
    let filters = query_params(filters)?;
    let pagination = query_params(pagination)?;
    let courses = CourseService::list_approved(&state.db, filters, pagination).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/pending",
    responses(
        (status = 200, description = "Courses awaiting approval", body = Vec<CourseDetail>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_pending_courses(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<CourseDetail>>, AppError> {
    Ok(Json(CourseService::list_pending(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/courses/my",
    responses(
        (status = 200, description = "Taught courses (faculty), enrolled courses (student) or all (admin)", body = Vec<CourseDetail>)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<CourseDetail>>, AppError> {
    Ok(Json(CourseService::my_courses(&state.db, &auth_user).await?))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course details", body = CourseDetail),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<CourseId>,
) -> Result<Json<CourseDetail>, AppError> {
    Ok(Json(CourseService::get(&state.db, &auth_user, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = CourseId, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the instructor", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Course code already exists", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(CourseService::update(&state.db, &auth_user, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Not the instructor", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<CourseId>,
) -> Result<StatusCode, AppError> {
    CourseService::delete(&state.db, &auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/approve",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course approved", body = Course),
        (status = 400, description = "Course is not awaiting approval", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn approve_course(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CourseId>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(CourseService::approve(&state.db, admin.user_id, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/reject",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course rejected", body = Course),
        (status = 400, description = "Course is not awaiting approval", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reject_course(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CourseId>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(CourseService::reject(&state.db, admin.user_id, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrolled", body = EnrollmentResponse),
        (status = 400, description = "Already enrolled or course not approved", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn enroll(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    Path(id): Path<CourseId>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    Ok(Json(CourseService::enroll(&state.db, student.user_id, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/enroll",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Unenrolled"),
        (status = 404, description = "Course not found or not enrolled", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn unenroll(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    Path(id): Path<CourseId>,
) -> Result<StatusCode, AppError> {
    CourseService::unenroll(&state.db, student.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/students",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrolled students", body = Vec<EnrolledStudent>),
        (status = 403, description = "Not the instructor", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_enrolled_students(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<CourseId>,
) -> Result<Json<Vec<EnrolledStudent>>, AppError> {
    Ok(Json(
        CourseService::enrolled_students(&state.db, &auth_user, id).await?,
    ))
}
