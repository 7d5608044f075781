use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, middleware, routing::get};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::activities::init_activities_router;
use crate::modules::attendance::init_attendance_router;
use crate::modules::auth::init_auth_router;
use crate::modules::courses::init_courses_router;
use crate::modules::departments::init_departments_router;
use crate::modules::documents::init_documents_router;
use crate::modules::exams::init_exams_router;
use crate::modules::fees::init_fees_router;
use crate::modules::leaves::init_leaves_router;
use crate::modules::notices::init_notices_router;
use crate::modules::notifications::init_notifications_router;
use crate::modules::results::init_results_router;
use crate::modules::schedules::init_schedules_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "Health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", init_auth_router())
        .nest("/users", init_users_router())
        .nest("/departments", init_departments_router())
        .nest("/courses", init_courses_router())
        .nest("/attendance", init_attendance_router())
        .nest("/exams", init_exams_router())
        .nest("/result", init_results_router())
        .nest("/leave", init_leaves_router())
        .nest("/notices", init_notices_router())
        .nest("/notifications", init_notifications_router())
        .nest("/activity", init_activities_router(state.clone()))
        .nest("/fees", init_fees_router())
        .nest("/schedules", init_schedules_router())
        .nest(
            "/documents",
            init_documents_router(state.storage_config.max_upload_bytes),
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest_service("/files", ServeDir::new(&state.storage_config.upload_dir))
        .nest("/api", api)
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
