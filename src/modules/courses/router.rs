use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    approve_course, create_course, delete_course, enroll, get_course, get_courses,
    get_enrolled_students, get_my_courses, get_pending_courses, reject_course, unenroll,
    update_course,
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_courses).post(create_course))
        .route("/pending", get(get_pending_courses))
        .route("/my", get(get_my_courses))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{id}/approve", put(approve_course))
        .route("/{id}/reject", put(reject_course))
        .route("/{id}/enroll", post(enroll).delete(unenroll))
        .route("/{id}/students", get(get_enrolled_students))
}
