use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{get_course_attendance, get_my_attendance, mark_attendance};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(mark_attendance))
        .route("/course/{course_id}", get(get_course_attendance))
        .route("/my", get(get_my_attendance))
}
