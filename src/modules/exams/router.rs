use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_exam, delete_exam, get_course_exams, get_exam, submit_exam};

pub fn init_exams_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam))
        .route("/course/{course_id}", get(get_course_exams))
        .route("/{id}", get(get_exam).delete(delete_exam))
        .route("/{id}/submit", post(submit_exam))
}
