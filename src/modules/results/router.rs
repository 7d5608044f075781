use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_exam_results, get_my_results, get_result};

pub fn init_results_router() -> Router<AppState> {
    Router::new()
        .route("/my", get(get_my_results))
        .route("/exam/{exam_id}", get(get_exam_results))
        .route("/{id}", get(get_result))
}
