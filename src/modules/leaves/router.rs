use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{
    approve_leave, cancel_leave, get_leaves, get_my_leaves, reject_leave, submit_leave,
};

pub fn init_leaves_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_leaves).post(submit_leave))
        .route("/my", get(get_my_leaves))
        .route("/{id}/approve", put(approve_leave))
        .route("/{id}/reject", put(reject_leave))
        .route("/{id}/cancel", put(cancel_leave))
}
