use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

use super::controller::{
    approve_faculty, change_password, delete_user, get_pending_faculty, get_profile,
    get_students, get_users, reject_faculty, update_account_status, update_profile,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users))
        .route("/pending-faculty", get(get_pending_faculty))
        .route("/students", get(get_students))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/change-password", post(change_password))
        .route("/{id}/approve", put(approve_faculty))
        .route("/{id}/reject", put(reject_faculty))
        .route("/{id}/status", put(update_account_status))
        .route("/{id}", delete(delete_user))
}
