use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::state::AppState;

use super::controller::{
    delete_notification, get_my_notifications, get_sent_notifications, get_unread_count,
    mark_all_read, mark_read, send_notification,
};

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_my_notifications).post(send_notification))
        .route("/unread-count", get(get_unread_count))
        .route("/sent", get(get_sent_notifications))
        .route("/read-all", put(mark_all_read))
        .route("/{id}/read", put(mark_read))
        .route("/{id}", delete(delete_notification))
}
