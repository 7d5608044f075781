use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{create_notice, delete_notice, get_notices};

pub fn init_notices_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notices).post(create_notice))
        .route("/{id}", delete(delete_notice))
}
