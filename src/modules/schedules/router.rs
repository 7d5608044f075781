use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{
    create_schedule, delete_schedule, get_my_schedule, get_schedules, update_schedule,
};

pub fn init_schedules_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_schedules).post(create_schedule))
        .route("/my", get(get_my_schedule))
        .route("/{id}", put(update_schedule).delete(delete_schedule))
}
