use axum::{Router, middleware, routing::get};

use crate::middleware::role::require_admin;
use crate::state::AppState;

use super::controller::{get_activities, get_my_activities};

pub fn init_activities_router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/", get(get_activities))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/my", get(get_my_activities))
        .merge(admin_routes)
}
