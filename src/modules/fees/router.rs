use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    confirm_payment, create_fee_structure, create_payment_intent, delete_fee_structure,
    get_fee_structures, get_my_fee, get_my_payments, get_payments, record_offline_payment,
    update_fee_structure,
};

pub fn init_fees_router() -> Router<AppState> {
    Router::new()
        .route(
            "/structures",
            get(get_fee_structures).post(create_fee_structure),
        )
        .route(
            "/structures/{id}",
            put(update_fee_structure).delete(delete_fee_structure),
        )
        .route("/my", get(get_my_fee))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/confirm", post(confirm_payment))
        .route("/offline", post(record_offline_payment))
        .route("/payments", get(get_payments))
        .route("/payments/my", get(get_my_payments))
}
