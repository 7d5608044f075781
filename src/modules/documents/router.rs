use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{delete_document, get_course_documents, upload_document};

/// Room for the multipart framing and text fields around the file itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn init_documents_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(upload_document)
                .layer(DefaultBodyLimit::max(max_upload_bytes + FORM_OVERHEAD_BYTES)),
        )
        .route("/course/{course_id}", get(get_course_documents))
        .route("/{id}", delete(delete_document))
}
