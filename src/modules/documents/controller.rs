use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::{CourseId, DocumentId};

use crate::middleware::auth::{AuthUser, RequireFacultyOrAdmin};
use crate::modules::documents::model::{Document, DocumentType, UploadDocumentForm};
use crate::modules::documents::service::{DocumentService, DocumentUpload};
use crate::state::AppState;

fn bad_form(message: impl std::fmt::Display) -> AppError {
    AppError::bad_request(anyhow::anyhow!("Invalid upload: {}", message))
}

/// Keeps the multipart layer's status, so an oversized body stays a 413.
fn multipart_error(e: MultipartError) -> AppError {
    AppError::new(e.status(), anyhow::anyhow!("Invalid upload: {}", e.body_text()))
}

async fn read_upload(mut multipart: Multipart) -> Result<DocumentUpload, AppError> {
    let mut course_id = None;
    let mut title = None;
    let mut doc_type = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "course_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                course_id = Some(
                    text.trim()
                        .parse::<CourseId>()
                        .map_err(|_| bad_form("course_id must be a UUID"))?,
                );
            }
            "title" => title = Some(field.text().await.map_err(multipart_error)?),
            "type" => {
                let text = field.text().await.map_err(multipart_error)?;
                doc_type = Some(text.parse::<DocumentType>().map_err(bad_form)?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("file").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| bad_form("title is required"))?;
    let (file_name, content_type, bytes) = file.ok_or_else(|| bad_form("file is required"))?;

    Ok(DocumentUpload {
        course_id: course_id.ok_or_else(|| bad_form("course_id is required"))?,
        title,
        doc_type: doc_type.ok_or_else(|| bad_form("type is required"))?,
        file_name,
        content_type,
        bytes,
    })
}

#[utoipa::path(
    post,
    path = "/api/documents",
    request_body(content = UploadDocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document uploaded", body = Document),
        (status = 400, description = "Missing field or unsupported file type", body = ErrorResponse),
        (status = 403, description = "Not the course instructor", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, multipart))]
pub async fn upload_document(
    State(state): State<AppState>,
    RequireFacultyOrAdmin(auth_user): RequireFacultyOrAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let upload = read_upload(multipart).await?;
    let document =
        DocumentService::upload(&state.db, state.file_storage.as_ref(), &auth_user, upload)
            .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    get,
    path = "/api/documents/course/{course_id}",
    params(("course_id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course documents", body = Vec<Document>),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course_documents(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(
        DocumentService::list_for_course(&state.db, course_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = DocumentId, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document and stored file removed"),
        (status = 403, description = "Not the uploader", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DocumentId>,
) -> Result<StatusCode, AppError> {
    DocumentService::delete(&state.db, state.file_storage.as_ref(), &auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
