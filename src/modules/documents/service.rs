use axum::http::StatusCode;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use campusdesk_core::AppError;
use campusdesk_core::file_storage::{FileStorage, StorageError, sanitize_file_name};
use campusdesk_models::{CourseId, DocumentId};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::ensure_owner_or_admin;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::courses::CourseService;
use crate::modules::documents::model::{Document, DocumentType};

const DOCUMENT_COLUMNS: &str = "id, course_id, title, doc_type, storage_key, file_url, \
     original_name, mime_type, size_bytes, uploaded_by, created_at";

/// A parsed multipart upload.
#[derive(Debug)]
pub struct DocumentUpload {
    pub course_id: CourseId,
    pub title: String,
    pub doc_type: DocumentType,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn storage_error(e: StorageError) -> AppError {
    if e.is_client_error() {
        let status = match e {
            StorageError::InvalidFileSize { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        AppError::new(status, e)
    } else {
        AppError::internal(e)
    }
}

/// `documents/<course>/<random>-<name>`, unique per upload.
pub fn storage_key(course_id: CourseId, file_name: &str) -> String {
    format!(
        "documents/{}/{}-{}",
        course_id,
        Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    )
}

pub struct DocumentService;

impl DocumentService {
    #[instrument(skip(db, storage, upload), fields(course.id = %upload.course_id, size = upload.bytes.len()))]
    pub async fn upload(
        db: &PgPool,
        storage: &dyn FileStorage,
        auth_user: &AuthUser,
        upload: DocumentUpload,
    ) -> Result<Document, AppError> {
        let mut conn = db.acquire().await?;
        let course = CourseService::find(&mut conn, upload.course_id).await?;
        CourseService::ensure_can_manage(auth_user, &course)?;
        drop(conn);

        storage
            .check_upload(&upload.content_type, upload.bytes.len())
            .map_err(storage_error)?;

        let key = storage_key(course.id, &upload.file_name);
        storage
            .save(&key, &upload.bytes)
            .await
            .map_err(storage_error)?;
        let file_url = storage.get_url(&key).map_err(storage_error)?;

        let stored = Self::record(db, auth_user, &course.code, &upload, &key, &file_url).await;
        match stored {
            Ok(document) => {
                info!(document.id = %document.id, %key, "document uploaded");
                Ok(document)
            }
            Err(e) => {
                if let Err(cleanup) = storage.delete(&key).await {
                    warn!(%key, error = %cleanup, "failed to remove orphaned upload");
                }
                Err(e)
            }
        }
    }

    async fn record(
        db: &PgPool,
        auth_user: &AuthUser,
        course_code: &str,
        upload: &DocumentUpload,
        key: &str,
        file_url: &str,
    ) -> Result<Document, AppError> {
        let mut tx = db.begin().await?;

        let document = sqlx::query_as::<_, Document>(&format!(
            "INSERT INTO documents
                (course_id, title, doc_type, storage_key, file_url, original_name, mime_type,
                 size_bytes, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(upload.course_id)
        .bind(upload.title.trim())
        .bind(upload.doc_type)
        .bind(key)
        .bind(file_url)
        .bind(&upload.file_name)
        .bind(&upload.content_type)
        .bind(upload.bytes.len() as i64)
        .bind(auth_user.user_id)
        .fetch_one(&mut *tx)
        .await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Document,
            format!("Uploaded '{}' to {}", document.title, course_code),
        )
        .await?;

        tx.commit().await?;
        Ok(document)
    }

    #[instrument(skip(db))]
    pub async fn list_for_course(
        db: &PgPool,
        course_id: CourseId,
    ) -> Result<Vec<Document>, AppError> {
        let mut conn = db.acquire().await?;
        CourseService::find(&mut conn, course_id).await?;

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE course_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(course_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(documents)
    }

    /// Removes the row first; a file left behind by a failed delete is only logged.
    #[instrument(skip(db, storage))]
    pub async fn delete(
        db: &PgPool,
        storage: &dyn FileStorage,
        auth_user: &AuthUser,
        id: DocumentId,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Document not found")))?;

        ensure_owner_or_admin(auth_user, document.uploaded_by, "uploader")?;

        sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Document,
            format!("Deleted document '{}'", document.title),
        )
        .await?;

        tx.commit().await?;

        if let Err(e) = storage.delete(&document.storage_key).await {
            warn!(key = %document.storage_key, error = %e, "stored file could not be removed");
        }
        Ok(())
    }
}
