use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::ids::{CourseId, DocumentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Syllabus,
    Notes,
    Assignment,
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "syllabus" => Ok(Self::Syllabus),
            "notes" => Ok(Self::Notes),
            "assignment" => Ok(Self::Assignment),
            other => Err(format!(
                "Invalid document type '{}': expected syllabus, notes or assignment",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Document {
    pub id: DocumentId,
    pub course_id: CourseId,
    pub title: String,
    pub doc_type: DocumentType,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub file_url: String,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub uploaded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Multipart form accepted by the upload endpoint, for the API docs.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentForm {
    pub course_id: CourseId,
    pub title: String,
    /// `syllabus`, `notes` or `assignment`
    #[schema(rename = "type")]
    pub doc_type: DocumentType,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
