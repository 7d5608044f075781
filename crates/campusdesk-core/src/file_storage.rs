//! Storage backends for uploaded course documents.
//!
//! Handlers only see the [`FileStorage`] trait; the server wires in
//! [`LocalFileStorage`], which writes under a directory that the router
//! serves at `/files`.
//!
//! ```ignore
//! let storage = LocalFileStorage::new(PathBuf::from("./uploads"), "http://localhost:3000/files".into());
//! let key = storage.save("documents/3f2a/notes.pdf", &bytes).await?;
//! let url = storage.get_url(&key)?;
//! storage.delete(&key).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// MIME types accepted for course documents.
pub const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/zip",
    "text/plain",
    "image/png",
    "image/jpeg",
];

pub trait FileStorage: Send + Sync {
    /// Stores `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Removes the file. A missing file is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    fn get_url(&self, key: &str) -> Result<String, StorageError>;

    fn max_file_size(&self) -> usize;

    /// Checks size and MIME type before anything touches the backend.
    fn check_upload(&self, content_type: &str, size: usize) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile);
        }
        if size > self.max_file_size() {
            return Err(StorageError::InvalidFileSize {
                max_bytes: self.max_file_size(),
            });
        }
        if !DOCUMENT_MIME_TYPES.contains(&content_type) {
            return Err(StorageError::InvalidMimeType {
                received: content_type.to_string(),
                allowed: DOCUMENT_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum StorageError {
    InvalidFileSize { max_bytes: usize },
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },
    EmptyFile,
    IoError(std::io::Error),
    InvalidKey(String),
}

impl StorageError {
    /// Whether the client sent something unacceptable, as opposed to a backend failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::IoError(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFileSize { max_bytes } => {
                write!(f, "File exceeds maximum size of {} bytes", max_bytes)
            }
            Self::InvalidMimeType { received, allowed } => write!(
                f,
                "File type '{}' not allowed. Allowed types: {}",
                received,
                allowed.join(", ")
            ),
            Self::EmptyFile => write!(f, "Uploaded file is empty"),
            Self::IoError(e) => write!(f, "Storage I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// Reduces a client-supplied file name to characters safe for a storage key.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self::with_max_size(base_dir, base_url, 10 * 1024 * 1024)
    }

    pub fn with_max_size(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with a separator".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }

    fn max_file_size(&self) -> usize {
        self.max_file_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: PathBuf) -> LocalFileStorage {
        LocalFileStorage::with_max_size(dir, "http://localhost:3000/files/".to_string(), 16)
    }

    #[test]
    fn keys_reject_traversal() {
        assert!(LocalFileStorage::validate_key("documents/abc/notes.pdf").is_ok());
        assert!(LocalFileStorage::validate_key("../../etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("documents/a b.pdf").is_err());
        assert!(LocalFileStorage::validate_key("").is_err());
    }

    #[test]
    fn url_joins_without_double_slash() {
        let s = storage(PathBuf::from("./uploads"));
        assert_eq!(
            s.get_url("documents/x/notes.pdf").unwrap(),
            "http://localhost:3000/files/documents/x/notes.pdf"
        );
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("Week 1 Notes.pdf"), "Week_1_Notes.pdf");
        assert_eq!(sanitize_file_name("../../secret.txt"), "secret.txt");
        assert_eq!(sanitize_file_name("C:\\tmp\\a.doc"), "a.doc");
        assert_eq!(sanitize_file_name("..."), "file");
    }

    #[test]
    fn upload_checks() {
        let s = storage(PathBuf::from("./uploads"));
        assert!(s.check_upload("application/pdf", 10).is_ok());
        assert!(matches!(
            s.check_upload("application/pdf", 17),
            Err(StorageError::InvalidFileSize { max_bytes: 16 })
        ));
        assert!(matches!(
            s.check_upload("application/x-msdownload", 10),
            Err(StorageError::InvalidMimeType { .. })
        ));
        assert!(matches!(
            s.check_upload("text/plain", 0),
            Err(StorageError::EmptyFile)
        ));
    }

    #[tokio::test]
    async fn save_and_delete_roundtrip_on_disk() {
        let dir = std::env::temp_dir().join(format!("campusdesk-storage-{}", uuid::Uuid::new_v4()));
        let s = storage(dir.clone());

        let key = s.save("documents/t/notes.txt", b"hello").await.unwrap();
        assert_eq!(tokio::fs::read(dir.join(&key)).await.unwrap(), b"hello");

        s.delete(&key).await.unwrap();
        assert!(!dir.join(&key).exists());
        // deleting twice is fine
        s.delete(&key).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
