//! File storage for uploaded documents and images.
//!
//! Handlers never touch the filesystem directly: they hand bytes to a
//! [`FileStorage`] and persist the returned public path (for example
//! `/uploads/teachers/3f2c...-cv.pdf`) on the record.
//!
//! ```ignore
//! use learnhub_core::file_storage::{FileStorage, LocalFileStorage};
//!
//! let storage = LocalFileStorage::new("./uploads".into(), "/uploads".to_string());
//! let key = storage.save("courses/banner.png", &bytes).await?;
//! let url = storage.get_url(&key)?;
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;
use tokio::fs;

pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Abstract storage backend, object safe so it can live in `AppState` as
/// `Arc<dyn FileStorage>`.
pub trait FileStorage: Send + Sync {
    /// Save file content under `key` and return the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Delete a file by key. Missing files are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Public URL path for a stored key.
    fn get_url(&self, key: &str) -> Result<String, StorageError>;

    /// Reverse of [`FileStorage::get_url`]; `None` when the URL is not ours.
    fn key_from_url(&self, url: &str) -> Option<String>;

    fn max_file_size(&self) -> usize;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File exceeds maximum size of {max_bytes} bytes")]
    InvalidFileSize { max_bytes: usize },

    #[error("File type '{received}' not allowed. Allowed types: {}", .allowed.join(", "))]
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Checks a declared content type against an allow-list. Entries ending in
/// `/*` match a whole family (`image/*`).
pub fn check_mime_type(received: &str, allowed: &[&str]) -> Result<(), StorageError> {
    let received = received.to_ascii_lowercase();
    let ok = allowed.iter().any(|pattern| match pattern.strip_suffix("/*") {
        Some(family) => received
            .split('/')
            .next()
            .is_some_and(|head| head == family),
        None => received == *pattern,
    });

    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidMimeType {
            received,
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Reduces an uploaded file name to characters accepted in storage keys.
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
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Local filesystem storage served by the static file layer.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    /// Public URL prefix (e.g. "/uploads")
    base_url: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self::with_max_size(base_dir, base_url, DEFAULT_MAX_FILE_SIZE)
    }

    pub fn with_max_size(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
        }
    }

    /// Rejects empty keys, absolute paths and traversal.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\')
        {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with '/'".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
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

            tracing::debug!(key = %key, bytes = content.len(), "Stored upload");
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

    fn key_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.base_url.trim_end_matches('/'));
        let key = url.strip_prefix(&prefix)?;
        Self::validate_key(key).ok().map(|_| key.to_string())
    }

    fn max_file_size(&self) -> usize {
        self.max_file_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: PathBuf) -> LocalFileStorage {
        LocalFileStorage::with_max_size(dir, "/uploads".to_string(), 16)
    }

    #[test]
    fn test_validate_key_accepts_valid_keys() {
        assert!(LocalFileStorage::validate_key("teachers/cv.pdf").is_ok());
        assert!(LocalFileStorage::validate_key("students/abc-123_photo.jpg").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal_and_absolute() {
        assert!(LocalFileStorage::validate_key("../../etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("\\windows\\system32").is_err());
        assert!(LocalFileStorage::validate_key("").is_err());
    }

    #[test]
    fn test_url_round_trip() {
        let s = LocalFileStorage::new(PathBuf::from("./uploads"), "/uploads/".to_string());
        let url = s.get_url("courses/banner.png").unwrap();
        assert_eq!(url, "/uploads/courses/banner.png");
        assert_eq!(s.key_from_url(&url).as_deref(), Some("courses/banner.png"));
        assert_eq!(s.key_from_url("https://cdn.example.com/x.png"), None);
    }

    #[test]
    fn test_check_mime_type() {
        assert!(check_mime_type("image/png", &["image/*"]).is_ok());
        assert!(check_mime_type("application/pdf", &["image/*", "application/pdf"]).is_ok());
        assert!(check_mime_type("IMAGE/JPEG", &["image/jpeg"]).is_ok());

        let err = check_mime_type("text/html", &["image/*", "application/pdf"]).unwrap_err();
        assert!(err.to_string().contains("text/html"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my cv (final).pdf"), "my_cv__final_.pdf");
        assert_eq!(sanitize_file_name("C:\\docs\\photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name("../.."), "file");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = std::env::temp_dir().join(format!("learnhub-storage-{}", uuid::Uuid::new_v4()));
        let s = storage(dir.clone());

        let key = s.save("quizzes/q.txt", b"hello").await.unwrap();
        assert_eq!(key, "quizzes/q.txt");
        assert!(dir.join("quizzes/q.txt").exists());

        s.delete(&key).await.unwrap();
        assert!(!dir.join("quizzes/q.txt").exists());
        // Deleting again is a no-op.
        s.delete(&key).await.unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_save_rejects_oversized() {
        let dir = std::env::temp_dir().join(format!("learnhub-storage-{}", uuid::Uuid::new_v4()));
        let s = storage(dir.clone());
        let err = s.save("big.bin", &[0u8; 32]).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidFileSize { max_bytes: 16 }));
        let _ = std::fs::remove_dir_all(dir);
    }
}
