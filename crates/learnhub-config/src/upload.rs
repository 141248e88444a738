//! Upload storage configuration.
//!
//! - `UPLOAD_DIR`: directory files are written to (default: `uploads`)
//! - `UPLOAD_MAX_FILE_SIZE`: per-file limit in bytes (default: 5 MiB)
//!
//! Files are served read-only under [`PUBLIC_PREFIX`].

use std::path::PathBuf;

pub const PUBLIC_PREFIX: &str = "/uploads";
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// One sub-directory per entity that accepts files.
pub const UPLOAD_SUBDIRS: &[&str] = &[
    "students",
    "teachers",
    "staff",
    "courses",
    "assignments",
    "quizzes",
];

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub root_dir: PathBuf,
    pub public_prefix: String,
    pub max_file_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("uploads"),
            public_prefix: PUBLIC_PREFIX.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root_dir: std::env::var("UPLOAD_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.root_dir),
            public_prefix: defaults.public_prefix,
            max_file_size: std::env::var("UPLOAD_MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_file_size),
        }
    }

    /// Largest request body accepted: a handful of files plus form fields.
    pub fn body_limit(&self) -> usize {
        self.max_file_size * 6 + 1024 * 1024
    }

    /// Creates the upload root and its per-entity sub-directories.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        for sub in UPLOAD_SUBDIRS {
            tokio::fs::create_dir_all(self.root_dir.join(sub)).await?;
        }
        tracing::debug!(root = %self.root_dir.display(), "Upload directories ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UploadConfig::default();
        assert_eq!(config.root_dir, PathBuf::from("uploads"));
        assert_eq!(config.public_prefix, "/uploads");
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_ensure_dirs_creates_entity_folders() {
        let root = std::env::temp_dir().join(format!("learnhub-upload-{}", std::process::id()));
        let config = UploadConfig {
            root_dir: root.clone(),
            ..UploadConfig::default()
        };

        config.ensure_dirs().await.unwrap();
        for sub in UPLOAD_SUBDIRS {
            assert!(root.join(sub).is_dir());
        }

        let _ = std::fs::remove_dir_all(root);
    }
}
