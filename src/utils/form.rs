//! Request bodies for create/update routes that accept JSON or
//! `multipart/form-data`.
//!
//! Both content types end up as one JSON object that is run through
//! [`learnhub_core::normalize`] with the entity's field table, deserialized,
//! validated, and handed to the handler together with any uploaded files.
//! Files are only checked here; they are written by [`store_uploads`] once
//! the service is ready to persist the record.

use anyhow::anyhow;
use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::header,
};
use learnhub_core::file_storage::{check_mime_type, sanitize_file_name};
use learnhub_core::normalize::collect_fields;
use learnhub_core::{AppError, FieldTable, FileStorage, normalize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::state::AppState;
use crate::validator::json_rejection;

pub const IMAGE_TYPES: &[&str] = &["image/*"];
pub const IMAGE_PDF_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "application/pdf"];
pub const DOCUMENT_TYPES: &[&str] = &[
    "image/*",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// A form field that may carry a file.
#[derive(Debug, Clone, Copy)]
pub struct FileSlot {
    pub name: &'static str,
    pub allowed_types: &'static [&'static str],
}

impl FileSlot {
    pub const fn new(name: &'static str, allowed_types: &'static [&'static str]) -> Self {
        Self {
            name,
            allowed_types,
        }
    }
}

/// Where an entity's uploads go and which slots it accepts.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub dir: &'static str,
    pub slots: &'static [FileSlot],
}

impl UploadPolicy {
    fn slot(&self, name: &str) -> Option<&FileSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }
}

/// Ties a DTO to the field table and upload policy of its entity.
pub trait FormSchema {
    const FIELDS: FieldTable;
    const UPLOADS: UploadPolicy;
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub slot: &'static str,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A file that has been written to storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub slot: &'static str,
    pub url: String,
}

#[derive(Debug)]
pub struct FormPayload<T> {
    pub data: T,
    pub files: Vec<UploadedFile>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::bad_request(anyhow!("Invalid form data: {}", err.body_text()))
}

async fn read_multipart(
    mut multipart: Multipart,
    policy: &UploadPolicy,
    max_file_size: usize,
) -> Result<(Map<String, Value>, Vec<UploadedFile>), AppError> {
    let mut pairs = Vec::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let text = field.text().await.map_err(multipart_error)?;
            pairs.push((name, text));
            continue;
        };

        let slot = policy
            .slot(&name)
            .ok_or_else(|| AppError::bad_request(anyhow!("Unexpected file field: {}", name)))?;

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        check_mime_type(&content_type, slot.allowed_types)
            .map_err(|e| AppError::bad_request(anyhow!("{}: {}", slot.name, e)))?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            continue;
        }
        if bytes.len() > max_file_size {
            return Err(AppError::bad_request(anyhow!(
                "File too large. Maximum size is {}MB",
                max_file_size / (1024 * 1024)
            )));
        }

        files.push(UploadedFile {
            slot: slot.name,
            file_name,
            content_type,
            bytes,
        });
    }

    Ok((collect_fields(pairs), files))
}

/// Normalizes, deserializes and validates a raw payload.
pub fn parse_payload<T>(table: &FieldTable, raw: Map<String, Value>) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let value = normalize(table, raw).map_err(AppError::bad_request)?;

    let data: T = serde_json::from_value(value)
        .map_err(|e| AppError::bad_request(anyhow!("Invalid request data: {}", e)))?;

    data.validate().map_err(|errors| AppError::validation(&errors))?;
    Ok(data)
}

impl<T> FromRequest<AppState> for FormPayload<T>
where
    T: DeserializeOwned + Validate + FormSchema + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (raw, files) = if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(anyhow!("{}", e.body_text())))?;
            read_multipart(multipart, &T::UPLOADS, state.upload_config.max_file_size).await?
        } else {
            let Json(raw) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(json_rejection)?;
            (raw, Vec::new())
        };

        let data = parse_payload(&T::FIELDS, raw)?;
        Ok(FormPayload { data, files })
    }
}

/// Writes uploads under the policy directory and returns their public URLs.
/// On failure, files already written are removed again.
pub async fn store_uploads(
    storage: &dyn FileStorage,
    policy: &UploadPolicy,
    files: &[UploadedFile],
) -> Result<Vec<StoredFile>, AppError> {
    let mut stored = Vec::with_capacity(files.len());

    for file in files {
        let key = format!(
            "{}/{}-{}",
            policy.dir,
            Uuid::new_v4().simple(),
            sanitize_file_name(&file.file_name)
        );

        let result = async {
            storage.save(&key, &file.bytes).await?;
            storage.get_url(&key)
        }
        .await;

        match result {
            Ok(url) => stored.push(StoredFile {
                slot: file.slot,
                url,
            }),
            Err(e) => {
                discard_uploads(storage, &stored).await;
                return Err(AppError::bad_request(anyhow!("{}", e)));
            }
        }
    }

    Ok(stored)
}

/// Best-effort removal of stored files, used when the database write fails.
pub async fn discard_uploads(storage: &dyn FileStorage, stored: &[StoredFile]) {
    for file in stored {
        if let Some(key) = storage.key_from_url(&file.url)
            && let Err(e) = storage.delete(&key).await
        {
            tracing::warn!(url = %file.url, error = %e, "Failed to remove orphaned upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_core::{FieldRule, LocalFileStorage};
    use serde::Deserialize;
    use serde_json::json;

    const TABLE: FieldTable = FieldTable::new(&[FieldRule::object("qualification")]);
    const BANNER_UPLOADS: UploadPolicy = UploadPolicy {
        dir: "courses",
        slots: &[FileSlot::new("courseImage", IMAGE_TYPES)],
    };

    #[derive(Debug, Deserialize, Validate)]
    struct Qualification {
        degree: Option<String>,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 2, message = "Name is too short"))]
        name: String,
        qualification: Option<Qualification>,
    }

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_parse_payload_rebuilds_nested_fields() {
        let payload: Payload = parse_payload(
            &TABLE,
            raw(json!({ "name": "Sara", "qualification[degree]": "BSCS" })),
        )
        .unwrap();
        assert_eq!(payload.name, "Sara");
        assert_eq!(
            payload.qualification.and_then(|q| q.degree).as_deref(),
            Some("BSCS")
        );
    }

    #[test]
    fn test_parse_payload_rejects_bad_json_string() {
        let err = parse_payload::<Payload>(
            &TABLE,
            raw(json!({ "name": "Sara", "qualification": "{not json" })),
        )
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "Invalid qualification format");
    }

    #[test]
    fn test_parse_payload_runs_validation() {
        let err = parse_payload::<Payload>(&TABLE, raw(json!({ "name": "S" }))).unwrap_err();
        assert_eq!(err.error.to_string(), "Name is too short");
    }

    #[tokio::test]
    async fn test_store_and_discard_uploads() {
        let dir = std::env::temp_dir().join(format!("learnhub-form-{}", Uuid::new_v4()));
        let storage = LocalFileStorage::new(dir.clone(), "/uploads".to_string());
        let files = vec![UploadedFile {
            slot: "courseImage",
            file_name: "My Banner.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"png"),
        }];

        let stored = store_uploads(&storage, &BANNER_UPLOADS, &files).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].url.starts_with("/uploads/courses/"));
        assert!(stored[0].url.ends_with("-My_Banner.png"));

        let key = storage.key_from_url(&stored[0].url).unwrap();
        assert!(dir.join(&key).exists());

        discard_uploads(&storage, &stored).await;
        assert!(!dir.join(&key).exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
