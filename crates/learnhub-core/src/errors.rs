//! Application error type and its HTTP rendering.
//!
//! Every handler and service returns `Result<T, AppError>`. The status code
//! decides both the HTTP response and how much of the underlying error is
//! exposed: client errors echo their message, server errors are logged and
//! replaced with a generic message.

use anyhow::Error;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Message returned to clients for any 5xx response.
pub const GENERIC_SERVER_ERROR: &str = "Something went wrong, please try again later";

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
    /// Seconds a client should wait before retrying (429 only).
    pub retry_after: Option<u64>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
            retry_after: None,
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message.into()))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            anyhow::anyhow!(message.into()),
        )
    }

    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            error: anyhow::anyhow!("Too many requests, please try again later"),
            retry_after: Some(retry_after_secs),
        }
    }

    /// Collapses `validator` errors into a single 400 with one message per
    /// failing rule, falling back to "<field> is invalid".
    pub fn validation(errors: &ValidationErrors) -> Self {
        Self::bad_request(anyhow::anyhow!("{}", format_validation_errors(errors)))
    }

    /// Message exposed to clients.
    pub fn public_message(&self) -> String {
        if self.status.is_server_error() {
            GENERIC_SERVER_ERROR.to_string()
        } else {
            self.error.to_string()
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, "", &mut messages);
    messages.join(", ")
}

/// Walks nested structs and lists so `qualification.degree` or
/// `questions[1].question` failures surface next to top-level ones.
fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path))
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status.as_u16(), error = ?self.error, "Request failed");
        }

        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
        }));

        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Inner {
        #[validate(length(max = 4, message = "Degree is too long"))]
        degree: String,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(nested)]
        qualification: Inner,
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
        name: String,
        #[validate(range(min = 0))]
        count: i64,
    }

    #[test]
    fn test_client_errors_expose_message() {
        let err = AppError::bad_request(anyhow::anyhow!("Email already exists"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Email already exists");
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::internal(anyhow::anyhow!("connection refused on 10.0.0.3"));
        assert_eq!(err.public_message(), GENERIC_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_and_forbidden_status() {
        assert_eq!(
            AppError::unauthorized("Invalid credentials").status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("Access denied").status,
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_validation_message_uses_custom_and_default_text() {
        let sample = Sample {
            name: "ab".to_string(),
            count: -1,
        };
        let errors = sample.validate().unwrap_err();
        let err = AppError::validation(&errors);

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "count is invalid, Name must be at least 3 characters"
        );
    }

    #[test]
    fn test_validation_message_includes_nested_fields() {
        let outer = Outer {
            qualification: Inner {
                degree: "Bachelor of Science".to_string(),
            },
        };
        let errors = outer.validate().unwrap_err();
        assert_eq!(format_validation_errors(&errors), "Degree is too long");
    }

    #[test]
    fn test_too_many_requests_sets_retry_after() {
        let response = AppError::too_many_requests(42).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
