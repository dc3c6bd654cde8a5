use std::fmt::Display;

use axum::{Json, http::StatusCode, response::IntoResponse};
use axum_valid::{ValidRejection, ValidationRejection};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::onboarding::InvalidTransition};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Operation requires a session state the visitor is not in.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Score missing or not an integer.
    #[error("invalid score: {0}")]
    InvalidScore(String),
    /// Uploaded file does not carry a whitelisted image extension.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Uploaded file exceeds the configured size limit.
    #[error("photo exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Configured maximum in bytes.
        limit: usize,
    },
    /// Player name is already registered.
    #[error("name `{0}` is already registered")]
    DuplicateName(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateName { name } => ServiceError::DuplicateName(name),
            StorageError::UnknownPlayer { id } => {
                ServiceError::NotFound(format!("player `{id}` not found"))
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Failed `Valid<_>` extraction: field validation or the inner extractor itself.
impl<E: Display> From<ValidRejection<E>> for AppError {
    fn from(rejection: ValidRejection<E>) -> Self {
        match rejection {
            ValidationRejection::Valid(errors) => errors.into(),
            ValidationRejection::Inner(inner) => AppError::BadRequest(inner.to_string()),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Upload is larger than allowed.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    /// Upload format is not accepted.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidScore(message) => {
                AppError::BadRequest(format!("invalid score: {message}"))
            }
            ServiceError::UnsupportedFormat(message) => AppError::UnsupportedMediaType(message),
            err @ ServiceError::PayloadTooLarge { .. } => {
                AppError::PayloadTooLarge(err.to_string())
            }
            err @ ServiceError::DuplicateName(_) => AppError::Conflict(err.to_string()),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

/// JSON body of every error response.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let cases = [
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidScore("x".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::UnsupportedFormat("x.exe".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (ServiceError::DuplicateName("bob".into()), StatusCode::CONFLICT),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Degraded, StatusCode::SERVICE_UNAVAILABLE),
            (
                ServiceError::PayloadTooLarge { limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn extractor_rejections_become_json_bad_requests() {
        use http_body_util::BodyExt;
        use validator::ValidationError;

        let mut errors = ValidationErrors::new();
        errors.add("limit", ValidationError::new("range"));
        let rejections: [ValidRejection<String>; 2] = [
            ValidationRejection::Valid(errors),
            ValidationRejection::Inner("expected a number".into()),
        ];

        for rejection in rejections {
            let response = AppError::from(rejection).into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert!(body["message"].as_str().unwrap().starts_with("bad request"));
        }
    }

    #[test]
    fn storage_duplicate_becomes_domain_duplicate() {
        let err: ServiceError = StorageError::DuplicateName {
            name: "alice".into(),
        }
        .into();
        assert!(matches!(err, ServiceError::DuplicateName(name) if name == "alice"));
    }
}
