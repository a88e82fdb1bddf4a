use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Another caller holds the lease on the game record; the request may be retried.
    #[error("game state is busy: {0}")]
    Concurrency(String),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
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
            StorageError::Concurrency { resource } => ServiceError::Concurrency(format!(
                "lease on `{resource}` is held by another caller"
            )),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state or with a concurrent caller.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Concurrency(message) => AppError::Conflict(message),
            ServiceError::Unavailable(source @ StorageError::Encoding { .. }) => {
                AppError::Internal(source.to_string())
            }
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn lease_contention_maps_to_conflict() {
        let err = ServiceError::from(StorageError::concurrency("buttonpong/gameState"));
        assert!(matches!(err, ServiceError::Concurrency(_)));
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_container_maps_to_unavailable() {
        let err = ServiceError::from(StorageError::not_found("buttonpong/gameState"));
        assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn corrupt_document_maps_to_internal_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ServiceError::from(StorageError::Encoding { source });
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(
            status_of(ServiceError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::InvalidState("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
    }
}
