use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The lease is held by another caller, or the caller's lease is no longer valid.
    #[error("lease on `{resource}` is held by another caller")]
    Concurrency {
        /// Contended resource, as `container/name`.
        resource: String,
    },
    /// The container (or resource) backing the state does not exist.
    #[error("storage resource `{resource}` not found")]
    NotFound {
        /// Missing container or resource.
        resource: String,
    },
    /// The stored document could not be encoded or decoded.
    #[error("stored game state could not be encoded or decoded")]
    Encoding {
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// Any other backend failure: network, driver or unexpected response.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Backend-specific description.
        message: String,
        /// Backend error that caused the failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Lease contention on `resource`.
    pub fn concurrency(resource: impl ToString) -> Self {
        StorageError::Concurrency {
            resource: resource.to_string(),
        }
    }

    /// Missing container or resource.
    pub fn not_found(resource: impl ToString) -> Self {
        StorageError::NotFound {
            resource: resource.to_string(),
        }
    }

    /// True for a missing container or resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
