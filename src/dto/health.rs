use serde::Serialize;
use utoipa::ToSchema;

/// Coarse service health derived from the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Storage answers.
    Ok,
    /// Storage is unreachable.
    Degraded,
}

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
}

impl HealthResponse {
    /// Everything answers.
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
        }
    }

    /// The storage backend did not answer its health check.
    pub fn degraded() -> Self {
        Self {
            status: HealthStatus::Degraded,
        }
    }
}
