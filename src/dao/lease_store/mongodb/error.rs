//! Error types raised by the MongoDB lease store.

use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Rejected connection string.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered a ping while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of pings sent before giving up.
        attempts: u32,
        /// Error of the last ping.
        #[source]
        source: MongoError,
    },
    /// A health-check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Creating the collection acting as a container failed.
    #[error("failed to create collection `{collection}`")]
    CreateCollection {
        /// Collection name.
        collection: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Another caller holds an unexpired lease.
    #[error("lease on `{resource}` is held by another caller")]
    LeaseHeld {
        /// Leased resource.
        resource: String,
    },
    /// The presented token does not own an unexpired lease.
    #[error("lease on `{resource}` is not owned by the caller")]
    LeaseNotOwned {
        /// Leased resource.
        resource: String,
    },
    /// The conditional upsert taking the lease failed.
    #[error("failed to acquire lease on `{resource}`")]
    AcquireLease {
        /// Leased resource.
        resource: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Clearing the lease fields failed.
    #[error("failed to release lease on `{resource}`")]
    ReleaseLease {
        /// Leased resource.
        resource: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading the lease document failed.
    #[error("failed to load `{resource}`")]
    LoadState {
        /// Leased resource.
        resource: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Writing the state under the lease failed.
    #[error("failed to save `{resource}`")]
    SaveState {
        /// Leased resource.
        resource: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
