//! Error types raised by the CouchDB lease store.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// Only one of the two credential variables is set.
    #[error("COUCH_USERNAME and COUCH_PASSWORD must be set together")]
    IncompleteCredentials,
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a GET against the target database.
    #[error("failed to query CouchDB database `{database}`")]
    DatabaseQuery {
        /// Database name.
        database: String,
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a database creation request.
    #[error("failed to create CouchDB database `{database}`")]
    DatabaseCreate {
        /// Database name.
        database: String,
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a database operation.
    #[error("unexpected CouchDB database response status {status} for `{database}`")]
    DatabaseStatus {
        /// Database name.
        database: String,
        /// Status CouchDB answered with.
        status: StatusCode,
    },
    /// The database acting as the lease container does not exist.
    #[error("CouchDB database `{database}` does not exist")]
    MissingDatabase {
        /// Database name.
        database: String,
    },
    /// The leased document does not exist.
    #[error("CouchDB document `{path}` does not exist")]
    MissingDocument {
        /// Document path, `database/id`.
        path: String,
    },
    /// A revision-conditional write lost against a concurrent writer.
    #[error("CouchDB document `{path}` was updated concurrently")]
    Conflict {
        /// Document path, `database/id`.
        path: String,
    },
    /// The presented token does not own an unexpired lease on the document.
    #[error("lease on CouchDB document `{path}` is not owned by the caller")]
    LeaseNotOwned {
        /// Document path, `database/id`.
        path: String,
    },
    /// A request to a document endpoint could not be sent.
    #[error("failed to send CouchDB request to `{path}`")]
    RequestSend {
        /// Document path, `database/id`.
        path: String,
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a document endpoint.
    #[error("unexpected CouchDB response status {status} for `{path}`")]
    RequestStatus {
        /// Document path, `database/id`.
        path: String,
        /// Status CouchDB answered with.
        status: StatusCode,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    DecodeResponse {
        /// Document path, `database/id`.
        path: String,
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// Stored state bytes are not a JSON document.
    #[error("state written to `{path}` is not valid JSON")]
    InvalidState {
        /// Document path, `database/id`.
        path: String,
        /// JSON parse error.
        #[source]
        source: serde_json::Error,
    },
}
