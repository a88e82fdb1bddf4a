/// CouchDB backend: revision-conditional documents over HTTP.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;
/// MongoDB backend: conditional upserts on a collection.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::{fmt, time::Duration};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::storage::StorageResult;

/// Location of a leased resource: a container (database, collection, ...) and a name inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Database, collection or other top-level grouping.
    pub container: String,
    /// Resource name inside the container.
    pub name: String,
}

impl ResourceId {
    /// Resource `name` inside `container`.
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

/// Opaque proof of lease ownership handed out by [`LeaseStore::acquire_lease`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseToken(String);

impl LeaseToken {
    /// Mint a fresh, unique token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Token as a plain string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LeaseToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exclusive, time-bounded lease key/value abstraction the game record lives in.
///
/// Reads and writes must present the token of a lease that is still owned; a lost or expired
/// lease surfaces as [`StorageError::Concurrency`](crate::dao::storage::StorageError::Concurrency).
pub trait LeaseStore: Send + Sync {
    /// Acquire an exclusive lease on `resource` for `duration`.
    fn acquire_lease(
        &self,
        resource: &ResourceId,
        duration: Duration,
    ) -> BoxFuture<'static, StorageResult<LeaseToken>>;
    /// Release a previously acquired lease. Best effort.
    fn release_lease(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Read the stored bytes, `None` when nothing was ever written.
    fn read(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>>;
    /// Replace the stored bytes under an owned lease.
    fn write(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Create `container` unless it already exists.
    fn create_container_if_absent(&self, container: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
