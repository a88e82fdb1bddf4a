//! Mutex-guarded in-memory lease store for tests and single-process deployments.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use futures::future::{self, BoxFuture};

use crate::dao::{
    lease_store::{LeaseStore, LeaseToken, ResourceId},
    storage::{StorageError, StorageResult},
};

type Containers = HashMap<String, HashMap<String, Blob>>;

#[derive(Debug, Default)]
struct Blob {
    data: Option<Vec<u8>>,
    lease: Option<ActiveLease>,
}

#[derive(Debug)]
struct ActiveLease {
    token: LeaseToken,
    expires_at: Instant,
}

impl Blob {
    fn held_lease(&self, now: Instant) -> Option<&ActiveLease> {
        self.lease.as_ref().filter(|lease| lease.expires_at > now)
    }

    fn owned_by(&self, token: &LeaseToken, now: Instant) -> bool {
        self.held_lease(now)
            .is_some_and(|lease| &lease.token == token)
    }
}

/// [`LeaseStore`] keeping every container in process memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryLeaseStore {
    containers: Arc<Mutex<Containers>>,
}

impl InMemoryLeaseStore {
    /// An empty store without any container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a container and everything in it, as if it vanished from the backing service.
    pub fn remove_container(&self, container: &str) -> bool {
        self.lock().remove(container).is_some()
    }

    /// Peek at the stored bytes without taking a lease.
    pub fn snapshot(&self, resource: &ResourceId) -> Option<Vec<u8>> {
        self.lock()
            .get(&resource.container)
            .and_then(|blobs| blobs.get(&resource.name))
            .and_then(|blob| blob.data.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Containers> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self, resource: &ResourceId, duration: Duration) -> StorageResult<LeaseToken> {
        let mut containers = self.lock();
        let blobs = containers
            .get_mut(&resource.container)
            .ok_or_else(|| StorageError::not_found(resource))?;
        let blob = blobs.entry(resource.name.clone()).or_default();

        let now = Instant::now();
        if blob.held_lease(now).is_some() {
            return Err(StorageError::concurrency(resource));
        }

        let token = LeaseToken::generate();
        blob.lease = Some(ActiveLease {
            token: token.clone(),
            expires_at: now + duration,
        });
        Ok(token)
    }

    fn release(&self, resource: &ResourceId, token: &LeaseToken) -> StorageResult<()> {
        let mut containers = self.lock();
        let blob = containers
            .get_mut(&resource.container)
            .and_then(|blobs| blobs.get_mut(&resource.name))
            .ok_or_else(|| StorageError::not_found(resource))?;

        if !blob.owned_by(token, Instant::now()) {
            return Err(StorageError::concurrency(resource));
        }
        blob.lease = None;
        Ok(())
    }

    fn read_blob(&self, resource: &ResourceId, token: &LeaseToken) -> StorageResult<Option<Vec<u8>>> {
        let containers = self.lock();
        let blobs = containers
            .get(&resource.container)
            .ok_or_else(|| StorageError::not_found(resource))?;
        let Some(blob) = blobs.get(&resource.name) else {
            return Ok(None);
        };

        if !blob.owned_by(token, Instant::now()) {
            return Err(StorageError::concurrency(resource));
        }
        Ok(blob.data.clone())
    }

    fn write_blob(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
        bytes: Vec<u8>,
    ) -> StorageResult<()> {
        let mut containers = self.lock();
        let blobs = containers
            .get_mut(&resource.container)
            .ok_or_else(|| StorageError::not_found(resource))?;
        let blob = blobs.entry(resource.name.clone()).or_default();

        // A blob recreated after its container vanished carries no lease to check against.
        if blob.lease.is_some() && !blob.owned_by(token, Instant::now()) {
            return Err(StorageError::concurrency(resource));
        }
        blob.data = Some(bytes);
        Ok(())
    }
}

impl LeaseStore for InMemoryLeaseStore {
    fn acquire_lease(
        &self,
        resource: &ResourceId,
        duration: Duration,
    ) -> BoxFuture<'static, StorageResult<LeaseToken>> {
        Box::pin(future::ready(self.acquire(resource, duration)))
    }

    fn release_lease(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(self.release(resource, token)))
    }

    fn read(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>> {
        Box::pin(future::ready(self.read_blob(resource, token)))
    }

    fn write(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(self.write_blob(resource, token, bytes)))
    }

    fn create_container_if_absent(&self, container: &str) -> BoxFuture<'static, StorageResult<()>> {
        self.lock().entry(container.to_string()).or_default();
        Box::pin(future::ready(Ok(())))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> ResourceId {
        ResourceId::new("games", "gameState")
    }

    #[tokio::test]
    async fn acquire_fails_when_container_is_missing() {
        let store = InMemoryLeaseStore::new();
        let err = store
            .acquire_lease(&resource(), Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn second_acquire_is_rejected_while_lease_is_held() {
        let store = InMemoryLeaseStore::new();
        store.create_container_if_absent("games").await.unwrap();

        let token = store
            .acquire_lease(&resource(), Duration::from_secs(30))
            .await
            .unwrap();
        let err = store
            .acquire_lease(&resource(), Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Concurrency { .. }));

        store.release_lease(&resource(), &token).await.unwrap();
        store
            .acquire_lease(&resource(), Duration::from_secs(30))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expired_lease_admits_next_holder() {
        let store = InMemoryLeaseStore::new();
        store.create_container_if_absent("games").await.unwrap();

        let stale = store
            .acquire_lease(&resource(), Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let fresh = store
            .acquire_lease(&resource(), Duration::from_secs(30))
            .await
            .unwrap();
        assert_ne!(stale, fresh);

        let err = store
            .write(&resource(), &stale, b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Concurrency { .. }));
    }

    #[tokio::test]
    async fn read_returns_what_the_lease_holder_wrote() {
        let store = InMemoryLeaseStore::new();
        store.create_container_if_absent("games").await.unwrap();

        let token = store
            .acquire_lease(&resource(), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(store.read(&resource(), &token).await.unwrap(), None);

        store
            .write(&resource(), &token, b"state".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store.read(&resource(), &token).await.unwrap(),
            Some(b"state".to_vec())
        );
        assert_eq!(store.snapshot(&resource()), Some(b"state".to_vec()));
    }

    #[tokio::test]
    async fn write_reports_missing_container() {
        let store = InMemoryLeaseStore::new();
        store.create_container_if_absent("games").await.unwrap();
        let token = store
            .acquire_lease(&resource(), Duration::from_secs(30))
            .await
            .unwrap();

        assert!(store.remove_container("games"));
        let err = store
            .write(&resource(), &token, b"state".to_vec())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
