//! Lease-protected read/modify/write cycle over the shared game record.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        lease_store::{LeaseStore, LeaseToken, ResourceId},
        models::{decode_game_state, encode_game_state},
        storage::StorageResult,
    },
    state::{
        game::GameState,
        transitions::{Persistence, Transition},
    },
};

/// Name of the resource holding the game record inside the storage container.
pub const GAME_STATE_RESOURCE: &str = "gameState";

/// Raised when a lease duration falls outside [`LeaseDuration::MIN`]..=[`LeaseDuration::MAX`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lease duration must be between 15 and 60 seconds, got {requested:?}")]
pub struct InvalidLeaseDuration {
    /// Rejected duration.
    pub requested: Duration,
}

/// How long one operation may hold the record exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseDuration(Duration);

impl LeaseDuration {
    /// Shortest accepted lease.
    pub const MIN: Duration = Duration::from_secs(15);
    /// Longest accepted lease.
    pub const MAX: Duration = Duration::from_secs(60);
    /// Lease used when none is configured.
    pub const DEFAULT: Duration = Duration::from_secs(30);

    /// Validate `duration` against the accepted range.
    pub fn new(duration: Duration) -> Result<Self, InvalidLeaseDuration> {
        if (Self::MIN..=Self::MAX).contains(&duration) {
            Ok(Self(duration))
        } else {
            Err(InvalidLeaseDuration {
                requested: duration,
            })
        }
    }

    /// The wrapped duration.
    pub fn get(self) -> Duration {
        self.0
    }
}

impl Default for LeaseDuration {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Runs game transitions one at a time against the stored record.
///
/// Each call acquires an exclusive lease, loads the record, applies the transition, writes the
/// result back when asked to, and releases the lease whatever happened in between. Contention is
/// reported as [`StorageError::Concurrency`](crate::dao::storage::StorageError::Concurrency) and
/// never retried here.
#[derive(Clone)]
pub struct LeaseCoordinator {
    store: Arc<dyn LeaseStore>,
    resource: ResourceId,
    lease_duration: LeaseDuration,
}

impl LeaseCoordinator {
    /// Coordinate access to the game record inside `container`.
    pub fn new(
        store: Arc<dyn LeaseStore>,
        container: impl Into<String>,
        lease_duration: LeaseDuration,
    ) -> Self {
        Self {
            store,
            resource: ResourceId::new(container, GAME_STATE_RESOURCE),
            lease_duration,
        }
    }

    /// Backing lease store.
    pub fn store(&self) -> &Arc<dyn LeaseStore> {
        &self.store
    }

    /// Resource holding the game record.
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Apply `transition` to the current record under an exclusive lease.
    ///
    /// Returns the resulting record (persisted or not) and the transition's outcome.
    pub async fn perform_with_lease<T, F>(&self, transition: F) -> StorageResult<(GameState, T)>
    where
        F: FnOnce(Option<GameState>) -> Transition<T> + Send,
        T: Send,
    {
        let token = self.acquire().await?;
        let result = self.run_leased(&token, transition).await;
        self.release(&token).await;
        result
    }

    async fn acquire(&self) -> StorageResult<LeaseToken> {
        let duration = self.lease_duration.get();
        match self.store.acquire_lease(&self.resource, duration).await {
            Err(err) if err.is_not_found() => {
                info!(resource = %self.resource, "storage container missing, creating it");
                self.create_container().await;
                self.store.acquire_lease(&self.resource, duration).await
            }
            other => other,
        }
    }

    async fn run_leased<T, F>(
        &self,
        token: &LeaseToken,
        transition: F,
    ) -> StorageResult<(GameState, T)>
    where
        F: FnOnce(Option<GameState>) -> Transition<T>,
    {
        let current = match self.store.read(&self.resource, token).await? {
            Some(bytes) => decode_game_state(&bytes)?,
            None => None,
        };

        let Transition {
            persistence,
            state,
            outcome,
        } = transition(current);

        if persistence == Persistence::Persist {
            self.save(token, encode_game_state(&state)?).await?;
        }

        Ok((state, outcome))
    }

    async fn save(&self, token: &LeaseToken, bytes: Vec<u8>) -> StorageResult<()> {
        match self.store.write(&self.resource, token, bytes.clone()).await {
            Err(err) if err.is_not_found() => {
                info!(resource = %self.resource, "storage container vanished, recreating before save");
                self.create_container().await;
                self.store.write(&self.resource, token, bytes).await
            }
            other => other,
        }
    }

    async fn create_container(&self) {
        if let Err(err) = self
            .store
            .create_container_if_absent(&self.resource.container)
            .await
        {
            warn!(resource = %self.resource, error = %err, "failed to create storage container");
        }
    }

    async fn release(&self, token: &LeaseToken) {
        if let Err(err) = self.store.release_lease(&self.resource, token).await {
            debug!(resource = %self.resource, error = %err, "failed to release lease");
        }
    }
}
