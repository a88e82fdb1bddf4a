use std::time::Duration;

use futures::future::BoxFuture;
use mongodb::{
    Collection, Database,
    bson::{DateTime, doc},
};

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        DUPLICATE_KEY, MongoLeaseDocument, NAMESPACE_EXISTS, expiry_after, server_error_code,
        state_as_binary,
    },
};
use crate::dao::{
    lease_store::{LeaseStore, LeaseToken, ResourceId},
    storage::StorageResult,
};

/// MongoDB-backed [`LeaseStore`]: one collection per container, one document per resource.
///
/// Acquisition is a single conditional upsert, so the server arbitrates between racing callers.
/// Collections are created implicitly on first write, so acquisition never reports a missing
/// container.
#[derive(Clone)]
pub struct MongoLeaseStore {
    database: Database,
}

impl MongoLeaseStore {
    /// Connect to the configured database, waiting for the server to answer.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;
        Ok(Self { database })
    }

    fn collection(&self, resource: &ResourceId) -> Collection<MongoLeaseDocument> {
        self.database
            .collection::<MongoLeaseDocument>(&resource.container)
    }

    async fn acquire(&self, resource: &ResourceId, duration: Duration) -> MongoResult<LeaseToken> {
        let now = DateTime::now();
        let token = LeaseToken::generate();
        let filter = doc! {
            "_id": resource.name.as_str(),
            "$or": [
                { "lease_token": null },
                { "lease_expires_at": { "$lte": now } },
            ],
        };
        let update = doc! {
            "$set": {
                "lease_token": token.as_str(),
                "lease_expires_at": expiry_after(now, duration),
            },
        };

        match self
            .collection(resource)
            .find_one_and_update(filter, update)
            .upsert(true)
            .await
        {
            Ok(_) => Ok(token),
            // The filter missed an existing document, so the upsert collided with its id.
            Err(err) if server_error_code(&err) == Some(DUPLICATE_KEY) => {
                Err(MongoDaoError::LeaseHeld {
                    resource: resource.to_string(),
                })
            }
            Err(source) => Err(MongoDaoError::AcquireLease {
                resource: resource.to_string(),
                source,
            }),
        }
    }

    async fn release(&self, resource: &ResourceId, token: &LeaseToken) -> MongoResult<()> {
        let result = self
            .collection(resource)
            .update_one(
                doc! { "_id": resource.name.as_str(), "lease_token": token.as_str() },
                doc! { "$unset": { "lease_token": "", "lease_expires_at": "" } },
            )
            .await
            .map_err(|source| MongoDaoError::ReleaseLease {
                resource: resource.to_string(),
                source,
            })?;

        if result.matched_count == 0 {
            return Err(MongoDaoError::LeaseNotOwned {
                resource: resource.to_string(),
            });
        }
        Ok(())
    }

    async fn find(&self, resource: &ResourceId) -> MongoResult<Option<MongoLeaseDocument>> {
        self.collection(resource)
            .find_one(doc! { "_id": resource.name.as_str() })
            .await
            .map_err(|source| MongoDaoError::LoadState {
                resource: resource.to_string(),
                source,
            })
    }

    async fn read_state(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> MongoResult<Option<Vec<u8>>> {
        let Some(document) = self.find(resource).await? else {
            return Ok(None);
        };

        let owned = document.lease_token.as_deref() == Some(token.as_str())
            && document
                .lease_expires_at
                .is_some_and(|expires| expires > DateTime::now());
        if !owned {
            return Err(MongoDaoError::LeaseNotOwned {
                resource: resource.to_string(),
            });
        }
        Ok(document.state.map(|binary| binary.bytes))
    }

    async fn write_state(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
        bytes: Vec<u8>,
    ) -> MongoResult<()> {
        let collection = self.collection(resource);
        let state = state_as_binary(bytes);
        let save_error = |source| MongoDaoError::SaveState {
            resource: resource.to_string(),
            source,
        };

        let result = collection
            .update_one(
                doc! {
                    "_id": resource.name.as_str(),
                    "lease_token": token.as_str(),
                    "lease_expires_at": { "$gt": DateTime::now() },
                },
                doc! { "$set": { "state": state.clone() } },
            )
            .await
            .map_err(save_error)?;

        if result.matched_count > 0 {
            return Ok(());
        }

        // A document that vanished with its collection carries no lease to check against.
        match self.find(resource).await? {
            Some(_) => Err(MongoDaoError::LeaseNotOwned {
                resource: resource.to_string(),
            }),
            None => {
                collection
                    .update_one(
                        doc! { "_id": resource.name.as_str() },
                        doc! { "$set": { "state": state } },
                    )
                    .upsert(true)
                    .await
                    .map_err(save_error)?;
                Ok(())
            }
        }
    }

    async fn create_collection(&self, name: &str) -> MongoResult<()> {
        match self.database.create_collection(name).await {
            Ok(()) => Ok(()),
            Err(err) if server_error_code(&err) == Some(NAMESPACE_EXISTS) => Ok(()),
            Err(source) => Err(MongoDaoError::CreateCollection {
                collection: name.to_string(),
                source,
            }),
        }
    }

    async fn ping(&self) -> MongoResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }
}

impl LeaseStore for MongoLeaseStore {
    fn acquire_lease(
        &self,
        resource: &ResourceId,
        duration: Duration,
    ) -> BoxFuture<'static, StorageResult<LeaseToken>> {
        let store = self.clone();
        let resource = resource.clone();
        Box::pin(async move { store.acquire(&resource, duration).await.map_err(Into::into) })
    }

    fn release_lease(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let resource = resource.clone();
        let token = token.clone();
        Box::pin(async move { store.release(&resource, &token).await.map_err(Into::into) })
    }

    fn read(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>> {
        let store = self.clone();
        let resource = resource.clone();
        let token = token.clone();
        Box::pin(async move { store.read_state(&resource, &token).await.map_err(Into::into) })
    }

    fn write(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let resource = resource.clone();
        let token = token.clone();
        Box::pin(async move {
            store
                .write_state(&resource, &token, bytes)
                .await
                .map_err(Into::into)
        })
    }

    fn create_container_if_absent(&self, container: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let container = container.to_string();
        Box::pin(async move { store.create_collection(&container).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
