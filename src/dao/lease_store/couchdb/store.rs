use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode};

use crate::dao::{
    lease_store::{LeaseStore, LeaseToken, ResourceId},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchLeaseDocument, LeaseBody, now_ms},
};

/// [`LeaseStore`] over CouchDB: every mutation is a revision-conditional PUT, so two callers
/// racing on the same document cannot both succeed.
#[derive(Clone)]
pub struct CouchLeaseStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchLeaseStore {
    /// Build the HTTP client and make sure the configured database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url);
        let database = Arc::<str>::from(config.database);
        let auth = config.credentials.map(|credentials| {
            (
                Arc::<str>::from(credentials.username),
                Arc::<str>::from(credentials.password),
            )
        });

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.create_database(&store.database).await?;
        Ok(store)
    }

    /// Database name given at connection time.
    pub fn database(&self) -> &str {
        &self.database
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database_exists(&self, database: &str) -> CouchResult<()> {
        let response = self
            .request(Method::GET, database)
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(CouchDaoError::MissingDatabase {
                database: database.to_string(),
            }),
            status => Err(CouchDaoError::DatabaseStatus {
                database: database.to_string(),
                status,
            }),
        }
    }

    async fn create_database(&self, database: &str) -> CouchResult<()> {
        let response = self
            .request(Method::PUT, database)
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseCreate {
                database: database.to_string(),
                source,
            })?;

        match response.status() {
            // 412: the database already exists.
            status if status.is_success() || status == StatusCode::PRECONDITION_FAILED => Ok(()),
            status => Err(CouchDaoError::DatabaseStatus {
                database: database.to_string(),
                status,
            }),
        }
    }

    async fn get_document(&self, resource: &ResourceId) -> CouchResult<Option<CouchLeaseDocument>> {
        let path = resource.to_string();
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: path.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchLeaseDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::DecodeResponse { path, source }),
            status => Err(CouchDaoError::RequestStatus { path, status }),
        }
    }

    /// Fetch the document, telling a missing database apart from a missing document.
    async fn load_document(&self, resource: &ResourceId) -> CouchResult<Option<CouchLeaseDocument>> {
        match self.get_document(resource).await? {
            Some(doc) => Ok(Some(doc)),
            None => {
                self.ensure_database_exists(&resource.container).await?;
                Ok(None)
            }
        }
    }

    async fn put_document(
        &self,
        resource: &ResourceId,
        document: &CouchLeaseDocument,
    ) -> CouchResult<()> {
        let path = resource.to_string();
        let response = self
            .request(Method::PUT, &path)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: path.clone(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict { path }),
            StatusCode::NOT_FOUND => Err(CouchDaoError::MissingDatabase {
                database: resource.container.clone(),
            }),
            status => Err(CouchDaoError::RequestStatus { path, status }),
        }
    }

    async fn acquire(&self, resource: &ResourceId, duration: Duration) -> CouchResult<LeaseToken> {
        let mut document = self
            .load_document(resource)
            .await?
            .unwrap_or_else(|| CouchLeaseDocument::empty(&resource.name));

        let now = now_ms();
        if document.is_leased_at(now) {
            return Err(CouchDaoError::Conflict {
                path: resource.to_string(),
            });
        }

        let token = LeaseToken::generate();
        document.lease = Some(LeaseBody {
            token: token.to_string(),
            expires_at_ms: now.saturating_add(duration.as_millis() as i64),
        });
        self.put_document(resource, &document).await?;
        Ok(token)
    }

    async fn owned_document(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> CouchResult<Option<CouchLeaseDocument>> {
        let Some(document) = self.load_document(resource).await? else {
            return Ok(None);
        };
        if !document.is_owned_by(token.as_str(), now_ms()) {
            return Err(CouchDaoError::LeaseNotOwned {
                path: resource.to_string(),
            });
        }
        Ok(Some(document))
    }

    async fn release(&self, resource: &ResourceId, token: &LeaseToken) -> CouchResult<()> {
        let mut document =
            self.owned_document(resource, token)
                .await?
                .ok_or_else(|| CouchDaoError::MissingDocument {
                    path: resource.to_string(),
                })?;
        document.lease = None;
        self.put_document(resource, &document).await
    }

    async fn read_state(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
    ) -> CouchResult<Option<Vec<u8>>> {
        let Some(document) = self.owned_document(resource, token).await? else {
            return Ok(None);
        };
        document
            .state
            .map(|state| serde_json::to_vec(&state))
            .transpose()
            .map_err(|source| CouchDaoError::InvalidState {
                path: resource.to_string(),
                source,
            })
    }

    async fn write_state(
        &self,
        resource: &ResourceId,
        token: &LeaseToken,
        bytes: Vec<u8>,
    ) -> CouchResult<()> {
        let state = if bytes.is_empty() {
            None
        } else {
            Some(
                serde_json::from_slice(&bytes).map_err(|source| CouchDaoError::InvalidState {
                    path: resource.to_string(),
                    source,
                })?,
            )
        };

        // A document recreated after its database vanished carries no lease to check against.
        let mut document = match self.load_document(resource).await? {
            Some(document) if document.lease.is_some() => {
                if !document.is_owned_by(token.as_str(), now_ms()) {
                    return Err(CouchDaoError::LeaseNotOwned {
                        path: resource.to_string(),
                    });
                }
                document
            }
            Some(document) => document,
            None => CouchLeaseDocument::empty(&resource.name),
        };
        document.state = state;
        self.put_document(resource, &document).await
    }
}

impl LeaseStore for CouchLeaseStore {
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
        Box::pin(async move { store.create_database(&container).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let database = store.database.clone();
            store
                .ensure_database_exists(&database)
                .await
                .map_err(Into::into)
        })
    }
}
