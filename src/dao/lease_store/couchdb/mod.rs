mod config;
mod error;
mod models;
mod store;

pub use config::{CouchConfig, CouchCredentials};
pub use error::CouchDaoError;
pub use store::CouchLeaseStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::Conflict { path } | CouchDaoError::LeaseNotOwned { path } => {
                StorageError::concurrency(path)
            }
            CouchDaoError::MissingDatabase { database } => StorageError::not_found(database),
            CouchDaoError::MissingDocument { path } => StorageError::not_found(path),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_and_foreign_leases_surface_as_concurrency() {
        let conflict: StorageError = CouchDaoError::Conflict {
            path: "buttonpong/gameState".into(),
        }
        .into();
        assert!(matches!(conflict, StorageError::Concurrency { .. }));

        let foreign: StorageError = CouchDaoError::LeaseNotOwned {
            path: "buttonpong/gameState".into(),
        }
        .into();
        assert!(matches!(foreign, StorageError::Concurrency { .. }));
    }

    #[test]
    fn missing_database_surfaces_as_not_found() {
        let err: StorageError = CouchDaoError::MissingDatabase {
            database: "buttonpong".into(),
        }
        .into();
        assert!(err.is_not_found());
    }

    #[test]
    fn other_failures_are_unavailable() {
        let err: StorageError = CouchDaoError::MissingEnvVar {
            var: "COUCH_BASE_URL",
        }
        .into();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
