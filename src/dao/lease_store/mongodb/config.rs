use std::env;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DATABASE: &str = "button_pong";
const APP_NAME: &str = "button-pong-back";

/// Connection settings for the MongoDB lease store.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed driver options.
    pub options: ClientOptions,
    /// Database whose collections act as lease containers.
    pub database_name: String,
}

impl MongoConfig {
    /// Read `MONGO_URI` and the optional `MONGO_DB`.
    ///
    /// Without `MONGO_DB` the database named in the URI path is used, then `button_pong`.
    pub async fn from_env() -> MongoResult<Self> {
        let uri =
            env::var("MONGO_URI").map_err(|_| MongoDaoError::MissingEnvVar { var: "MONGO_URI" })?;
        let mut options = ClientOptions::parse(&uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri { uri, source })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_string());

        let database_name = pick_database(env::var("MONGO_DB").ok(), options.default_database.clone());
        Ok(Self {
            options,
            database_name,
        })
    }
}

fn pick_database(explicit: Option<String>, from_uri: Option<String>) -> String {
    explicit
        .into_iter()
        .chain(from_uri)
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}
