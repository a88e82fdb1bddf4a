use super::error::{CouchDaoError, CouchResult};

/// Basic-auth pair sent with every CouchDB request.
#[derive(Debug, Clone)]
pub struct CouchCredentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Where the CouchDB lease store lives.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL without trailing slash.
    pub base_url: String,
    /// Database holding the game document; doubles as the lease container name.
    pub database: String,
    /// Basic-auth pair, when the server requires one.
    pub credentials: Option<CouchCredentials>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL`, `COUCH_DB` and the optional `COUCH_USERNAME`/`COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> CouchResult<Self> {
        let required = |var| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(CouchDaoError::MissingEnvVar { var })
        };
        let base_url = required("COUCH_BASE_URL")?;
        let database = required("COUCH_DB")?;

        let credentials = match (lookup("COUCH_USERNAME"), lookup("COUCH_PASSWORD")) {
            (Some(username), Some(password)) => Some(CouchCredentials { username, password }),
            (None, None) => None,
            _ => return Err(CouchDaoError::IncompleteCredentials),
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            database,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&'static str, &'static str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        move |var| vars.get(var).map(|value| value.to_string())
    }

    #[test]
    fn reads_location_and_credentials() {
        let config = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://couch:5984/"),
            ("COUCH_DB", "buttonpong"),
            ("COUCH_USERNAME", "admin"),
            ("COUCH_PASSWORD", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://couch:5984");
        assert_eq!(config.database, "buttonpong");
        assert_eq!(config.credentials.unwrap().username, "admin");
    }

    #[test]
    fn database_is_required() {
        let err = CouchConfig::from_lookup(lookup(&[("COUCH_BASE_URL", "http://couch:5984")]))
            .unwrap_err();
        assert!(matches!(
            err,
            CouchDaoError::MissingEnvVar { var: "COUCH_DB" }
        ));
    }

    #[test]
    fn half_a_credential_pair_is_rejected() {
        let err = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://couch:5984"),
            ("COUCH_DB", "buttonpong"),
            ("COUCH_USERNAME", "admin"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CouchDaoError::IncompleteCredentials));
    }
}
