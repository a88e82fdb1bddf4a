use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// One leased resource: the document id is the resource name inside the container database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchLeaseDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease: Option<LeaseBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaseBody {
    pub token: String,
    /// Unix epoch milliseconds after which the lease no longer excludes other callers.
    pub expires_at_ms: i64,
}

impl CouchLeaseDocument {
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: None,
            lease: None,
            state: None,
        }
    }

    /// True when an unexpired lease is recorded on the document.
    pub fn is_leased_at(&self, now_ms: i64) -> bool {
        self.lease
            .as_ref()
            .is_some_and(|lease| lease.expires_at_ms > now_ms)
    }

    pub fn is_owned_by(&self, token: &str, now_ms: i64) -> bool {
        self.lease
            .as_ref()
            .is_some_and(|lease| lease.token == token && lease.expires_at_ms > now_ms)
    }
}

pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leased(token: &str, expires_at_ms: i64) -> CouchLeaseDocument {
        CouchLeaseDocument {
            lease: Some(LeaseBody {
                token: token.into(),
                expires_at_ms,
            }),
            ..CouchLeaseDocument::empty("gameState")
        }
    }

    #[test]
    fn lease_excludes_until_expiry() {
        let doc = leased("abc", 1_000);
        assert!(doc.is_leased_at(999));
        assert!(!doc.is_leased_at(1_000));
        assert!(!CouchLeaseDocument::empty("gameState").is_leased_at(0));
    }

    #[test]
    fn ownership_requires_matching_unexpired_token() {
        let doc = leased("abc", 1_000);
        assert!(doc.is_owned_by("abc", 500));
        assert!(!doc.is_owned_by("other", 500));
        assert!(!doc.is_owned_by("abc", 1_500));
    }

    #[test]
    fn new_document_omits_revision_and_lease() {
        let value = serde_json::to_value(CouchLeaseDocument::empty("gameState")).unwrap();
        assert_eq!(value, serde_json::json!({ "_id": "gameState" }));
    }
}
