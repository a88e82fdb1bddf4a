use mongodb::{
    bson::{Binary, DateTime, spec::BinarySubtype},
    error::{Error as MongoError, ErrorKind, WriteFailure},
};
use serde::{Deserialize, Serialize};

/// Server error code for a unique index violation.
pub const DUPLICATE_KEY: i32 = 11000;
/// Server error code returned when creating a collection that already exists.
pub const NAMESPACE_EXISTS: i32 = 48;

/// Leased resource stored in the container collection, keyed by resource name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoLeaseDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub lease_token: Option<String>,
    #[serde(default)]
    pub lease_expires_at: Option<DateTime>,
    #[serde(default)]
    pub state: Option<Binary>,
}

pub fn state_as_binary(bytes: Vec<u8>) -> Binary {
    Binary {
        subtype: BinarySubtype::Generic,
        bytes,
    }
}

/// Server error code carried by command and write failures.
pub fn server_error_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        _ => None,
    }
}

pub fn expiry_after(now: DateTime, duration: std::time::Duration) -> DateTime {
    DateTime::from_millis(
        now.timestamp_millis()
            .saturating_add(duration.as_millis() as i64),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn expiry_is_offset_from_now() {
        let now = DateTime::from_millis(10_000);
        assert_eq!(
            expiry_after(now, Duration::from_secs(30)).timestamp_millis(),
            40_000
        );
    }

    #[test]
    fn state_is_stored_as_generic_binary() {
        let binary = state_as_binary(b"{}".to_vec());
        assert_eq!(binary.subtype, BinarySubtype::Generic);
        assert_eq!(binary.bytes, b"{}".to_vec());
    }
}
