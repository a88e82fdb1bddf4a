//! Persisted document for the game record. Field names are PascalCase and must stay stable so
//! documents written by earlier deployments keep decoding.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    dao::storage::{StorageError, StorageResult},
    state::game::{GameActivity, GameDevice, GameState, PingPongData},
};

/// Stored life-cycle stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameActivityEntity {
    /// Stage could not be determined.
    Unknown,
    /// Pre-game.
    NotStarted,
    /// Pings are being exchanged.
    InProgress,
    /// Game over.
    Complete,
    /// Any value written by a newer or foreign writer.
    #[serde(other)]
    Unrecognized,
}

/// Stored roster entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GameDeviceEntity {
    /// Device identifier.
    pub device_id: String,
    /// Webhook token.
    pub access_token: String,
}

/// Stored ping or pong.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PingPongEntity {
    /// Device identifier.
    pub device_id: String,
    /// RFC 3339 timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub event_time_utc: OffsetDateTime,
}

/// Aggregate game document persisted by the lease store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GameStateEntity {
    /// Life-cycle stage.
    pub activity: GameActivityEntity,
    /// Roster keyed by device id.
    #[serde(default)]
    pub registered_devices: IndexMap<String, GameDeviceEntity>,
    /// Devices not yet eliminated.
    #[serde(default)]
    pub active_devices: IndexSet<String>,
    /// Pings sent in this game.
    #[serde(default)]
    pub pings_sent: Vec<PingPongEntity>,
    /// Accepted pongs.
    #[serde(default)]
    pub pongs_received: Vec<PingPongEntity>,
    /// Ping awaiting a pong.
    #[serde(default)]
    pub active_ping: Option<PingPongEntity>,
    /// Winner of a completed game.
    #[serde(default)]
    pub winning_device_id: Option<String>,
}

/// Serialize the game record into the bytes handed to the lease store.
pub fn encode_game_state(state: &GameState) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(&GameStateEntity::from(state.clone()))
        .map_err(|source| StorageError::Encoding { source })
}

/// Decode stored bytes; empty content means no game record was ever written.
pub fn decode_game_state(bytes: &[u8]) -> StorageResult<Option<GameState>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice::<GameStateEntity>(bytes)
        .map(|entity| Some(entity.into()))
        .map_err(|source| StorageError::Encoding { source })
}

impl From<GameActivity> for GameActivityEntity {
    fn from(value: GameActivity) -> Self {
        match value {
            GameActivity::Unknown => Self::Unknown,
            GameActivity::NotStarted => Self::NotStarted,
            GameActivity::InProgress => Self::InProgress,
            GameActivity::Complete => Self::Complete,
        }
    }
}

impl From<GameActivityEntity> for GameActivity {
    fn from(value: GameActivityEntity) -> Self {
        match value {
            GameActivityEntity::NotStarted => Self::NotStarted,
            GameActivityEntity::InProgress => Self::InProgress,
            GameActivityEntity::Complete => Self::Complete,
            GameActivityEntity::Unknown | GameActivityEntity::Unrecognized => Self::Unknown,
        }
    }
}

impl From<GameDevice> for GameDeviceEntity {
    fn from(value: GameDevice) -> Self {
        Self {
            device_id: value.device_id,
            access_token: value.access_token,
        }
    }
}

impl From<GameDeviceEntity> for GameDevice {
    fn from(value: GameDeviceEntity) -> Self {
        Self {
            device_id: value.device_id,
            access_token: value.access_token,
        }
    }
}

impl From<PingPongData> for PingPongEntity {
    fn from(value: PingPongData) -> Self {
        Self {
            device_id: value.device_id,
            event_time_utc: value.event_time_utc,
        }
    }
}

impl From<PingPongEntity> for PingPongData {
    fn from(value: PingPongEntity) -> Self {
        Self {
            device_id: value.device_id,
            event_time_utc: value.event_time_utc,
        }
    }
}

impl From<GameState> for GameStateEntity {
    fn from(state: GameState) -> Self {
        Self {
            activity: state.activity.into(),
            registered_devices: state
                .registered_devices
                .into_iter()
                .map(|(id, device)| (id, device.into()))
                .collect(),
            active_devices: state.active_devices,
            pings_sent: state.pings_sent.into_iter().map(Into::into).collect(),
            pongs_received: state.pongs_received.into_iter().map(Into::into).collect(),
            active_ping: state.active_ping.map(Into::into),
            winning_device_id: state.winning_device_id,
        }
    }
}

impl From<GameStateEntity> for GameState {
    fn from(entity: GameStateEntity) -> Self {
        Self {
            activity: entity.activity.into(),
            registered_devices: entity
                .registered_devices
                .into_iter()
                .map(|(id, device)| (id, device.into()))
                .collect(),
            active_devices: entity.active_devices,
            pings_sent: entity.pings_sent.into_iter().map(Into::into).collect(),
            pongs_received: entity.pongs_received.into_iter().map(Into::into).collect(),
            active_ping: entity.active_ping.map(Into::into),
            winning_device_id: entity.winning_device_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use time::macros::datetime;

    use super::*;

    #[test]
    fn document_uses_pascal_case_field_names() {
        let mut state = GameState::not_started();
        state
            .registered_devices
            .insert("a1".into(), GameDevice::new("a1", "tok"));
        state.active_devices.insert("a1".into());
        state.active_ping = Some(PingPongData::new("a1", datetime!(2024-05-01 12:00:00 UTC)));

        let bytes = encode_game_state(&state).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            value,
            json!({
                "Activity": "NotStarted",
                "RegisteredDevices": { "a1": { "DeviceId": "a1", "AccessToken": "tok" } },
                "ActiveDevices": ["a1"],
                "PingsSent": [],
                "PongsReceived": [],
                "ActivePing": { "DeviceId": "a1", "EventTimeUtc": "2024-05-01T12:00:00Z" },
                "WinningDeviceId": null
            })
        );
    }

    #[test]
    fn sparse_document_decodes_with_defaults() {
        let decoded = decode_game_state(br#"{ "Activity": "InProgress" }"#)
            .unwrap()
            .unwrap();
        assert_eq!(decoded.activity, GameActivity::InProgress);
        assert!(decoded.registered_devices.is_empty());
        assert!(decoded.active_ping.is_none());
    }

    #[test]
    fn unrecognized_activity_decodes_as_unknown() {
        let decoded = decode_game_state(br#"{ "Activity": "Paused" }"#)
            .unwrap()
            .unwrap();
        assert_eq!(decoded.activity, GameActivity::Unknown);
    }

    #[test]
    fn empty_content_means_no_state() {
        assert_eq!(decode_game_state(b"").unwrap(), None);
        assert_eq!(decode_game_state(b"  \n").unwrap(), None);
    }

    #[test]
    fn malformed_content_is_an_encoding_error() {
        let err = decode_game_state(b"not json").unwrap_err();
        assert!(matches!(err, StorageError::Encoding { .. }));
    }
}
