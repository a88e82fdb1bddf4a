//! DTOs describing the game record.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{device::DeviceSummary, format_timestamp, validation::validate_device_id},
    state::game::{GameActivity, GameState, PingPongData},
};

/// Life-cycle stage of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum GameActivityDto {
    /// Unrecognised stored stage.
    Unknown,
    /// Devices may join and leave.
    NotStarted,
    /// Pings are being exchanged.
    InProgress,
    /// The game is over.
    Complete,
}

impl From<GameActivity> for GameActivityDto {
    fn from(value: GameActivity) -> Self {
        match value {
            GameActivity::Unknown => GameActivityDto::Unknown,
            GameActivity::NotStarted => GameActivityDto::NotStarted,
            GameActivity::InProgress => GameActivityDto::InProgress,
            GameActivity::Complete => GameActivityDto::Complete,
        }
    }
}

/// A ping sent or a pong received, timestamped in RFC 3339.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PingPongDto {
    /// Device pinged, or answering.
    pub device_id: String,
    /// RFC 3339 timestamp.
    pub event_time_utc: String,
}

impl From<PingPongData> for PingPongDto {
    fn from(value: PingPongData) -> Self {
        Self {
            device_id: value.device_id,
            event_time_utc: format_timestamp(value.event_time_utc),
        }
    }
}

/// Full view of the game record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStateResponse {
    /// Life-cycle stage.
    pub activity: GameActivityDto,
    /// Roster in registration order.
    pub registered_devices: Vec<DeviceSummary>,
    /// Devices not yet eliminated.
    pub active_devices: Vec<String>,
    /// Pings sent in this game.
    pub pings_sent: Vec<PingPongDto>,
    /// Accepted pongs.
    pub pongs_received: Vec<PingPongDto>,
    /// Ping awaiting a pong.
    pub active_ping: Option<PingPongDto>,
    /// Winner of a completed game.
    pub winning_device_id: Option<String>,
}

impl From<GameState> for GameStateResponse {
    fn from(state: GameState) -> Self {
        Self {
            activity: state.activity.into(),
            registered_devices: state
                .registered_devices
                .into_keys()
                .map(|device_id| DeviceSummary { device_id })
                .collect(),
            active_devices: state.active_devices.into_iter().collect(),
            pings_sent: state.pings_sent.into_iter().map(Into::into).collect(),
            pongs_received: state.pongs_received.into_iter().map(Into::into).collect(),
            active_ping: state.active_ping.map(Into::into),
            winning_device_id: state.winning_device_id,
        }
    }
}

/// Optional winner to record when finishing the game by hand.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteGameRequest {
    /// Winner to record, if any.
    #[validate(custom(function = "validate_device_id"))]
    pub winning_device_id: Option<String>,
}
