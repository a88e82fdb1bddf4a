//! DTOs for the ping/pong exchange.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        game::{GameStateResponse, PingPongDto},
        validation::validate_device_id,
    },
    state::{game::GameState, pings::PingOutcome},
};

/// Answer from a device to the ping it received.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PongRequest {
    /// Device answering the ping.
    #[validate(custom(function = "validate_device_id"))]
    pub device_id: String,
}

/// Whether a pong was accepted, with the resulting game.
#[derive(Debug, Serialize, ToSchema)]
pub struct PongResponse {
    /// The pong answered the active ping in time.
    pub accepted: bool,
    /// Game after the pong and any follow-up ping.
    pub state: GameStateResponse,
}

/// Manual run of ping management, optionally challenging a specific device.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    /// Device to challenge instead of a random one.
    #[validate(custom(function = "validate_device_id"))]
    pub device_id: Option<String>,
}

/// What one ping-management pass did.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    /// Ping issued during the pass.
    pub new_ping: Option<PingPongDto>,
    /// Ping that aged out; its device is eliminated.
    pub expired_ping: Option<PingPongDto>,
    /// The pass finished the game.
    pub game_completed: bool,
    /// Game after the pass.
    pub state: GameStateResponse,
}

impl From<(GameState, PingOutcome)> for PingResponse {
    fn from((state, outcome): (GameState, PingOutcome)) -> Self {
        Self {
            new_ping: outcome.new_ping.map(Into::into),
            expired_ping: outcome.expired_ping.map(Into::into),
            game_completed: outcome.game_completed,
            state: state.into(),
        }
    }
}
