use tracing::{info, warn};

use crate::{
    dto::{
        device::{DeviceStatusResponse, RegisterDeviceRequest},
        game::{CompleteGameRequest, GameStateResponse},
    },
    error::ServiceError,
    services::{
        notifications::{announce_completion, announce_start},
        ping_service,
    },
    state::{SharedState, game::GameState},
};

/// Outcome of a start request: the game either started or was refused as-is.
pub enum StartOutcome {
    /// The game is running and the first ping went out.
    Started(GameStateResponse),
    /// Already running or too few devices; the record is unchanged.
    Refused(GameStateResponse),
}

/// Add a device to the roster of the upcoming game.
pub async fn register_device(
    state: &SharedState,
    request: RegisterDeviceRequest,
) -> Result<DeviceStatusResponse, ServiceError> {
    let device_id = request.device_id.clone();
    let (_, status) = state.game().register_device(request.into()).await?;
    info!(device_id = %device_id, ?status, "device registration processed");
    Ok(DeviceStatusResponse::new(device_id, status))
}

/// Remove a device from the roster; a running game keeps its roster untouched.
pub async fn unregister_device(
    state: &SharedState,
    device_id: String,
) -> Result<DeviceStatusResponse, ServiceError> {
    let (_, status) = state.game().unregister_device(device_id.clone()).await?;
    info!(device_id = %device_id, ?status, "device unregistration processed");
    Ok(DeviceStatusResponse::new(device_id, status))
}

/// Current game record.
pub async fn game_status(state: &SharedState) -> Result<GameStateResponse, ServiceError> {
    Ok(state.game().get_state().await?.into())
}

/// Start the game, tell every device, and challenge the first one.
pub async fn start_game(state: &SharedState) -> Result<StartOutcome, ServiceError> {
    let (game, started) = state.game().start_game(true).await?;
    if !started {
        info!(activity = ?game.activity, devices = game.registered_devices.len(), "start refused");
        return Ok(StartOutcome::Refused(game.into()));
    }

    info!(devices = game.registered_devices.len(), "game started");
    announce_start(state.notifier(), &game);
    let latest = follow_up_ping(state, game).await;
    Ok(StartOutcome::Started(latest.into()))
}

/// Finish the running game by hand, optionally naming the winner.
pub async fn complete_game(
    state: &SharedState,
    request: CompleteGameRequest,
) -> Result<GameStateResponse, ServiceError> {
    let (game, completed) = state
        .game()
        .complete_game(request.winning_device_id, true)
        .await?;
    if !completed {
        return Err(ServiceError::InvalidState(
            "game can only be completed while in progress".into(),
        ));
    }

    info!(winner = ?game.winning_device_id, "game completed");
    announce_completion(state.notifier(), &game);
    Ok(game.into())
}

/// Throw away the current record and start over with an empty roster.
pub async fn reset_game(state: &SharedState) -> Result<GameStateResponse, ServiceError> {
    let game = state.game().reset_game().await?;
    info!("game reset");
    Ok(game.into())
}

/// Run one ping-management pass after a state change that may call for a new ping.
///
/// The triggering change is already persisted, so a failure here is only logged; the periodic
/// manager picks the game up on its next tick.
pub(crate) async fn follow_up_ping(state: &SharedState, fallback: GameState) -> GameState {
    match ping_service::manage_and_announce(state, None).await {
        Ok((game, _)) => game,
        Err(err) => {
            warn!(error = %err, "follow-up ping management failed");
            fallback
        }
    }
}
