use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::{
        game::{CompleteGameRequest, GameStateResponse},
        ping::{PingRequest, PingResponse},
    },
    error::AppError,
    services::{
        game_service::{self, StartOutcome},
        ping_service,
    },
    state::SharedState,
};

/// Game life-cycle endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(get_game).put(start_game).delete(reset_game))
        .route("/game/complete", post(complete_game))
        .route("/game/ping", post(trigger_ping))
}

/// Current game record.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current game state", body = GameStateResponse),
        (status = 409, description = "Game state is busy, retry later")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(game_service::game_status(&state).await?))
}

/// Start the game with the registered devices and send the first ping.
#[utoipa::path(
    put,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Game started", body = GameStateResponse),
        (status = 409, description = "Game already running or fewer than two devices registered", body = GameStateResponse)
    )
)]
pub async fn start_game(State(state): State<SharedState>) -> Result<Response, AppError> {
    let response = match game_service::start_game(&state).await? {
        StartOutcome::Started(game) => (StatusCode::OK, Json(game)).into_response(),
        StartOutcome::Refused(game) => (StatusCode::CONFLICT, Json(game)).into_response(),
    };
    Ok(response)
}

/// Finish the running game, optionally naming the winner.
#[utoipa::path(
    post,
    path = "/game/complete",
    tag = "game",
    request_body = CompleteGameRequest,
    responses(
        (status = 200, description = "Game completed", body = GameStateResponse),
        (status = 409, description = "No game in progress")
    )
)]
pub async fn complete_game(
    State(state): State<SharedState>,
    payload: Option<Json<CompleteGameRequest>>,
) -> Result<Json<GameStateResponse>, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    payload.validate()?;
    Ok(Json(game_service::complete_game(&state, payload).await?))
}

/// Discard the game record and start over.
#[utoipa::path(
    delete,
    path = "/game",
    tag = "game",
    responses((status = 200, description = "Fresh game state", body = GameStateResponse))
)]
pub async fn reset_game(
    State(state): State<SharedState>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(game_service::reset_game(&state).await?))
}

/// Run ping management once, optionally challenging a specific device.
#[utoipa::path(
    post,
    path = "/game/ping",
    tag = "game",
    request_body = PingRequest,
    responses(
        (status = 200, description = "Ping management outcome", body = PingResponse),
        (status = 404, description = "Requested device is not registered"),
        (status = 409, description = "Game state is busy, retry later")
    )
)]
pub async fn trigger_ping(
    State(state): State<SharedState>,
    payload: Option<Json<PingRequest>>,
) -> Result<Json<PingResponse>, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    payload.validate()?;
    Ok(Json(
        ping_service::trigger_ping(&state, payload.device_id).await?,
    ))
}
