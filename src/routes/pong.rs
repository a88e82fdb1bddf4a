use axum::{Json, Router, extract::State, routing::put};
use validator::Validate;

use crate::{
    dto::ping::{PongRequest, PongResponse},
    error::AppError,
    services::ping_service,
    state::SharedState,
};

/// Pong endpoint.
pub fn router() -> Router<SharedState> {
    Router::new().route("/pong", put(record_pong))
}

/// Answer the active ping on behalf of a device.
#[utoipa::path(
    put,
    path = "/pong",
    tag = "pong",
    request_body = PongRequest,
    responses(
        (status = 200, description = "Pong processed; `accepted` tells whether it answered the active ping in time", body = PongResponse),
        (status = 409, description = "Game state is busy, retry later")
    )
)]
pub async fn record_pong(
    State(state): State<SharedState>,
    Json(payload): Json<PongRequest>,
) -> Result<Json<PongResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        ping_service::record_pong(&state, payload.device_id).await?,
    ))
}
