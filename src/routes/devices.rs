use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        device::{DeviceStatusResponse, RegisterDeviceRequest},
        validation::validate_device_id,
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Device roster endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/devices", post(register_device))
        .route("/devices/{device_id}", delete(unregister_device))
}

/// Register a device for the upcoming game.
#[utoipa::path(
    post,
    path = "/devices",
    tag = "devices",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 200, description = "Registration processed; status reports the device's membership", body = DeviceStatusResponse),
        (status = 400, description = "Invalid device id or token"),
        (status = 409, description = "Game state is busy, retry later")
    )
)]
pub async fn register_device(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterDeviceRequest>,
) -> Result<Json<DeviceStatusResponse>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::register_device(&state, payload).await?))
}

/// Remove a device from the roster.
#[utoipa::path(
    delete,
    path = "/devices/{device_id}",
    tag = "devices",
    params(("device_id" = String, Path, description = "Device identifier")),
    responses(
        (status = 200, description = "Unregistration processed; a running game keeps its roster", body = DeviceStatusResponse),
        (status = 400, description = "Invalid device id"),
        (status = 409, description = "Game state is busy, retry later")
    )
)]
pub async fn unregister_device(
    State(state): State<SharedState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceStatusResponse>, AppError> {
    validate_device_id(&device_id).map_err(|err| {
        let mut errors = ValidationErrors::new();
        errors.add("device_id", err);
        errors
    })?;
    Ok(Json(
        game_service::unregister_device(&state, device_id).await?,
    ))
}
