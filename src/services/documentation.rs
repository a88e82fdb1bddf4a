use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Button Pong API.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::devices::register_device,
        crate::routes::devices::unregister_device,
        crate::routes::game::get_game,
        crate::routes::game::start_game,
        crate::routes::game::complete_game,
        crate::routes::game::reset_game,
        crate::routes::game::trigger_ping,
        crate::routes::pong::record_pong,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::device::RegisterDeviceRequest,
            crate::dto::device::DeviceStatusResponse,
            crate::dto::device::DeviceSummary,
            crate::dto::device::DeviceStatus,
            crate::dto::game::GameStateResponse,
            crate::dto::game::GameActivityDto,
            crate::dto::game::PingPongDto,
            crate::dto::game::CompleteGameRequest,
            crate::dto::ping::PingRequest,
            crate::dto::ping::PingResponse,
            crate::dto::ping::PongRequest,
            crate::dto::ping::PongResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "devices", description = "Device roster management"),
        (name = "game", description = "Game life cycle and ping management"),
        (name = "pong", description = "Answers from devices"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for expected in [
            "/healthcheck",
            "/devices",
            "/devices/{device_id}",
            "/game",
            "/game/complete",
            "/game/ping",
            "/pong",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }
    }
}
