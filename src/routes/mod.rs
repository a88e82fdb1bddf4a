use axum::Router;

use crate::state::SharedState;

/// Device roster routes.
pub mod devices;
/// Swagger UI and OpenAPI document.
pub mod docs;
/// Game life-cycle and ping routes.
pub mod game;
/// Health check route.
pub mod health;
/// Pong route.
pub mod pong;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(devices::router())
        .merge(game::router())
        .merge(pong::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
