/// OpenAPI documentation generation.
pub mod documentation;
/// Device registration and game life-cycle operations.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Fire-and-forget delivery of game events to devices.
pub mod notifications;
/// Device webhook client.
pub mod notifier;
/// Ping management: pong handling, manual triggers and the periodic manager task.
pub mod ping_service;
