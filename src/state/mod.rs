/// Lease-protected read-modify-write cycles over the stored game record.
pub mod coordinator;
/// Game record and device types.
pub mod game;
/// Async facade running each game operation as one leased transition.
pub mod manager;
/// Ping expiry, elimination and pong acceptance.
pub mod pings;
/// Registration, start, completion and reset transitions.
pub mod state_machine;
/// Transition results and their persistence decision.
pub mod transitions;

use std::sync::Arc;

use crate::{
    config::AppConfig, dao::lease_store::LeaseStore, services::notifier::DeviceNotifier,
    state::manager::GameStateManager,
};

/// Application state shared across handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Handles shared by request handlers and the background ping manager.
pub struct AppState {
    game: GameStateManager,
    notifier: Arc<dyn DeviceNotifier>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        game: GameStateManager,
        notifier: Arc<dyn DeviceNotifier>,
        config: AppConfig,
    ) -> SharedState {
        Arc::new(Self {
            game,
            notifier,
            config,
        })
    }

    /// Game operations over the stored record.
    pub fn game(&self) -> &GameStateManager {
        &self.game
    }

    /// Outbound device notifications.
    pub fn notifier(&self) -> &Arc<dyn DeviceNotifier> {
        &self.notifier
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Backing store of the game record.
    pub fn store(&self) -> &Arc<dyn LeaseStore> {
        self.game.coordinator().store()
    }
}

/// Application state over a fresh in-memory store, for service-level tests.
#[cfg(test)]
pub(crate) fn in_memory(notifier: Arc<dyn DeviceNotifier>, config: AppConfig) -> SharedState {
    use crate::{
        dao::lease_store::memory::InMemoryLeaseStore, state::coordinator::LeaseCoordinator,
    };

    let coordinator = LeaseCoordinator::new(
        Arc::new(InMemoryLeaseStore::new()),
        config.storage_container.clone(),
        config.lease_duration,
    );
    AppState::new(GameStateManager::new(coordinator), notifier, config)
}
