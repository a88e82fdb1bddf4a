use std::time::Duration;

use time::OffsetDateTime;

use crate::{
    dao::storage::StorageResult,
    state::{
        coordinator::LeaseCoordinator,
        game::{DeviceState, GameDevice, GameState},
        pings::{self, PingOutcome},
        state_machine,
    },
};

/// Game operations, each run as one lease-protected transition over the stored record.
///
/// Every method returns the record as it stands after the operation alongside its outcome.
#[derive(Clone)]
pub struct GameStateManager {
    coordinator: LeaseCoordinator,
}

impl GameStateManager {
    /// Run game operations through `coordinator`.
    pub fn new(coordinator: LeaseCoordinator) -> Self {
        Self { coordinator }
    }

    /// Coordinator guarding the record.
    pub fn coordinator(&self) -> &LeaseCoordinator {
        &self.coordinator
    }

    /// Current record, or a fresh one when nothing is stored.
    pub async fn get_state(&self) -> StorageResult<GameState> {
        let (state, ()) = self
            .coordinator
            .perform_with_lease(state_machine::get_state)
            .await?;
        Ok(state)
    }

    /// Add `device` to the roster; returns its resulting membership.
    pub async fn register_device(
        &self,
        device: GameDevice,
    ) -> StorageResult<(GameState, DeviceState)> {
        self.coordinator
            .perform_with_lease(move |current| state_machine::register_device(current, device))
            .await
    }

    /// Drop `device_id` from the roster; returns its resulting membership.
    pub async fn unregister_device(
        &self,
        device_id: String,
    ) -> StorageResult<(GameState, DeviceState)> {
        self.coordinator
            .perform_with_lease(move |current| {
                state_machine::unregister_device(current, &device_id)
            })
            .await
    }

    /// Start the game; the flag is `false` when validation refused it.
    pub async fn start_game(&self, validate: bool) -> StorageResult<(GameState, bool)> {
        self.coordinator
            .perform_with_lease(move |current| state_machine::start_game(current, validate))
            .await
    }

    /// Finish the game; the flag is `false` when validation refused it.
    pub async fn complete_game(
        &self,
        winning_device_id: Option<String>,
        validate: bool,
    ) -> StorageResult<(GameState, bool)> {
        self.coordinator
            .perform_with_lease(move |current| {
                state_machine::complete_game(current, winning_device_id, validate)
            })
            .await
    }

    /// Replace the record with a fresh pre-game one.
    pub async fn reset_game(&self) -> StorageResult<GameState> {
        let (state, ()) = self
            .coordinator
            .perform_with_lease(state_machine::reset_game)
            .await?;
        Ok(state)
    }

    /// Expire a stale ping and keep one outstanding, optionally targeting `device_id`.
    pub async fn manage_active_ping(
        &self,
        max_age: Duration,
        device_id: Option<String>,
    ) -> StorageResult<(GameState, PingOutcome)> {
        self.coordinator
            .perform_with_lease(move |current| {
                pings::manage_active_ping(
                    current,
                    max_age,
                    device_id.as_deref(),
                    OffsetDateTime::now_utc(),
                    &mut rand::rng(),
                )
            })
            .await
    }

    /// Record a pong from `device_id`; the flag tells whether it answered the active ping in time.
    pub async fn record_pong(
        &self,
        device_id: String,
        max_age: Duration,
    ) -> StorageResult<(GameState, bool)> {
        self.coordinator
            .perform_with_lease(move |current| {
                pings::record_pong(current, &device_id, max_age, OffsetDateTime::now_utc())
            })
            .await
    }
}
