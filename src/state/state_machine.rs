//! Life-cycle transitions of the game record: registration, start, completion and reset.
//!
//! Every function takes the stored snapshot (`None` when nothing was ever written) and returns
//! the next record together with whether it must be persisted. None of them perform I/O; the
//! lease coordinator runs them under an exclusive lease.

use crate::state::{
    game::{DeviceState, GameActivity, GameDevice, GameState},
    transitions::{Persistence, Transition},
};

/// Minimum number of registered devices for a validated start.
pub const MIN_PLAYERS: usize = 2;

fn or_fresh(current: Option<GameState>) -> GameState {
    current.unwrap_or_else(GameState::not_started)
}

/// Current record, or a fresh one when none exists. Never persisted.
pub fn get_state(current: Option<GameState>) -> Transition<()> {
    Transition::unchanged(or_fresh(current), ())
}

/// Add a device to the roster; only allowed before the game starts.
pub fn register_device(current: Option<GameState>, device: GameDevice) -> Transition<DeviceState> {
    let mut state = or_fresh(current);
    if state.activity != GameActivity::NotStarted {
        let status = state.device_state(&device.device_id);
        return Transition::unchanged(state, status);
    }

    let mut changed = false;
    if !state.registered_devices.contains_key(&device.device_id) {
        state
            .registered_devices
            .insert(device.device_id.clone(), device.clone());
        changed = true;
    }
    changed |= state.active_devices.insert(device.device_id);

    Transition::new(
        Persistence::from_changed(changed),
        state,
        DeviceState::RegisteredActive,
    )
}

/// Drop a device from the roster; refused while a game is in progress.
pub fn unregister_device(current: Option<GameState>, device_id: &str) -> Transition<DeviceState> {
    let mut state = or_fresh(current);
    if state.activity == GameActivity::InProgress {
        let status = state.device_state(device_id);
        return Transition::unchanged(state, status);
    }

    let removed_registration = state.registered_devices.shift_remove(device_id).is_some();
    let removed_active = state.active_devices.shift_remove(device_id);

    Transition::new(
        Persistence::from_changed(removed_registration || removed_active),
        state,
        DeviceState::NotInGame,
    )
}

/// Move the game into play. With `validate`, refuses when already running or short of players.
///
/// Starting a game that is not already running puts every registered device back into the active
/// set and clears any leftover ping or winner, so a finished game can be replayed without
/// registering again. An unvalidated start of a running game leaves play untouched.
pub fn start_game(current: Option<GameState>, validate: bool) -> Transition<bool> {
    let mut state = or_fresh(current);
    if validate
        && (state.activity == GameActivity::InProgress
            || state.registered_devices.len() < MIN_PLAYERS)
    {
        return Transition::unchanged(state, false);
    }

    if state.activity != GameActivity::InProgress {
        state.activity = GameActivity::InProgress;
        state.active_devices = state.registered_devices.keys().cloned().collect();
        state.active_ping = None;
        state.winning_device_id = None;
    }
    Transition::persist(state, true)
}

/// Finish the game, recording `winning_device_id` when given (otherwise keeping any existing one).
pub fn complete_game(
    current: Option<GameState>,
    winning_device_id: Option<String>,
    validate: bool,
) -> Transition<bool> {
    let mut state = or_fresh(current);
    if validate && state.activity != GameActivity::InProgress {
        return Transition::unchanged(state, false);
    }

    finish(&mut state, winning_device_id);
    Transition::persist(state, true)
}

/// Replace whatever is stored with a fresh pre-game record.
pub fn reset_game(_current: Option<GameState>) -> Transition<()> {
    Transition::persist(GameState::not_started(), ())
}

pub(crate) fn finish(state: &mut GameState, winning_device_id: Option<String>) {
    state.activity = GameActivity::Complete;
    state.winning_device_id = winning_device_id.or_else(|| state.winning_device_id.take());
    state.active_ping = None;
    state.active_devices.clear();
}
