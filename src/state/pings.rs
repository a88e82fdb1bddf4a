//! Ping/pong elimination rules.
//!
//! One device at a time holds the active ping. A ping left unanswered for longer than the maximum
//! age eliminates its device; the last device standing wins.

use std::time::Duration;

use rand::Rng;
use time::OffsetDateTime;

use crate::state::{
    game::{GameActivity, GameState, PingPongData},
    state_machine::finish,
    transitions::{Persistence, Transition},
};

/// What a ping-management pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingOutcome {
    /// Ping issued during this pass.
    pub new_ping: Option<PingPongData>,
    /// Ping that aged out during this pass; its device has been eliminated.
    pub expired_ping: Option<PingPongData>,
    /// The pass eliminated all but at most one device and finished the game.
    pub game_completed: bool,
}

/// True once `ping` is at least `max_age` old. A zero maximum age expires immediately.
pub fn has_expired(ping: &PingPongData, max_age: Duration, now: OffsetDateTime) -> bool {
    max_age.is_zero() || (now - ping.event_time_utc) >= max_age
}

/// Expire a stale ping, finish the game when at most one device remains, otherwise make sure a
/// ping is outstanding (to `device_id` when given, else to a random active device).
pub fn manage_active_ping<R: Rng>(
    current: Option<GameState>,
    max_age: Duration,
    device_id: Option<&str>,
    now: OffsetDateTime,
    rng: &mut R,
) -> Transition<PingOutcome> {
    let mut state = current.unwrap_or_else(GameState::not_started);
    if state.activity != GameActivity::InProgress || state.active_devices.is_empty() {
        return Transition::unchanged(state, PingOutcome::default());
    }

    let mut changed = false;
    let mut outcome = PingOutcome::default();

    if let Some(ping) = state
        .active_ping
        .take_if(|ping| has_expired(ping, max_age, now))
    {
        state.active_devices.shift_remove(&ping.device_id);
        outcome.expired_ping = Some(ping);
        changed = true;
    }

    if state.active_devices.len() <= 1 {
        // The device whose ping just expired is already gone, so it can never be the winner.
        let winner = state.active_devices.first().cloned();
        finish(&mut state, winner);
        outcome.game_completed = true;
        return Transition::persist(state, outcome);
    }

    if let Some(requested) = device_id {
        if !state.active_devices.contains(requested) {
            return Transition::new(Persistence::from_changed(changed), state, outcome);
        }
    }

    if state.active_ping.is_none() {
        let target = match device_id {
            Some(requested) => requested.to_string(),
            None => {
                let index = rng.random_range(0..state.active_devices.len());
                match state.active_devices.get_index(index) {
                    Some(id) => id.clone(),
                    None => {
                        return Transition::new(Persistence::from_changed(changed), state, outcome);
                    }
                }
            }
        };

        let ping = PingPongData::new(target, now);
        state.pings_sent.push(ping.clone());
        state.active_ping = Some(ping.clone());
        outcome.new_ping = Some(ping);
        changed = true;
    }

    Transition::new(Persistence::from_changed(changed), state, outcome)
}

/// Accept a pong from `device_id` when it answers the active ping in time.
pub fn record_pong(
    current: Option<GameState>,
    device_id: &str,
    max_age: Duration,
    now: OffsetDateTime,
) -> Transition<bool> {
    let mut state = current.unwrap_or_else(GameState::not_started);

    let accepted = state.activity == GameActivity::InProgress
        && state.active_devices.contains(device_id)
        && state
            .active_ping
            .as_ref()
            .is_some_and(|ping| ping.device_id == device_id && !has_expired(ping, max_age, now));
    if !accepted {
        return Transition::unchanged(state, false);
    }

    state.pongs_received.push(PingPongData::new(device_id, now));
    state.active_ping = None;
    Transition::persist(state, true)
}
