use indexmap::{IndexMap, IndexSet};
use time::OffsetDateTime;

/// Overall life-cycle stage of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameActivity {
    /// The stage cannot be determined (unrecognised stored value).
    #[default]
    Unknown,
    /// Pre-game: devices may join and leave.
    NotStarted,
    /// Pings are being exchanged; the roster is frozen.
    InProgress,
    /// A winner was determined (or the game was stopped).
    Complete,
}

/// Membership of a device with respect to the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Membership is inconsistent (active without being registered).
    Unknown,
    /// Registered and still in play.
    RegisteredActive,
    /// Registered but eliminated.
    RegisteredInactive,
    /// Neither registered nor active.
    NotInGame,
}

/// A networked button taking part in the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDevice {
    /// Unique device identifier.
    pub device_id: String,
    /// Token used to reach the device through its webhook.
    pub access_token: String,
}

impl GameDevice {
    /// Device `device_id` reachable with `access_token`.
    pub fn new(device_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            access_token: access_token.into(),
        }
    }
}

/// A ping sent to, or pong received from, a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingPongData {
    /// Device pinged, or answering.
    pub device_id: String,
    /// When the ping was sent or the pong received.
    pub event_time_utc: OffsetDateTime,
}

impl PingPongData {
    /// Event for `device_id` at `event_time_utc`.
    pub fn new(device_id: impl Into<String>, event_time_utc: OffsetDateTime) -> Self {
        Self {
            device_id: device_id.into(),
            event_time_utc,
        }
    }
}

/// The single shared game record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameState {
    /// Life-cycle stage.
    pub activity: GameActivity,
    /// Roster keyed by device id, in registration order.
    pub registered_devices: IndexMap<String, GameDevice>,
    /// Devices not yet eliminated.
    pub active_devices: IndexSet<String>,
    /// Every ping sent in this game, oldest first.
    pub pings_sent: Vec<PingPongData>,
    /// Every accepted pong, oldest first.
    pub pongs_received: Vec<PingPongData>,
    /// The ping currently awaiting a pong, if any.
    pub active_ping: Option<PingPongData>,
    /// Set once the game is complete and someone won.
    pub winning_device_id: Option<String>,
}

impl GameState {
    /// A fresh record in the pre-game stage.
    pub fn not_started() -> Self {
        Self {
            activity: GameActivity::NotStarted,
            ..Self::default()
        }
    }

    /// Membership status of `device_id` derived from the registered and active collections.
    pub fn device_state(&self, device_id: &str) -> DeviceState {
        match (
            self.registered_devices.contains_key(device_id),
            self.active_devices.contains(device_id),
        ) {
            (true, true) => DeviceState::RegisteredActive,
            (true, false) => DeviceState::RegisteredInactive,
            (false, false) => DeviceState::NotInGame,
            (false, true) => DeviceState::Unknown,
        }
    }

    /// Registered device record for `device_id`, if any.
    pub fn registered(&self, device_id: &str) -> Option<&GameDevice> {
        self.registered_devices.get(device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_state_follows_membership() {
        let mut state = GameState::not_started();
        state
            .registered_devices
            .insert("a".into(), GameDevice::new("a", "t"));
        state
            .registered_devices
            .insert("b".into(), GameDevice::new("b", "t"));
        state.active_devices.insert("a".into());
        state.active_devices.insert("ghost".into());

        assert_eq!(state.device_state("a"), DeviceState::RegisteredActive);
        assert_eq!(state.device_state("b"), DeviceState::RegisteredInactive);
        assert_eq!(state.device_state("c"), DeviceState::NotInGame);
        assert_eq!(state.device_state("ghost"), DeviceState::Unknown);
    }

    #[test]
    fn ping_pong_equality_uses_device_and_time() {
        let at = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(PingPongData::new("a", at), PingPongData::new("a", at));
        assert_ne!(PingPongData::new("a", at), PingPongData::new("b", at));
        assert_ne!(
            PingPongData::new("a", at),
            PingPongData::new("a", at + time::Duration::SECOND)
        );
    }
}
