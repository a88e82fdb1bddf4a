//! Fire-and-forget delivery of game events to devices.
//!
//! Each notification runs in its own detached task once the lease is released; failures are
//! logged and never reach the caller.

use std::{future::Future, sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    services::notifier::{DeviceNotifier, NotifyResult},
    state::{
        game::{GameActivity, GameState},
        pings::PingOutcome,
    },
};

/// Spawn `delivery` in the background, logging a failure under `event`.
pub fn dispatch<F>(event: &'static str, delivery: F)
where
    F: Future<Output = NotifyResult> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = delivery.await {
            warn!(event, error = %err, "device notification failed");
        }
    });
}

/// Tell every registered device the game has started.
pub fn announce_start(notifier: &Arc<dyn DeviceNotifier>, state: &GameState) {
    let devices = state.registered_devices.values().cloned().collect();
    dispatch("startGame", notifier.send_start_event(devices));
}

/// Tell every registered device the game is over and congratulate the winner, if any.
pub fn announce_completion(notifier: &Arc<dyn DeviceNotifier>, state: &GameState) {
    if state.activity != GameActivity::Complete {
        return;
    }

    let devices = state.registered_devices.values().cloned().collect();
    dispatch("endGame", notifier.send_end_event(devices));

    if let Some(winner) = state
        .winning_device_id
        .as_deref()
        .and_then(|id| state.registered(id))
    {
        dispatch("winner", notifier.send_win_event(winner.clone()));
    }
}

/// Announce what a ping-management pass did: the elimination, the end of the game, or the next
/// challenge.
pub fn announce_ping_outcome(
    notifier: &Arc<dyn DeviceNotifier>,
    state: &GameState,
    outcome: &PingOutcome,
    ping_timeout: Duration,
) {
    if let Some(device) = outcome
        .expired_ping
        .as_ref()
        .and_then(|ping| state.registered(&ping.device_id))
    {
        debug!(device_id = %device.device_id, "device eliminated");
        dispatch("eliminated", notifier.send_eliminated_event(device.clone()));
    }

    if outcome.game_completed {
        announce_completion(notifier, state);
    }

    if let Some(device) = outcome
        .new_ping
        .as_ref()
        .filter(|ping| state.active_devices.contains(&ping.device_id))
        .and_then(|ping| state.registered(&ping.device_id))
    {
        dispatch("ping", notifier.send_ping_event(device.clone(), ping_timeout));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use futures::future::{self, BoxFuture};

    use super::*;
    use crate::state::game::GameDevice;

    /// Event recorded by [`RecordingNotifier`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Start(Vec<String>),
        End(Vec<String>),
        Ping(String, Duration),
        Eliminated(String),
        Win(String),
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<Sent>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn record(&self, event: Sent) -> BoxFuture<'static, NotifyResult> {
            self.sent.lock().unwrap().push(event);
            Box::pin(future::ready(Ok(())))
        }
    }

    fn ids(devices: &[GameDevice]) -> Vec<String> {
        devices.iter().map(|d| d.device_id.clone()).collect()
    }

    impl DeviceNotifier for RecordingNotifier {
        fn send_start_event(&self, devices: Vec<GameDevice>) -> BoxFuture<'static, NotifyResult> {
            self.record(Sent::Start(ids(&devices)))
        }

        fn send_end_event(&self, devices: Vec<GameDevice>) -> BoxFuture<'static, NotifyResult> {
            self.record(Sent::End(ids(&devices)))
        }

        fn send_ping_event(
            &self,
            device: GameDevice,
            timeout: Duration,
        ) -> BoxFuture<'static, NotifyResult> {
            self.record(Sent::Ping(device.device_id, timeout))
        }

        fn send_eliminated_event(&self, device: GameDevice) -> BoxFuture<'static, NotifyResult> {
            self.record(Sent::Eliminated(device.device_id))
        }

        fn send_win_event(&self, device: GameDevice) -> BoxFuture<'static, NotifyResult> {
            self.record(Sent::Win(device.device_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::{testing::*, *};
    use crate::state::game::{GameDevice, PingPongData};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn state(ids: &[&str], active: &[&str]) -> GameState {
        let mut state = GameState::not_started();
        state.activity = GameActivity::InProgress;
        for id in ids {
            state
                .registered_devices
                .insert(id.to_string(), GameDevice::new(*id, "tok"));
        }
        state.active_devices = active.iter().map(|id| id.to_string()).collect();
        state
    }

    fn ping(id: &str) -> PingPongData {
        PingPongData::new(id, OffsetDateTime::UNIX_EPOCH)
    }

    #[tokio::test]
    async fn elimination_and_next_ping_are_announced() {
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn DeviceNotifier> = recorder.clone();
        let outcome = PingOutcome {
            new_ping: Some(ping("b2")),
            expired_ping: Some(ping("a1")),
            game_completed: false,
        };

        let current = state(&["a1", "b2", "c3"], &["b2", "c3"]);
        announce_ping_outcome(&notifier, &current, &outcome, TIMEOUT);

        assert_eq!(
            recorder.sent(),
            vec![
                Sent::Eliminated("a1".into()),
                Sent::Ping("b2".into(), TIMEOUT)
            ]
        );
    }

    #[tokio::test]
    async fn completion_announces_end_and_winner() {
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn DeviceNotifier> = recorder.clone();
        let mut finished = state(&["a1", "b2"], &[]);
        finished.activity = GameActivity::Complete;
        finished.winning_device_id = Some("b2".into());
        let outcome = PingOutcome {
            new_ping: None,
            expired_ping: Some(ping("a1")),
            game_completed: true,
        };

        announce_ping_outcome(&notifier, &finished, &outcome, TIMEOUT);

        assert_eq!(
            recorder.sent(),
            vec![
                Sent::Eliminated("a1".into()),
                Sent::End(vec!["a1".into(), "b2".into()]),
                Sent::Win("b2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn unregistered_devices_are_not_contacted() {
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn DeviceNotifier> = recorder.clone();
        let outcome = PingOutcome {
            new_ping: Some(ping("ghost")),
            expired_ping: Some(ping("gone")),
            game_completed: false,
        };

        announce_ping_outcome(&notifier, &state(&["a1"], &["a1"]), &outcome, TIMEOUT);

        assert!(recorder.sent().is_empty());
    }
}
