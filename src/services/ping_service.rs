use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    dto::{
        game::GameStateResponse,
        ping::{PingResponse, PongResponse},
    },
    error::ServiceError,
    services::{game_service::follow_up_ping, notifications::announce_ping_outcome},
    state::{SharedState, game::GameState, pings::PingOutcome},
};

/// Run one ping-management pass and announce its outcome to the devices involved.
pub async fn manage_and_announce(
    state: &SharedState,
    device_id: Option<String>,
) -> Result<(GameState, PingOutcome), ServiceError> {
    let config = state.config();
    let (game, outcome) = state
        .game()
        .manage_active_ping(config.ping_max_age, device_id)
        .await?;

    if let Some(expired) = &outcome.expired_ping {
        info!(device_id = %expired.device_id, "ping expired; device eliminated");
    }
    if outcome.game_completed {
        info!(winner = ?game.winning_device_id, "game completed by elimination");
    }
    if let Some(ping) = &outcome.new_ping {
        debug!(device_id = %ping.device_id, "ping issued");
    }

    announce_ping_outcome(state.notifier(), &game, &outcome, config.ping_timeout);
    Ok((game, outcome))
}

/// Manual ping-management trigger, optionally challenging `device_id`.
pub async fn trigger_ping(
    state: &SharedState,
    device_id: Option<String>,
) -> Result<PingResponse, ServiceError> {
    let (game, outcome) = manage_and_announce(state, device_id.clone()).await?;

    if let Some(requested) = device_id {
        if game.registered(&requested).is_none() {
            return Err(ServiceError::NotFound(format!(
                "device `{requested}` is not registered"
            )));
        }
    }

    Ok((game, outcome).into())
}

/// Record a pong; an accepted pong immediately challenges the next device.
pub async fn record_pong(
    state: &SharedState,
    device_id: String,
) -> Result<PongResponse, ServiceError> {
    let (game, accepted) = state
        .game()
        .record_pong(device_id.clone(), state.config().ping_max_age)
        .await?;

    if !accepted {
        debug!(device_id = %device_id, "pong rejected");
        return Ok(PongResponse {
            accepted,
            state: game.into(),
        });
    }

    debug!(device_id = %device_id, "pong accepted");
    let latest = follow_up_ping(state, game).await;
    Ok(PongResponse {
        accepted,
        state: GameStateResponse::from(latest),
    })
}

/// Periodically expire stale pings and keep one outstanding while a game is running.
pub async fn run(state: SharedState) {
    let mut ticker = time::interval(state.config().ping_manager_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval = ?state.config().ping_manager_interval,
        "ping manager started"
    );

    loop {
        ticker.tick().await;
        tick(&state).await;
    }
}

async fn tick(state: &SharedState) {
    // Ping management is a no-op unless a game is running.
    match manage_and_announce(state, None).await {
        Ok(_) => {}
        Err(ServiceError::Concurrency(message)) => {
            info!(%message, "game state busy; retrying on next tick");
        }
        Err(err) => warn!(error = %err, "ping manager tick failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        dto::{device::RegisterDeviceRequest, game::GameActivityDto},
        services::{
            game_service::{self, StartOutcome},
            notifications::testing::{RecordingNotifier, Sent},
        },
        state::in_memory,
    };

    fn setup(ping_max_age: Duration) -> (SharedState, Arc<RecordingNotifier>) {
        let recorder = Arc::new(RecordingNotifier::default());
        let config = AppConfig {
            ping_max_age,
            ..AppConfig::default()
        };
        (in_memory(recorder.clone(), config), recorder)
    }

    async fn started_with(state: &SharedState, ids: &[&str]) -> String {
        for id in ids {
            let request = RegisterDeviceRequest {
                device_id: id.to_string(),
                access_token: "tok".into(),
            };
            game_service::register_device(state, request).await.unwrap();
        }
        match game_service::start_game(state).await.unwrap() {
            StartOutcome::Started(game) => game.active_ping.unwrap().device_id,
            StartOutcome::Refused(_) => panic!("start refused"),
        }
    }

    #[tokio::test]
    async fn unanswered_pings_eliminate_until_one_device_wins() {
        let (state, recorder) = setup(Duration::ZERO);
        let first = started_with(&state, &["a1", "b2", "c3"]).await;

        let (game, outcome) = manage_and_announce(&state, None).await.unwrap();
        assert_eq!(outcome.expired_ping.unwrap().device_id, first);
        assert!(!outcome.game_completed);
        assert!(!game.active_devices.contains(&first));
        let second = outcome.new_ping.unwrap().device_id;
        assert_ne!(second, first);

        let (game, outcome) = manage_and_announce(&state, None).await.unwrap();
        assert_eq!(outcome.expired_ping.unwrap().device_id, second);
        assert!(outcome.game_completed);
        assert!(outcome.new_ping.is_none());

        let winner = game.winning_device_id.clone().unwrap();
        assert!(winner != first && winner != second);
        assert!(game.active_devices.is_empty());

        let sent = recorder.sent();
        assert!(sent.contains(&Sent::Eliminated(first)));
        assert!(sent.contains(&Sent::Eliminated(second)));
        assert!(sent.contains(&Sent::Win(winner)));
        assert!(sent.iter().any(|event| matches!(event, Sent::End(_))));
    }

    #[tokio::test]
    async fn answered_ping_is_followed_by_a_new_one() {
        let (state, _) = setup(Duration::from_secs(30));
        let pinged = started_with(&state, &["a1", "b2"]).await;

        let response = record_pong(&state, pinged).await.unwrap();
        assert!(response.accepted);
        assert_eq!(response.state.pongs_received.len(), 1);
        assert_eq!(response.state.pings_sent.len(), 2);
        assert!(response.state.active_ping.is_some());
        assert_eq!(response.state.active_devices.len(), 2);
    }

    #[tokio::test]
    async fn pong_from_a_device_not_pinged_is_rejected() {
        let (state, _) = setup(Duration::from_secs(30));
        let pinged = started_with(&state, &["a1", "b2"]).await;
        let other = if pinged == "a1" { "b2" } else { "a1" };

        let response = record_pong(&state, other.to_string()).await.unwrap();
        assert!(!response.accepted);
        assert!(response.state.pongs_received.is_empty());
        assert_eq!(response.state.active_ping.unwrap().device_id, pinged);
    }

    #[tokio::test]
    async fn pong_outside_a_game_is_rejected() {
        let (state, _) = setup(Duration::from_secs(30));
        let response = record_pong(&state, "a1".into()).await.unwrap();
        assert!(!response.accepted);
        assert_eq!(response.state.activity, GameActivityDto::NotStarted);
    }

    #[tokio::test]
    async fn fresh_ping_is_left_alone() {
        let (state, recorder) = setup(Duration::from_secs(30));
        let pinged = started_with(&state, &["a1", "b2"]).await;
        let before = recorder.sent().len();

        let (game, outcome) = manage_and_announce(&state, None).await.unwrap();
        assert_eq!(outcome, PingOutcome::default());
        assert_eq!(game.active_ping.unwrap().device_id, pinged);
        assert_eq!(recorder.sent().len(), before);
    }

    #[tokio::test]
    async fn targeting_an_unknown_device_is_not_found() {
        let (state, _) = setup(Duration::from_secs(30));
        started_with(&state, &["a1", "b2"]).await;

        let err = trigger_ping(&state, Some("zz9".into())).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn manager_tick_ignores_idle_games() {
        let (state, recorder) = setup(Duration::ZERO);
        tick(&state).await;

        let game = state.game().get_state().await.unwrap();
        assert!(game.pings_sent.is_empty());
        assert!(recorder.sent().is_empty());
    }

    #[tokio::test]
    async fn manager_tick_expires_the_stale_ping_of_a_running_game() {
        let (state, recorder) = setup(Duration::ZERO);
        let pinged = started_with(&state, &["a1", "b2", "c3"]).await;

        tick(&state).await;

        let game = state.game().get_state().await.unwrap();
        assert!(!game.active_devices.contains(&pinged));
        assert_eq!(game.pings_sent.len(), 2);
        assert!(recorder.sent().contains(&Sent::Eliminated(pinged)));
    }
}
