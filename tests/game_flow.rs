//! End-to-end game flows against the library crate over the in-memory lease store.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use button_pong_back::{
    config::AppConfig,
    dao::lease_store::{LeaseStore, memory::InMemoryLeaseStore},
    dto::{device::RegisterDeviceRequest, game::GameActivityDto},
    error::ServiceError,
    services::{
        game_service::{self, StartOutcome},
        notifier::{DeviceNotifier, NotifyResult},
        ping_service,
    },
    state::{
        AppState, SharedState, coordinator::LeaseCoordinator, game::GameDevice,
        manager::GameStateManager,
    },
};
use futures::future::{self, BoxFuture};

/// Notifier that keeps `operation:device` lines instead of calling webhooks.
#[derive(Default)]
struct Recorder {
    lines: Mutex<Vec<String>>,
}

impl Recorder {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    fn push(&self, operation: &str, devices: &[GameDevice]) -> BoxFuture<'static, NotifyResult> {
        let mut lines = self.lines.lock().unwrap();
        for device in devices {
            lines.push(format!("{operation}:{}", device.device_id));
        }
        Box::pin(future::ready(Ok(())))
    }
}

impl DeviceNotifier for Recorder {
    fn send_start_event(&self, devices: Vec<GameDevice>) -> BoxFuture<'static, NotifyResult> {
        self.push("startGame", &devices)
    }

    fn send_end_event(&self, devices: Vec<GameDevice>) -> BoxFuture<'static, NotifyResult> {
        self.push("endGame", &devices)
    }

    fn send_ping_event(
        &self,
        device: GameDevice,
        _timeout: Duration,
    ) -> BoxFuture<'static, NotifyResult> {
        self.push("ping", &[device])
    }

    fn send_eliminated_event(&self, device: GameDevice) -> BoxFuture<'static, NotifyResult> {
        self.push("eliminated", &[device])
    }

    fn send_win_event(&self, device: GameDevice) -> BoxFuture<'static, NotifyResult> {
        self.push("winner", &[device])
    }
}

fn app(store: Arc<dyn LeaseStore>, config: AppConfig, recorder: Arc<Recorder>) -> SharedState {
    let coordinator = LeaseCoordinator::new(
        store,
        config.storage_container.clone(),
        config.lease_duration,
    );
    AppState::new(GameStateManager::new(coordinator), recorder, config)
}

fn request(id: &str) -> RegisterDeviceRequest {
    RegisterDeviceRequest {
        device_id: id.to_string(),
        access_token: format!("token-{id}"),
    }
}

async fn register_with_retry(state: &SharedState, id: &str) {
    loop {
        match game_service::register_device(state, request(id)).await {
            Ok(_) => return,
            Err(ServiceError::Concurrency(_)) => tokio::task::yield_now().await,
            Err(err) => panic!("registering {id}: {err}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn instances_sharing_a_store_never_lose_registrations() {
    let store: Arc<dyn LeaseStore> = Arc::new(InMemoryLeaseStore::new());
    let first = app(store.clone(), AppConfig::default(), Arc::default());
    let second = app(store, AppConfig::default(), Arc::default());

    let handles: Vec<_> = (0..12)
        .map(|n| {
            let state = if n % 2 == 0 {
                first.clone()
            } else {
                second.clone()
            };
            tokio::spawn(async move { register_with_retry(&state, &format!("btn-{n:02}")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let seen_by_first = game_service::game_status(&first).await.unwrap();
    let seen_by_second = game_service::game_status(&second).await.unwrap();
    assert_eq!(seen_by_first.registered_devices.len(), 12);
    assert_eq!(seen_by_second.active_devices.len(), 12);
}

#[tokio::test]
async fn three_devices_play_until_one_survives() {
    let recorder = Arc::new(Recorder::default());
    let config = AppConfig {
        ping_max_age: Duration::ZERO,
        ..AppConfig::default()
    };
    let state = app(Arc::new(InMemoryLeaseStore::new()), config, recorder.clone());

    for id in ["red", "green", "blue"] {
        game_service::register_device(&state, request(id))
            .await
            .unwrap();
    }
    let started = match game_service::start_game(&state).await.unwrap() {
        StartOutcome::Started(game) => game,
        StartOutcome::Refused(_) => panic!("three devices are enough to start"),
    };
    let mut eliminated = vec![started.active_ping.unwrap().device_id];

    // Every pass expires the outstanding ping because the maximum age is zero.
    let first_pass = ping_service::trigger_ping(&state, None).await.unwrap();
    assert_eq!(first_pass.expired_ping.unwrap().device_id, eliminated[0]);
    assert!(!first_pass.game_completed);
    eliminated.push(first_pass.new_ping.unwrap().device_id);

    let last_pass = ping_service::trigger_ping(&state, None).await.unwrap();
    assert!(last_pass.game_completed);
    assert!(last_pass.new_ping.is_none());

    let game = last_pass.state;
    assert_eq!(game.activity, GameActivityDto::Complete);
    assert!(game.active_devices.is_empty());
    assert!(game.active_ping.is_none());
    let winner = game.winning_device_id.unwrap();
    assert!(!eliminated.contains(&winner));
    assert_eq!(game.pings_sent.len(), 2);

    let lines = recorder.lines();
    for id in &eliminated {
        assert!(lines.contains(&format!("eliminated:{id}")));
    }
    assert!(lines.contains(&format!("winner:{winner}")));
    assert_eq!(
        lines.iter().filter(|line| line.starts_with("endGame:")).count(),
        3
    );

    // A finished game can be replayed without registering again.
    let replay = match game_service::start_game(&state).await.unwrap() {
        StartOutcome::Started(game) => game,
        StartOutcome::Refused(_) => panic!("a finished game can be restarted"),
    };
    assert_eq!(replay.active_devices.len(), 3);
    assert!(replay.winning_device_id.is_none());

    let fresh = game_service::reset_game(&state).await.unwrap();
    assert_eq!(fresh.activity, GameActivityDto::NotStarted);
    assert!(fresh.registered_devices.is_empty());
}

#[tokio::test]
async fn vanished_container_is_recreated() {
    let store = Arc::new(InMemoryLeaseStore::new());
    let state = app(store.clone(), AppConfig::default(), Arc::default());

    register_with_retry(&state, "red").await;
    assert!(store.remove_container(&state.config().storage_container));

    let game = game_service::game_status(&state).await.unwrap();
    assert_eq!(game.activity, GameActivityDto::NotStarted);
    assert!(game.registered_devices.is_empty());

    register_with_retry(&state, "green").await;
    let game = game_service::game_status(&state).await.unwrap();
    assert_eq!(game.registered_devices.len(), 1);
}
