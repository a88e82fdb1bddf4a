//! Outbound calls to the physical buttons through their cloud webhook.

use std::{fmt, sync::Arc, time::Duration};

use futures::future::{BoxFuture, join_all};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::state::game::GameDevice;

/// Failures while delivering an event to a device. Only ever logged.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Building the HTTP client failed.
    #[error("failed to build device webhook client")]
    ClientBuilder {
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The webhook call could not be sent.
    #[error("failed to send `{operation}` to device `{device_id}`")]
    Request {
        /// Device function being called.
        operation: DeviceOperation,
        /// Target device.
        device_id: String,
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The webhook answered with a non-success status.
    #[error("device webhook answered {status} to `{operation}` for device `{device_id}`")]
    Status {
        /// Device function being called.
        operation: DeviceOperation,
        /// Target device.
        device_id: String,
        /// Status the webhook answered with.
        status: StatusCode,
    },
}

/// Function names exposed by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOperation {
    /// `startGame`: a game began.
    StartGame,
    /// `endGame`: the game is over.
    EndGame,
    /// `ping`: the device must answer with a pong.
    Ping,
    /// `eliminated`: the device is out.
    Eliminated,
    /// `winner`: the device won.
    Winner,
}

impl DeviceOperation {
    /// Function name as exposed by the firmware.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceOperation::StartGame => "startGame",
            DeviceOperation::EndGame => "endGame",
            DeviceOperation::Ping => "ping",
            DeviceOperation::Eliminated => "eliminated",
            DeviceOperation::Winner => "winner",
        }
    }
}

impl fmt::Display for DeviceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of delivering one event.
pub type NotifyResult = Result<(), NotifyError>;

/// Sends game events to devices.
pub trait DeviceNotifier: Send + Sync {
    /// Tell every device that the game started.
    fn send_start_event(&self, devices: Vec<GameDevice>) -> BoxFuture<'static, NotifyResult>;
    /// Tell every device that the game ended.
    fn send_end_event(&self, devices: Vec<GameDevice>) -> BoxFuture<'static, NotifyResult>;
    /// Challenge `device`, telling it how long it has to answer.
    fn send_ping_event(
        &self,
        device: GameDevice,
        timeout: Duration,
    ) -> BoxFuture<'static, NotifyResult>;
    /// Tell `device` it was eliminated.
    fn send_eliminated_event(&self, device: GameDevice) -> BoxFuture<'static, NotifyResult>;
    /// Tell `device` it won.
    fn send_win_event(&self, device: GameDevice) -> BoxFuture<'static, NotifyResult>;
}

/// [`DeviceNotifier`] calling Particle-style cloud functions: one form POST per device and
/// operation, with the argument in the `args` field.
#[derive(Clone)]
pub struct ParticleDeviceNotifier {
    client: Client,
    url_template: Arc<str>,
}

impl ParticleDeviceNotifier {
    /// Build the HTTP client for `url_template` (see [`render_url`] for placeholders).
    pub fn new(url_template: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| NotifyError::ClientBuilder { source })?;
        Ok(Self {
            client,
            url_template: Arc::from(url_template.into()),
        })
    }

    fn device_url(&self, device: &GameDevice, operation: DeviceOperation) -> String {
        render_url(&self.url_template, device, operation)
    }

    async fn call(
        &self,
        device: &GameDevice,
        operation: DeviceOperation,
        args: String,
    ) -> NotifyResult {
        debug!(device_id = %device.device_id, %operation, "calling device function");
        let response = self
            .client
            .post(self.device_url(device, operation))
            .form(&[("args", args)])
            .send()
            .await
            .map_err(|source| NotifyError::Request {
                operation,
                device_id: device.device_id.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status {
                operation,
                device_id: device.device_id.clone(),
                status,
            })
        }
    }

    fn broadcast(
        &self,
        devices: Vec<GameDevice>,
        operation: DeviceOperation,
    ) -> BoxFuture<'static, NotifyResult> {
        let notifier = self.clone();
        Box::pin(async move {
            let calls = devices
                .iter()
                .map(|device| notifier.call(device, operation, String::new()));
            join_all(calls).await.into_iter().collect()
        })
    }

    fn single(
        &self,
        device: GameDevice,
        operation: DeviceOperation,
        args: String,
    ) -> BoxFuture<'static, NotifyResult> {
        let notifier = self.clone();
        Box::pin(async move { notifier.call(&device, operation, args).await })
    }
}

impl DeviceNotifier for ParticleDeviceNotifier {
    fn send_start_event(&self, devices: Vec<GameDevice>) -> BoxFuture<'static, NotifyResult> {
        self.broadcast(devices, DeviceOperation::StartGame)
    }

    fn send_end_event(&self, devices: Vec<GameDevice>) -> BoxFuture<'static, NotifyResult> {
        self.broadcast(devices, DeviceOperation::EndGame)
    }

    fn send_ping_event(
        &self,
        device: GameDevice,
        timeout: Duration,
    ) -> BoxFuture<'static, NotifyResult> {
        self.single(device, DeviceOperation::Ping, timeout.as_millis().to_string())
    }

    fn send_eliminated_event(&self, device: GameDevice) -> BoxFuture<'static, NotifyResult> {
        self.single(device, DeviceOperation::Eliminated, String::new())
    }

    fn send_win_event(&self, device: GameDevice) -> BoxFuture<'static, NotifyResult> {
        self.single(device, DeviceOperation::Winner, String::new())
    }
}

fn render_url(template: &str, device: &GameDevice, operation: DeviceOperation) -> String {
    template
        .replace("{device}", &device.device_id)
        .replace("{operation}", operation.as_str())
        .replace("{token}", &device.access_token)
}
