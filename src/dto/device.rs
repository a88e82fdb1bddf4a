//! DTOs for device registration.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_device_id,
    state::game::{DeviceState, GameDevice},
};

/// Payload announcing a button that wants to take part in the next game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    /// Device identifier (letters, digits, `-` and `_`).
    #[validate(custom(function = "validate_device_id"))]
    pub device_id: String,
    /// Token used to call the device's cloud functions.
    #[validate(length(min = 1))]
    pub access_token: String,
}

impl From<RegisterDeviceRequest> for GameDevice {
    fn from(value: RegisterDeviceRequest) -> Self {
        GameDevice::new(value.device_id, value.access_token)
    }
}

/// Membership of a device in the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DeviceStatus {
    /// Membership is inconsistent.
    Unknown,
    /// Registered and still in play.
    RegisteredActive,
    /// Registered but eliminated.
    RegisteredInactive,
    /// Not part of the game.
    NotInGame,
}

impl From<DeviceState> for DeviceStatus {
    fn from(value: DeviceState) -> Self {
        match value {
            DeviceState::Unknown => DeviceStatus::Unknown,
            DeviceState::RegisteredActive => DeviceStatus::RegisteredActive,
            DeviceState::RegisteredInactive => DeviceStatus::RegisteredInactive,
            DeviceState::NotInGame => DeviceStatus::NotInGame,
        }
    }
}

/// Public view of a device; the access token is never echoed back.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    /// Device identifier.
    pub device_id: String,
}

/// Membership of a device after a roster change.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceStatusResponse {
    /// Device concerned.
    pub device: DeviceSummary,
    /// Its resulting membership.
    pub status: DeviceStatus,
}

impl DeviceStatusResponse {
    /// Response for `device_id` in `status`.
    pub fn new(device_id: impl Into<String>, status: DeviceState) -> Self {
        Self {
            device: DeviceSummary {
                device_id: device_id.into(),
            },
            status: status.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn registration_requires_valid_id_and_token() {
        let valid = RegisterDeviceRequest {
            device_id: "a1".into(),
            access_token: "tok".into(),
        };
        assert!(valid.validate().is_ok());

        let bad_id = RegisterDeviceRequest {
            device_id: "a/1".into(),
            access_token: "tok".into(),
        };
        assert!(bad_id.validate().is_err());

        let no_token = RegisterDeviceRequest {
            device_id: "a1".into(),
            access_token: String::new(),
        };
        assert!(no_token.validate().is_err());
    }

    #[test]
    fn status_response_hides_the_token() {
        let response = DeviceStatusResponse::new("a1", DeviceState::RegisteredActive);
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({ "device": { "deviceId": "a1" }, "status": "RegisteredActive" })
        );
    }
}
