//! Application-level configuration loading: storage container, lease and ping timings, and the
//! device webhook address.

use std::{
    env, fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use thiserror::Error;
use tracing::info;

use crate::state::coordinator::{InvalidLeaseDuration, LeaseDuration};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BUTTON_PONG_CONFIG_PATH";

/// Container holding the game record when none is configured.
pub const DEFAULT_STORAGE_CONTAINER: &str = "buttonpong";
/// Particle cloud function endpoint.
pub const DEFAULT_WEBHOOK_TEMPLATE: &str =
    "https://api.particle.io/v1/devices/{device}/{operation}?access_token={token}";

/// Failures while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file `{path}`")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not a valid configuration document.
    #[error("failed to parse config file `{path}`")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// Lease duration outside the accepted range.
    #[error(transparent)]
    LeaseDuration(#[from] InvalidLeaseDuration),
    /// A value parsed but is not acceptable.
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Storage container (database, collection) holding the game record.
    pub storage_container: String,
    /// How long one operation may hold the game record.
    pub lease_duration: LeaseDuration,
    /// Age after which an unanswered ping eliminates its device.
    pub ping_max_age: Duration,
    /// Answer window announced to devices along with each ping.
    pub ping_timeout: Duration,
    /// Period of the background ping manager.
    pub ping_manager_interval: Duration,
    /// Webhook URL with `{device}`, `{operation}` and `{token}` placeholders.
    pub device_webhook_template: String,
}

impl AppConfig {
    /// Load the configuration from disk, using built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let config = Self::from_json(&path, &contents)?;
                info!(
                    path = %path.display(),
                    container = %config.storage_container,
                    "loaded configuration"
                );
                Ok(config)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Parse and validate a JSON configuration document read from `path`.
    pub fn from_json(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let raw =
            serde_json::from_str::<RawConfig>(contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        raw.try_into()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_container: DEFAULT_STORAGE_CONTAINER.to_string(),
            lease_duration: LeaseDuration::default(),
            ping_max_age: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(5),
            ping_manager_interval: Duration::from_secs(5),
            device_webhook_template: DEFAULT_WEBHOOK_TEMPLATE.to_string(),
        }
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    storage_container: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    lease_duration_seconds: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    ping_max_age_seconds: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    ping_timeout_seconds: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    ping_manager_interval_seconds: Duration,
    device_webhook_template: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            storage_container: defaults.storage_container,
            lease_duration_seconds: defaults.lease_duration.get(),
            ping_max_age_seconds: defaults.ping_max_age,
            ping_timeout_seconds: defaults.ping_timeout,
            ping_manager_interval_seconds: defaults.ping_manager_interval,
            device_webhook_template: defaults.device_webhook_template,
        }
    }
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        if value.storage_container.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage_container",
                reason: "must not be empty",
            });
        }
        if value.ping_manager_interval_seconds.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "ping_manager_interval_seconds",
                reason: "must be at least one second",
            });
        }

        Ok(Self {
            storage_container: value.storage_container,
            lease_duration: LeaseDuration::new(value.lease_duration_seconds)?,
            ping_max_age: value.ping_max_age_seconds,
            ping_timeout: value.ping_timeout_seconds,
            ping_manager_interval: value.ping_manager_interval_seconds,
            device_webhook_template: value.device_webhook_template,
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
