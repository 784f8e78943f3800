//! Agent settings loaded from a JSON file.
//!
//! ```json
//! {
//!   "serverUrl": "localhost:8080",
//!   "deviceId": "sensor-42",
//!   "authKey": "0123456789abcdef",
//!   "intervalSeconds": 10
//! }
//! ```
//!
//! `serverAddress` is accepted in place of `serverUrl`. The value is a bare
//! `host[:port]`; the agent builds the full WebSocket URL from it.

use std::{fmt, fs, path::Path, time::Duration};

use loam_core::Credentials;
use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

/// Immutable settings for one agent process.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Server `host[:port]`
    #[serde(alias = "serverAddress")]
    pub server_url: String,
    /// Device identifier sent on every message
    pub device_id: String,
    /// Shared secret used to sign the auth request
    pub auth_key: String,
    /// Seconds between periodic measurements
    pub interval_seconds: u64,
}

impl Settings {
    /// Read and validate a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid JSON,
    /// or fails [`Settings::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        Self::from_json(&text)
    }

    /// Parse and validate settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or missing fields,
    /// and the validation errors of [`Settings::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check field invariants.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] if a string field is empty
    /// - [`ConfigError::InvalidInterval`] if `intervalSeconds` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::MissingField("serverUrl"));
        }
        if self.device_id.trim().is_empty() {
            return Err(ConfigError::MissingField("deviceId"));
        }
        if self.auth_key.is_empty() {
            return Err(ConfigError::MissingField("authKey"));
        }
        if self.interval_seconds == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }

    /// WebSocket endpoint for this device.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("ws://{}/websocket?deviceId={}", self.server_url, self.device_id)
    }

    /// Report interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Credentials for signing the auth request.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.device_id.clone(), self.auth_key.clone())
    }

    /// Log the effective settings (secret excluded).
    pub fn summary(&self) {
        info!(
            server_url = %self.server_url,
            device_id = %self.device_id,
            interval_seconds = self.interval_seconds,
            "device settings"
        );
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("server_url", &self.server_url)
            .field("device_id", &self.device_id)
            .field("auth_key", &format_args!("<redacted {} bytes>", self.auth_key.len()))
            .field("interval_seconds", &self.interval_seconds)
            .finish()
    }
}
