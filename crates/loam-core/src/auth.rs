//! Device credentials and the auth signature.
//!
//! The server recomputes `md5("{deviceId}:{authKey}:{timestamp}")` and
//! compares hex digests, so the digest, separator and hex casing here are
//! fixed by the server rather than chosen by the device.

use std::fmt;

use chrono::NaiveDateTime;
use loam_proto::{Auth, ClientMessage};
use md5::{Digest, Md5};

/// Timestamp layout used on the wire: ISO-8601, local time, microseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Format a wall-clock time for the wire.
#[must_use]
pub fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Compute the lowercase hex MD5 of `device_id:auth_key:timestamp`.
#[must_use]
pub fn signature(device_id: &str, auth_key: &str, timestamp: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(device_id.as_bytes());
    hasher.update(b":");
    hasher.update(auth_key.as_bytes());
    hasher.update(b":");
    hasher.update(timestamp.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identity the device authenticates with.
///
/// # Security
///
/// - **Debug Redaction**: The `Debug` impl redacts `auth_key` so that the
///   shared secret never reaches the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    device_id: String,
    auth_key: String,
}

impl Credentials {
    /// Create credentials from a device id and its shared key.
    pub fn new(device_id: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self { device_id: device_id.into(), auth_key: auth_key.into() }
    }

    /// Device identifier.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Sign a wire timestamp with this device's key.
    #[must_use]
    pub fn sign(&self, timestamp: &str) -> String {
        signature(&self.device_id, &self.auth_key, timestamp)
    }

    /// Build the `auth` message for the given moment.
    #[must_use]
    pub fn auth_message(&self, now: NaiveDateTime) -> ClientMessage {
        let timestamp = format_timestamp(now);
        let signature = self.sign(&timestamp);

        ClientMessage::Auth(Auth { device_id: self.device_id.clone(), timestamp, signature })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("device_id", &self.device_id)
            .field("auth_key", &format_args!("<redacted {} bytes>", self.auth_key.len()))
            .finish()
    }
}
