//! JSON message types for both directions of the device channel.
//!
//! Outbound messages use serde's internally tagged representation, so an
//! [`Auth`] serializes as `{"type":"auth","deviceId":..,...}`.
//!
//! Inbound messages are decoded in two steps: first into a generic JSON
//! object to read the `type` discriminator, then into the payload struct for
//! that type. This keeps unknown types decodable (they become
//! [`ServerMessage::Unknown`]) while still rejecting malformed payloads of
//! known types.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::errors::{ProtocolError, Result};

/// Device authentication request, sent in reply to `welcome`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    /// Device identifier
    pub device_id: String,
    /// ISO-8601 timestamp that was signed
    pub timestamp: String,
    /// Hex digest over `deviceId:authKey:timestamp`
    pub signature: String,
}

/// A single soil-moisture reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Device identifier
    pub device_id: String,
    /// Moisture level in percent, 0..=100
    pub moisture_level: u8,
    /// ISO-8601 timestamp of the reading
    pub timestamp: String,
}

/// Messages sent from the device to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Authentication request
    Auth(Auth),
    /// Moisture reading
    Measurement(Measurement),
}

impl ClientMessage {
    /// Serialize to the JSON text carried by one transport frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse a device message (server side and test harness use).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidJson`] if the text is not a valid
    /// `auth` or `measurement` record.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))
    }

    /// Wire name of this message's `type`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Measurement(_) => "measurement",
        }
    }
}

/// Optional threshold fields carried by `claimed`, `config` and
/// `auth_success`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    /// Upper bound of the DRY band
    #[serde(rename = "thresholdRed", default, skip_serializing_if = "Option::is_none")]
    pub red: Option<i64>,
    /// Upper bound of the LOW band
    #[serde(rename = "thresholdYellow", default, skip_serializing_if = "Option::is_none")]
    pub yellow: Option<i64>,
    /// Upper bound of the GOOD band
    #[serde(rename = "thresholdGreen", default, skip_serializing_if = "Option::is_none")]
    pub green: Option<i64>,
}

impl ThresholdUpdate {
    /// Returns true if no threshold field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.red.is_none() && self.yellow.is_none() && self.green.is_none()
    }
}

/// Successful authentication reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccess {
    /// Whether the device is already claimed by an account; absent or
    /// `null` means not claimed
    #[serde(default, deserialize_with = "null_as_false")]
    pub claimed: bool,
    /// Thresholds, if the server chose to include them
    #[serde(flatten)]
    pub thresholds: ThresholdUpdate,
}

/// Free-form text carried by `welcome` and `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Messages pushed by the server to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Greeting sent right after the connection opens
    Welcome(Notice),
    /// Authentication accepted
    AuthSuccess(AuthSuccess),
    /// Device has been claimed; carries its thresholds
    Claimed(ThresholdUpdate),
    /// Threshold reconfiguration
    Config(ThresholdUpdate),
    /// Measurement acknowledged
    Ack,
    /// Server-reported error
    Error(Notice),
    /// Any other record, including one without a `type` field
    Unknown {
        /// Value of the `type` field, if it was a string
        kind: Option<String>,
        /// The whole record, for logging
        raw: Value,
    },
}

impl ServerMessage {
    /// Decode one inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidJson`] if the text is not JSON
    /// - [`ProtocolError::NotAnObject`] if the JSON is not an object
    /// - [`ProtocolError::InvalidPayload`] if a known type has badly typed
    ///   fields
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`ServerMessage::decode`], minus JSON syntax errors.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(fields) = &value else {
            return Err(ProtocolError::NotAnObject);
        };

        let kind = fields.get("type").and_then(Value::as_str).map(str::to_owned);

        let message = match kind.as_deref() {
            Some("welcome") => Self::Welcome(payload("welcome", value)?),
            Some("auth_success") => Self::AuthSuccess(payload("auth_success", value)?),
            Some("claimed") => Self::Claimed(payload("claimed", value)?),
            Some("config") => Self::Config(payload("config", value)?),
            Some("ack") => Self::Ack,
            Some("error") => Self::Error(payload("error", value)?),
            _ => Self::Unknown { kind: kind.clone(), raw: value },
        };

        Ok(message)
    }

    /// Encode to JSON text (server side and test harness use).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if a payload fails to serialize.
    pub fn encode(&self) -> Result<String> {
        let value = match self {
            Self::Welcome(notice) => tagged("welcome", notice)?,
            Self::AuthSuccess(success) => tagged("auth_success", success)?,
            Self::Claimed(update) => tagged("claimed", update)?,
            Self::Config(update) => tagged("config", update)?,
            Self::Ack => tagged("ack", &Map::new())?,
            Self::Error(notice) => tagged("error", notice)?,
            Self::Unknown { raw, .. } => raw.clone(),
        };

        serde_json::to_string(&value).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Wire name of this message's `type`, or `None` for a record without one.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Welcome(_) => Some("welcome"),
            Self::AuthSuccess(_) => Some("auth_success"),
            Self::Claimed(_) => Some("claimed"),
            Self::Config(_) => Some("config"),
            Self::Ack => Some("ack"),
            Self::Error(_) => Some("error"),
            Self::Unknown { kind, .. } => kind.as_deref(),
        }
    }
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn payload<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ProtocolError::InvalidPayload { kind, reason: e.to_string() })
}

fn tagged<T: Serialize>(kind: &str, payload: &T) -> Result<Value> {
    let mut value =
        serde_json::to_value(payload).map_err(|e| ProtocolError::Encode(e.to_string()))?;

    match &mut value {
        Value::Object(fields) => {
            fields.insert("type".to_string(), Value::String(kind.to_string()));
            Ok(value)
        },
        _ => Err(ProtocolError::Encode(format!("{kind} payload is not an object"))),
    }
}
