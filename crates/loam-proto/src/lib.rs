//! # Loam Protocol: Wire Format
//!
//! Messages exchanged between a soil-moisture device and its server over a
//! WebSocket text channel. Every message is a JSON object carrying a `type`
//! discriminator.
//!
//! ## Directions
//!
//! - [`ClientMessage`] (device → server): `auth`, `measurement`
//! - [`ServerMessage`] (server → device): `welcome`, `auth_success`,
//!   `claimed`, `config`, `ack`, `error`, plus anything else, which decodes
//!   to [`ServerMessage::Unknown`] instead of failing
//!
//! ## Decoding Policy
//!
//! - Unknown *types* are not errors. The device logs and ignores them.
//! - Unknown *fields* are ignored. The server attaches extras such as
//!   `needsAuth` or `status`.
//! - Known types with badly typed fields (e.g. a string threshold) are
//!   rejected with [`ProtocolError::InvalidPayload`] so that a single bad
//!   message can be dropped without touching session state.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod messages;

pub use errors::{ProtocolError, Result};
pub use messages::{
    Auth, AuthSuccess, ClientMessage, Measurement, Notice, ServerMessage, ThresholdUpdate,
};
