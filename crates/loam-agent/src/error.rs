//! Agent error types.

use std::{io, path::PathBuf};

use loam_core::TransportError;
use loam_proto::ProtocolError;
use thiserror::Error;

/// Why a session ended. Every variant is recoverable by reconnecting.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Connect, read or write failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound message could not be encoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl AgentError {
    /// Whether the failure is an ordinary network hiccup rather than a bug.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_transient(),
            Self::Protocol(_) => false,
        }
    }
}

/// Settings could not be loaded. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Settings file is not valid JSON for the settings schema
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required field is empty
    #[error("missing required setting: {0}")]
    MissingField(&'static str),

    /// `intervalSeconds` must be positive
    #[error("intervalSeconds must be greater than zero")]
    InvalidInterval,
}
