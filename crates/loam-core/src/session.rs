//! Device session state machine.
//!
//! This module implements the protocol layer of one connection: answering
//! the server's welcome with a signed auth request, tracking whether the
//! device is authenticated and claimed, and holding the threshold table.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods accept time as parameter (no stored Environment)
//! - [`Session::handle_message`] returns `Vec<SessionAction>`
//! - Driver code executes actions (send messages, take a reading, start the
//!   report loop)
//!
//! # State Machine
//!
//! ```text
//!                 welcome / send auth
//!                  ┌───────┐
//!                  ↓       │
//! ┌──────────────────┐  auth_success   ┌───────────────┐
//! │ Unauthenticated  │────────────────>│ Authenticated │──┐ config
//! └──────────────────┘                 └───────────────┘<─┘ (thresholds)
//!          │ claimed                        │ claimed, or auth_success{claimed}
//!          ↓                                ↓
//!     claimed=true                   claimed=true, StartReporting
//! ```
//!
//! Every message type is accepted in every state. Only [`Session::reset`]
//! (a new connection) clears `authenticated`.
//!
//! # Actions per message
//!
//! | Message        | Actions                                      |
//! |----------------|----------------------------------------------|
//! | `welcome`      | `Send(auth)`                                 |
//! | `auth_success` | `SendReading`, then `StartReporting` if claimed |
//! | `claimed`      | `StartReporting`                             |
//! | others         | none                                         |

use chrono::NaiveDateTime;
use loam_proto::{ClientMessage, ServerMessage};
use tracing::{debug, info, warn};

use crate::{auth::Credentials, status::Thresholds};

/// Actions returned by the session state machine.
///
/// The driver (the agent's receive loop, or a test) executes these actions
/// in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Send this message to the server
    Send(ClientMessage),

    /// Take one reading and send it, outside the report loop
    SendReading,

    /// Start the periodic report loop (no-op if already running)
    StartReporting,
}

/// Per-connection state. Reset to defaults on every new connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Server accepted our signature
    pub authenticated: bool,
    /// Device is associated with an account
    pub claimed: bool,
    /// Classification bands
    pub thresholds: Thresholds,
}

/// Session state machine
///
/// This is a pure state machine - no I/O, no Environment storage.
/// Time is passed as a parameter to methods that need it.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: Credentials,
    state: SessionState,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials, state: SessionState::default() }
    }

    /// Current state snapshot
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Credentials this session authenticates with
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return to the initial state (new connection).
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }

    /// Process one message from the server and return actions.
    ///
    /// `now` is used to timestamp and sign the auth request.
    pub fn handle_message(
        &mut self,
        message: &ServerMessage,
        now: NaiveDateTime,
    ) -> Vec<SessionAction> {
        match message {
            ServerMessage::Welcome(notice) => {
                info!(server_message = notice.message.as_deref().unwrap_or(""), "server welcome");

                let auth = self.credentials.auth_message(now);
                vec![SessionAction::Send(auth)]
            },

            ServerMessage::AuthSuccess(success) => {
                self.state.authenticated = true;
                self.state.claimed = success.claimed;
                self.state.thresholds.apply(&success.thresholds);

                info!(claimed = success.claimed, "authenticated");

                let mut actions = vec![SessionAction::SendReading];
                if success.claimed {
                    actions.push(SessionAction::StartReporting);
                } else {
                    info!("waiting for device to be claimed");
                }
                actions
            },

            ServerMessage::Claimed(update) => {
                self.state.claimed = true;
                self.state.thresholds = Thresholds::from(update);

                info!(
                    red = self.state.thresholds.red,
                    yellow = self.state.thresholds.yellow,
                    green = self.state.thresholds.green,
                    "device claimed"
                );

                vec![SessionAction::StartReporting]
            },

            ServerMessage::Config(update) => {
                self.state.thresholds = Thresholds::from(update);

                info!(
                    red = self.state.thresholds.red,
                    yellow = self.state.thresholds.yellow,
                    green = self.state.thresholds.green,
                    "thresholds updated"
                );

                vec![]
            },

            ServerMessage::Ack => {
                debug!("measurement acknowledged");
                vec![]
            },

            ServerMessage::Error(notice) => {
                warn!(
                    server_message = notice.message.as_deref().unwrap_or(""),
                    "server reported error"
                );
                vec![]
            },

            ServerMessage::Unknown { kind, raw } => {
                warn!(kind = ?kind, raw = %raw, "ignoring unknown message");
                vec![]
            },
        }
    }
}
