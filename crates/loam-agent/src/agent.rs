//! Device agent: connection supervisor and receive loop.
//!
//! # Architecture
//!
//! ```text
//! run() ──> supervise ──> run_session ──> receive loop ──> Session::handle_message
//!              ↑  │                            │                  │
//!              │  │ backoff 5s                 │ actions          │
//!              └──┘                            ↓                  │
//!                                         execute ──> Reporter ───┘ (spawned task)
//! ```
//!
//! The supervisor owns the connection for the current attempt. The receive
//! loop is the only writer of [`SessionState`]; it publishes every change on
//! a watch channel read by the report loop and by [`DeviceAgent::subscribe`]
//! observers. Every suspension point races the [`StopSignal`].

use std::{sync::Arc, time::Duration};

use loam_core::{
    Session, SessionAction, SessionState,
    env::Environment,
    transport::{MessageReceiver, MessageSender, Transport},
};
use loam_proto::ServerMessage;
use tokio::sync::{Mutex, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    error::AgentError,
    report::{ReportContext, Reporter, SharedSender, send_message, send_reading},
    settings::Settings,
    stop::StopSignal,
};

/// Fixed wait between connection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on the graceful close after the stop signal.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// A soil-moisture device.
///
/// Generic over the transport and environment so the same driver runs
/// against a real WebSocket server or inside a simulation.
pub struct DeviceAgent<T, E> {
    settings: Settings,
    transport: T,
    env: E,
    stop: StopSignal,
    state: watch::Sender<SessionState>,
}

impl<T, E> DeviceAgent<T, E>
where
    T: Transport,
    E: Environment,
{
    /// Assemble an agent. Nothing happens until [`DeviceAgent::run`].
    pub fn new(settings: Settings, transport: T, env: E, stop: StopSignal) -> Self {
        let (state, _rx) = watch::channel(SessionState::default());
        Self { settings, transport, env, stop, state }
    }

    /// Observe session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// The stop signal this agent obeys.
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Settings the agent was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Connect, serve and reconnect until the stop signal is raised.
    ///
    /// Session failures are logged and retried after [`RECONNECT_DELAY`];
    /// they never escape this function.
    pub async fn run(&self) {
        let span = info_span!("device", device_id = %self.settings.device_id);
        self.supervise().instrument(span).await;
    }

    async fn supervise(&self) {
        let mut session = Session::new(self.settings.credentials());
        let mut attempt: u64 = 0;

        while !self.stop.is_raised() {
            attempt += 1;

            match self.run_session(&mut session, attempt).await {
                Ok(()) => info!(attempt, "session ended"),
                Err(e) if e.is_transient() => warn!(attempt, error = %e, "session failed"),
                Err(e) => error!(attempt, error = %e, "session failed"),
            }

            if self.stop.is_raised() {
                break;
            }

            info!(delay_secs = RECONNECT_DELAY.as_secs(), "reconnecting after backoff");
            tokio::select! {
                () = self.env.sleep(RECONNECT_DELAY) => {},
                () = self.stop.raised() => break,
            }
        }

        info!("agent stopped");
    }

    async fn run_session(&self, session: &mut Session, attempt: u64) -> Result<(), AgentError> {
        let url = self.settings.endpoint_url();
        debug!(attempt, url = %url, "connecting");

        let (sender, mut receiver) = tokio::select! {
            result = self.transport.connect(&url) => result?,
            () = self.stop.raised() => return Ok(()),
        };
        info!(attempt, url = %url, "connected");

        session.reset();
        self.state.send_replace(session.state());

        let sender: SharedSender<T::Sender> = Arc::new(Mutex::new(sender));
        let mut reporter = Reporter::default();

        let result = self.receive_loop(session, &sender, &mut receiver, &mut reporter).await;

        reporter.abort();

        if self.stop.is_raised() {
            tokio::select! {
                result = async { sender.lock().await.close().await } => {
                    if let Err(e) = result {
                        debug!(error = %e, "close after stop failed");
                    }
                },
                () = self.env.sleep(CLOSE_TIMEOUT) => {
                    warn!(
                        timeout_secs = CLOSE_TIMEOUT.as_secs(),
                        "close timed out, dropping connection"
                    );
                },
            }
        }

        result
    }

    async fn receive_loop(
        &self,
        session: &mut Session,
        sender: &SharedSender<T::Sender>,
        receiver: &mut T::Receiver,
        reporter: &mut Reporter,
    ) -> Result<(), AgentError> {
        loop {
            let text = tokio::select! {
                result = receiver.recv() => result?,
                () = self.stop.raised() => return Ok(()),
            };

            let Some(text) = text else {
                info!("server closed the connection");
                return Ok(());
            };

            let message = match ServerMessage::decode(&text) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "skipping malformed message");
                    continue;
                },
            };
            debug!(message_type = message.kind().unwrap_or("<none>"), "received");

            let actions = session.handle_message(&message, self.env.wall_clock());
            let state = session.state();
            self.state.send_replace(state);

            for action in actions {
                self.execute(action, state, sender, reporter).await?;
                if self.stop.is_raised() {
                    return Ok(());
                }
            }
        }
    }

    async fn execute(
        &self,
        action: SessionAction,
        state: SessionState,
        sender: &SharedSender<T::Sender>,
        reporter: &mut Reporter,
    ) -> Result<(), AgentError> {
        match action {
            SessionAction::Send(message) => {
                debug!(message_type = message.kind(), "sending");
                send_message(sender, &self.stop, &message).await?;
            },

            SessionAction::SendReading => {
                let device_id = &self.settings.device_id;
                let sent =
                    send_reading(sender, &self.stop, &self.env, device_id, &state.thresholds).await;
                if let Err(e) = sent {
                    warn!(error = %e, "failed to send initial measurement");
                }
            },

            SessionAction::StartReporting => {
                reporter.start(ReportContext {
                    sender: Arc::clone(sender),
                    state: self.state.subscribe(),
                    env: self.env.clone(),
                    stop: self.stop.clone(),
                    device_id: self.settings.device_id.clone(),
                    interval: self.settings.interval(),
                });
            },
        }

        Ok(())
    }
}
