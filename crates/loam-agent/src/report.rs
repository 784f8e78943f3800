//! Periodic measurement reporting.
//!
//! The report loop is a spawned task that shares the session's sender with
//! the receive loop. It reads the session state from a watch channel and
//! exits when authentication is lost, a send fails, or the stop signal is
//! raised. [`Reporter`] guarantees at most one loop per session.

use std::{sync::Arc, time::Duration};

use loam_core::{
    Reading, SessionState, Thresholds,
    env::Environment,
    transport::MessageSender,
};
use loam_proto::ClientMessage;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};
use tracing::{Instrument, Span, debug, info, warn};

use crate::{error::AgentError, stop::StopSignal};

/// Sender half shared by every writer of one session.
///
/// The mutex serializes writes so frames never interleave.
pub type SharedSender<S> = Arc<Mutex<S>>;

/// Encode a message and send it through the shared sender.
///
/// The lock and the write both race `stop`. Returns `Ok(false)` if the stop
/// signal won and nothing is known to have been written.
pub(crate) async fn send_message<S: MessageSender>(
    sender: &SharedSender<S>,
    stop: &StopSignal,
    message: &ClientMessage,
) -> Result<bool, AgentError> {
    let text = message.encode()?;

    tokio::select! {
        result = async { sender.lock().await.send(text).await } => {
            result?;
            Ok(true)
        },
        () = stop.raised() => {
            debug!(message_type = message.kind(), "send interrupted by stop");
            Ok(false)
        },
    }
}

/// Take one reading, classify it against `thresholds` and send it.
///
/// Returns `Ok(None)` if the stop signal interrupted the send.
pub(crate) async fn send_reading<S: MessageSender, E: Environment>(
    sender: &SharedSender<S>,
    stop: &StopSignal,
    env: &E,
    device_id: &str,
    thresholds: &Thresholds,
) -> Result<Option<Reading>, AgentError> {
    let reading = Reading::new(env.moisture_level(), thresholds);
    let message = reading.to_message(device_id, env.wall_clock());

    if !send_message(sender, stop, &message).await? {
        return Ok(None);
    }

    info!(level = reading.level, status = %reading.status, "measurement sent");
    Ok(Some(reading))
}

/// Everything a report loop needs, detached from the agent.
pub(crate) struct ReportContext<S, E> {
    pub sender: SharedSender<S>,
    pub state: watch::Receiver<SessionState>,
    pub env: E,
    pub stop: StopSignal,
    pub device_id: String,
    pub interval: Duration,
}

/// Handle to the report loop of the current session.
#[derive(Debug, Default)]
pub(crate) struct Reporter {
    task: Option<JoinHandle<()>>,
}

impl Reporter {
    /// Whether a loop is currently running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Spawn the loop unless one is already running or the agent is
    /// stopping. Returns whether a new loop was started.
    pub fn start<S, E>(&mut self, ctx: ReportContext<S, E>) -> bool
    where
        S: MessageSender,
        E: Environment,
    {
        if ctx.stop.is_raised() {
            debug!("not starting report loop, agent is stopping");
            return false;
        }
        if self.is_running() {
            debug!("report loop already running");
            return false;
        }

        let task = tokio::spawn(report_loop(ctx).instrument(Span::current()));
        self.task = Some(task);
        true
    }

    /// Cancel the loop if it is running.
    pub fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn report_loop<S: MessageSender, E: Environment>(ctx: ReportContext<S, E>) {
    info!(interval_secs = ctx.interval.as_secs(), "report loop started");

    while !ctx.stop.is_raised() {
        // Copy the snapshot out; a watch Ref must not be held across await.
        let state = *ctx.state.borrow();
        if !state.authenticated {
            debug!("no longer authenticated");
            break;
        }

        let sent =
            send_reading(&ctx.sender, &ctx.stop, &ctx.env, &ctx.device_id, &state.thresholds)
                .await;
        match sent {
            Ok(Some(_)) => {},
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "measurement send failed");
                break;
            },
        }

        tokio::select! {
            () = ctx.env.sleep(ctx.interval) => {},
            () = ctx.stop.raised() => break,
        }
    }

    info!("report loop stopped");
}
