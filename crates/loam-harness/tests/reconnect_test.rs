//! Reconnect and stop-signal behaviour under connection loss.
//!
//! - Server drops the connection -> 5s backoff -> new session with reset state
//! - Report loop of the dead session does not leak into the next one
//! - Stop during backoff -> no further connection attempts
//! - Stop while reporting -> session closed, no more measurements

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use loam_agent::{DeviceAgent, RECONNECT_DELAY, Settings, StopSignal};
use loam_core::{SessionState, Thresholds};
use loam_harness::{SERVER_PORT, SimEnv, SimServer, SimTransport};
use serde_json::{Value, json};
use tokio::time::Instant;
use turmoil::Builder;

fn settings() -> Settings {
    Settings {
        server_url: format!("server:{SERVER_PORT}"),
        device_id: "dev-1".to_string(),
        auth_key: "secret".to_string(),
        interval_seconds: 2,
    }
}

fn sim() -> turmoil::Sim<'static> {
    Builder::new().simulation_duration(Duration::from_secs(120)).build()
}

/// What the server saw on each accepted connection.
#[derive(Debug, Default)]
struct ServerView {
    sessions: Vec<Vec<Value>>,
    reconnect_gaps: Vec<Duration>,
}

type SharedView = Arc<Mutex<ServerView>>;

#[test]
fn server_drop_triggers_backoff_and_state_reset() {
    let mut sim = sim();
    let view = SharedView::default();
    let final_state = Arc::new(Mutex::new(None));

    let server_view = Arc::clone(&view);
    sim.host("server", move || {
        let view = Arc::clone(&server_view);
        async move {
            let server = SimServer::bind().await?;

            // First session: authenticate, claim, then drop mid-reporting
            let mut first = server.accept().await?;
            let mut seen = Vec::new();
            first.send(&json!({"type": "welcome"})).await?;
            seen.push(first.expect().await?);
            first.send(&json!({"type": "auth_success", "claimed": true})).await?;
            first
                .send(&json!({
                    "type": "config",
                    "thresholdRed": 10,
                    "thresholdYellow": 40,
                    "thresholdGreen": 70
                }))
                .await?;
            for _ in 0..3 {
                seen.push(first.expect().await?);
            }
            drop(first);
            let dropped_at = Instant::now();
            view.lock().expect("view lock").sessions.push(seen);

            // Second session: only welcome, never authenticate
            let mut second = server.accept().await?;
            let gap = second.accepted_at().duration_since(dropped_at);
            assert_eq!(second.target(), "/websocket?deviceId=dev-1");

            second.send(&json!({"type": "welcome"})).await?;
            let mut seen = Vec::new();
            while let Some(message) = second.recv().await? {
                seen.push(message);
            }

            let mut view = view.lock().expect("view lock");
            view.reconnect_gaps.push(gap);
            view.sessions.push(seen);
            Ok(())
        }
    });

    let client_state = Arc::clone(&final_state);
    sim.client("device", async move {
        let stop = StopSignal::new();
        let agent = DeviceAgent::new(settings(), SimTransport, SimEnv::new(), stop.clone());
        let mut states = agent.subscribe();

        let observer = async {
            // Wait until the first session is authenticated with thresholds
            states
                .wait_for(|s| s.thresholds == Thresholds::new(10, 40, 70))
                .await
                .expect("agent alive");
            // Then until the reconnect resets it
            states.wait_for(|s| *s == SessionState::default()).await.expect("agent alive");

            tokio::time::sleep(Duration::from_secs(10)).await;
            stop.raise();
        };
        tokio::join!(agent.run(), observer);

        *client_state.lock().expect("state lock") = Some(agent.state());
        Ok(())
    });

    sim.run().expect("simulation should complete successfully");

    let view = view.lock().expect("view lock");
    assert_eq!(view.sessions.len(), 2);
    assert_eq!(view.reconnect_gaps.len(), 1);
    assert!(
        view.reconnect_gaps[0] >= RECONNECT_DELAY,
        "reconnected after {:?}, expected at least {:?}",
        view.reconnect_gaps[0],
        RECONNECT_DELAY
    );

    let first = &view.sessions[0];
    assert_eq!(first[0]["type"], "auth");
    assert!(first[1..].iter().all(|m| m["type"] == "measurement"));

    // Only the auth reply; the old report loop must not write here
    let second = &view.sessions[1];
    assert_eq!(second.len(), 1, "got {second:?}");
    assert_eq!(second[0]["type"], "auth");

    let state = final_state.lock().expect("state lock").expect("device finished");
    assert_eq!(state, SessionState::default());
}

#[test]
fn stop_during_backoff_prevents_reconnect() {
    let mut sim = sim();
    let accepts = Arc::new(Mutex::new(0usize));
    let elapsed = Arc::new(Mutex::new(None));

    let server_accepts = Arc::clone(&accepts);
    sim.host("server", move || {
        let accepts = Arc::clone(&server_accepts);
        async move {
            let server = SimServer::bind().await?;
            while let Ok(mut peer) = server.accept().await {
                *accepts.lock().expect("accepts lock") += 1;
                peer.send(&json!({"type": "welcome"})).await?;
                peer.expect().await?;
                // Drop the connection right after auth
            }
            Ok(())
        }
    });

    let client_elapsed = Arc::clone(&elapsed);
    sim.client("device", async move {
        let started = Instant::now();
        let stop = StopSignal::new();
        let agent = DeviceAgent::new(settings(), SimTransport, SimEnv::new(), stop.clone());

        let stopper = async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            stop.raise();
        };
        tokio::join!(agent.run(), stopper);

        *client_elapsed.lock().expect("elapsed lock") = Some(started.elapsed());
        Ok(())
    });

    sim.run().expect("simulation should complete successfully");

    assert_eq!(*accepts.lock().expect("accepts lock"), 1);

    let elapsed = elapsed.lock().expect("elapsed lock").expect("device finished");
    assert!(elapsed < RECONNECT_DELAY, "stop took {elapsed:?}, backoff was not interrupted");
}

#[test]
fn stop_while_reporting_closes_session() {
    let mut sim = sim();
    let received = Arc::new(Mutex::new(Vec::new()));

    let server_received = Arc::clone(&received);
    sim.host("server", move || {
        let received = Arc::clone(&server_received);
        async move {
            let server = SimServer::bind().await?;
            let mut peer = server.accept().await?;
            let start = peer.accepted_at();

            peer.send(&json!({"type": "welcome"})).await?;
            peer.expect().await?;
            peer.send(&json!({"type": "auth_success", "claimed": true})).await?;

            while let Some(message) = peer.recv().await? {
                received.lock().expect("received lock").push((start.elapsed(), message));
            }
            // Device closed its side; record the close time
            received.lock().expect("received lock").push((start.elapsed(), Value::Null));
            Ok(())
        }
    });

    sim.client("device", async {
        let stop = StopSignal::new();
        let agent = DeviceAgent::new(settings(), SimTransport, SimEnv::new(), stop.clone());

        let stopper = async {
            tokio::time::sleep(Duration::from_secs(7)).await;
            stop.raise();
        };
        tokio::join!(agent.run(), stopper);
        Ok(())
    });

    sim.run().expect("simulation should complete successfully");

    let received = received.lock().expect("received lock");
    let (closed_at, close) = received.last().expect("close recorded");
    assert_eq!(*close, Value::Null, "device must close the session on stop");
    // Relative to accept, which trails the device's start by the connect latency
    assert!(*closed_at >= Duration::from_secs(6));

    // One-shot plus loop at t=0, 2, 4, 6
    let measurements: Vec<_> =
        received.iter().filter(|(_, m)| m["type"] == "measurement").collect();
    assert_eq!(measurements.len(), 5, "got {measurements:?}");
    assert!(measurements.iter().all(|(at, _)| *at < Duration::from_secs(7)));
}
