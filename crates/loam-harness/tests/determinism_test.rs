//! Determinism tests for full agent runs.
//!
//! Verifies that the same seed produces the same readings across runs, and
//! that the seed actually drives them.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use loam_agent::{DeviceAgent, Settings, StopSignal};
use loam_harness::{SERVER_PORT, SimEnv, SimServer, SimTransport};
use serde_json::json;
use turmoil::Builder;

/// Captured outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunTrace {
    message_types: Vec<String>,
    levels: Vec<u64>,
}

fn run_once(seed: u64) -> RunTrace {
    let mut sim = Builder::new().simulation_duration(Duration::from_secs(60)).build();
    let trace = Arc::new(Mutex::new(RunTrace { message_types: Vec::new(), levels: Vec::new() }));

    let server_trace = Arc::clone(&trace);
    sim.host("server", move || {
        let trace = Arc::clone(&server_trace);
        async move {
            let server = SimServer::bind().await?;
            let mut peer = server.accept().await?;

            peer.send(&json!({"type": "welcome"})).await?;
            peer.send(&json!({"type": "auth_success", "claimed": true})).await?;

            while let Some(message) = peer.recv().await? {
                let mut trace = trace.lock().expect("trace lock");
                trace.message_types.push(message["type"].as_str().unwrap_or("").to_string());
                if let Some(level) = message["moistureLevel"].as_u64() {
                    trace.levels.push(level);
                }
            }
            Ok(())
        }
    });

    sim.client("device", async move {
        let settings = Settings {
            server_url: format!("server:{SERVER_PORT}"),
            device_id: "dev-1".to_string(),
            auth_key: "secret".to_string(),
            interval_seconds: 5,
        };
        let stop = StopSignal::new();
        let agent = DeviceAgent::new(settings, SimTransport, SimEnv::with_seed(seed), stop.clone());

        let stopper = async {
            tokio::time::sleep(Duration::from_secs(23)).await;
            stop.raise();
        };
        tokio::join!(agent.run(), stopper);
        Ok(())
    });

    sim.run().expect("simulation should complete successfully");

    let trace = trace.lock().expect("trace lock").clone();
    trace
}

#[test]
fn same_seed_same_readings() {
    let runs: Vec<RunTrace> = (0..5).map(|_| run_once(42)).collect();

    let first = &runs[0];
    // auth, one-shot, then the loop at t=0, 5, 10, 15, 20
    assert_eq!(first.message_types.len(), 7, "got {first:?}");
    assert_eq!(first.message_types[0], "auth");
    assert_eq!(first.levels.len(), 6);

    for (i, run) in runs.iter().enumerate().skip(1) {
        assert_eq!(run, first, "Run {} produced different results than run 0", i);
    }
}

#[test]
fn different_seeds_different_readings() {
    let a = run_once(1);
    let b = run_once(2);

    assert_eq!(a.message_types, b.message_types);
    assert_ne!(a.levels, b.levels);
}
