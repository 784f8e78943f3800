//! Soil-moisture device agent binary.
//!
//! ```text
//! loam-agent --config config.json --log-level debug
//! ```

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use loam_agent::{DeviceAgent, Settings, StopSignal, SystemEnv, WsTransport, logging};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "loam-agent", version, about = "Soil-moisture device agent")]
struct Args {
    /// Path to the JSON settings file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = logging::DEFAULT_FILTER)]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(&args.log_level);

    let settings = match Settings::load(&args.config) {
        Ok(settings) => settings,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "failed to load settings");
            return ExitCode::FAILURE;
        },
    };
    settings.summary();

    let stop = StopSignal::new();
    tokio::spawn(watch_signals(stop.clone()));

    let agent = DeviceAgent::new(settings, WsTransport, SystemEnv, stop);
    agent.run().await;

    info!("shutdown complete");
    ExitCode::SUCCESS
}

/// Raise `stop` on SIGINT or SIGTERM.
async fn watch_signals(stop: StopSignal) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                wait_for_ctrl_c().await;
                stop.raise();
                return;
            },
        };

        tokio::select! {
            () = wait_for_ctrl_c() => info!("received SIGINT"),
            _ = terminate.recv() => info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
        info!("received Ctrl-C");
    }

    stop.raise();
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for SIGINT");
        std::future::pending::<()>().await;
    }
}
