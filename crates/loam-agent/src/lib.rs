//! Soil-moisture device agent.
//!
//! Drives the pure [`loam_core::Session`] state machine over a real
//! connection: a supervisor that reconnects with a fixed backoff, a receive
//! loop that executes session actions, and a spawned report loop that sends
//! periodic measurements once the device is claimed.
//!
//! ```text
//! Settings::load ──> DeviceAgent::new(settings, WsTransport, SystemEnv, stop)
//!                          │
//!                          └── run() until stop.raise()
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod error;
pub mod logging;
mod report;
pub mod settings;
pub mod stop;
pub mod system_env;
pub mod ws;

pub use agent::{CLOSE_TIMEOUT, DeviceAgent, RECONNECT_DELAY};
pub use error::{AgentError, ConfigError};
pub use settings::Settings;
pub use stop::StopSignal;
pub use system_env::SystemEnv;
pub use ws::WsTransport;
