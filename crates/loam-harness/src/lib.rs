//! Deterministic simulation harness for the Loam device agent.
//!
//! This crate provides Turmoil-based implementations of the `Environment`
//! and `Transport` traits, plus a scripted server peer, enabling
//! deterministic, reproducible tests of the full agent: reconnect backoffs
//! and report intervals run in virtual time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;
pub mod sim_server;
pub mod sim_transport;

pub use sim_env::SimEnv;
pub use sim_server::{SERVER_PORT, SimPeer, SimServer};
pub use sim_transport::SimTransport;
