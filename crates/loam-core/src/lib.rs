//! Loam device core logic
//!
//! This crate contains the pure state machine logic for the soil-moisture
//! device. It is decoupled from I/O so the protocol can be exercised
//! deterministically, both in unit tests and under network simulation.
//!
//! # Architecture: "The Hollow Shell"
//!
//! Protocol logic is strictly separated from transport concerns:
//!
//! ```text
//!      ┌────────────────────────────┐
//!      │ loam-core                  │
//!      │ - Session state machine    │
//!      │ - Status classification    │
//!      │ - Auth signatures          │
//!      └────────────────────────────┘
//!         ↓                      ↓
//! ┌────────────────┐  ┌────────────────┐
//! │ loam-harness   │  │ loam-agent     │
//! │ (Turmoil)      │  │ (Tokio/WS)     │
//! │ - Virtual time │  │ - Real network │
//! │ - Seeded RNG   │  │ - System clock │
//! │ - Fault inject │  │ - Production   │
//! └────────────────┘  └────────────────┘
//! ```
//!
//! # Key Principles
//!
//! - No I/O in Core: Never call `tokio::spawn`, `chrono::Local::now()`, or
//!   `rand::thread_rng()` directly
//! - Environment Trait: Time and randomness go through [`env::Environment`]
//! - Actions: The state machine returns [`session::SessionAction`]s; the
//!   driver executes them
//!
//! # Modules
//!
//! - [`session`]: Protocol state machine (welcome, auth, claim, config)
//! - [`status`]: Threshold table and moisture classification
//! - [`reading`]: Synthetic readings and their outbound message
//! - [`auth`]: Device credentials and signature generation
//! - [`env`]: Environment abstraction (wall clock, sleep, RNG)
//! - [`transport`]: Message-oriented transport abstraction
//! - [`error`]: Transport error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod env;
pub mod error;
pub mod reading;
pub mod session;
pub mod status;
pub mod transport;

pub use auth::Credentials;
pub use error::TransportError;
pub use reading::Reading;
pub use session::{Session, SessionAction, SessionState};
pub use status::{MoistureStatus, Thresholds, classify};
