//! event-horizon: ingestion client for the Event Horizon triage engine.
//!
//! Takes a user-supplied file, sends it to the remote analysis engine and
//! turns the answer into a small dashboard profile. When the engine is not
//! usable, a deterministic local simulation stands in so the dashboard keeps
//! working offline.

pub mod activity_log;
pub mod analysis;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod engine_client;
pub mod input;
pub mod logging;
pub mod paths;
pub mod probe;
pub mod protocol;
pub mod scheduler;
pub mod simulator;
pub mod state_machine;
