//! # switchbridged
//!
//! Composition root that wires all adapters together and runs the engine.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Load and validate the outlet topology; any error is fatal
//! - Pick an adapter per device (Tasmota, remote relay, local relay board,
//!   or a virtual outlet in simulation mode)
//! - Construct the switch table and application services
//! - Start one reconciliation loop per device
//! - Build the axum router and serve it on the topology's server port
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

pub mod adapters;
pub mod config;
pub mod engine;
