//! # switchbridge-domain
//!
//! Pure domain model for the switchbridge outlet bridge.
//!
//! ## Responsibilities
//! - Foundational types: sequential identifiers, error conventions, timestamps
//! - Define **Devices** (one controllable outlet or relay channel each)
//! - Define **Groups** (outlets sharing one physical accessory)
//! - Define the tri-state **power state** and its lock-free cache cell
//! - Load a **Topology** from the declarative outlet document
//! - Define **Events** (state changes, failed reads, command outcomes)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod device;
pub mod event;
pub mod state;
pub mod topology;
