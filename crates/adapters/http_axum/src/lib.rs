//! # switchbridge-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a small **JSON API** for the accessory layer
//!   (`/api/devices`, `/api/accessories`, `/api/devices/{id}/state`)
//! - Stream device events as **Server-Sent Events** (`/api/events/stream`)
//! - Map HTTP requests into command service calls (driving adapter)
//! - Map application results into HTTP responses
//!
//! ## Dependency rule
//! Depends on `switchbridge-app` (for port traits and services) and
//! `switchbridge-domain` (for domain types used in request/response
//! mapping). Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
