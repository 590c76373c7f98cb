//! # switchbridge-adapter-web
//!
//! HTTP-controlled outlets.
//!
//! - [`TasmotaOutlet`]: one power channel of a Tasmota plug, read and
//!   switched through `GET /cm?cmnd=<label>[ On|Off]`.
//! - [`RemoteRelayOutlet`]: one relay of a board served by
//!   `power-switch-cgi` on another host.
//!
//! Both report the state the device answered with, never the state that
//! was asked for. Requests are bounded by the client timeout from
//! [`WebConfig`]; the engine adds its own deadline on top.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `switchbridge-app` and
//! `switchbridge-domain`.

mod client;
mod config;
mod error;
mod remote_relay;
mod tasmota;

#[cfg(test)]
mod test_server;

pub use client::WebClient;
pub use config::WebConfig;
pub use error::WebError;
pub use remote_relay::RemoteRelayOutlet;
pub use tasmota::TasmotaOutlet;
