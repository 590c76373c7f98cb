//! Throw-away HTTP servers standing in for outlets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use serde_json::{Value, json};

/// Bind `router` on an ephemeral local port and return `host:port`.
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

/// Always answers with a body that is not JSON.
pub(crate) fn garbage_router() -> Router {
    Router::new().route("/cm", get(|| async { "<html>busy</html>" }))
}

/// Never answers in time.
pub(crate) fn stalled_router() -> Router {
    Router::new().route(
        "/cm",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "{}"
        }),
    )
}

/// Tasmota device with named power channels.
#[derive(Clone)]
pub(crate) struct FakeTasmota {
    channels: Arc<Mutex<HashMap<String, bool>>>,
    ignore_commands: bool,
}

impl FakeTasmota {
    pub(crate) fn new(channels: &[(&str, bool)]) -> Self {
        Self {
            channels: Arc::new(Mutex::new(
                channels
                    .iter()
                    .map(|(label, on)| ((*label).to_string(), *on))
                    .collect(),
            )),
            ignore_commands: false,
        }
    }

    pub(crate) fn ignoring_commands(mut self) -> Self {
        self.ignore_commands = true;
        self
    }

    pub(crate) fn is_on(&self, label: &str) -> bool {
        self.channels.lock().unwrap()[label]
    }

    pub(crate) fn router(&self) -> Router {
        Router::new()
            .route("/cm", get(tasmota_command))
            .with_state(self.clone())
    }
}

async fn tasmota_command(
    State(plug): State<FakeTasmota>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let command = params.get("cmnd").cloned().unwrap_or_default();
    let (label, argument) = match command.split_once(' ') {
        Some((label, argument)) => (label.to_ascii_uppercase(), Some(argument.to_string())),
        None => (command.to_ascii_uppercase(), None),
    };
    let mut channels = plug.channels.lock().unwrap();
    let Some(on) = channels.get_mut(&label) else {
        return Json(json!({"Command": "Unknown"}));
    };
    if !plug.ignore_commands {
        match argument.as_deref() {
            Some("On") => *on = true,
            Some("Off") => *on = false,
            _ => {}
        }
    }
    let state = if *on { "ON" } else { "OFF" };
    let mut reply = serde_json::Map::new();
    reply.insert(label, Value::from(state));
    Json(Value::Object(reply))
}

/// Remote relay CGI in front of a two-relay board.
#[derive(Clone)]
pub(crate) struct FakeRelayCgi {
    relays: Arc<Mutex<[bool; 2]>>,
    indeterminate: bool,
}

impl FakeRelayCgi {
    pub(crate) fn new(relays: [bool; 2]) -> Self {
        Self {
            relays: Arc::new(Mutex::new(relays)),
            indeterminate: false,
        }
    }

    /// Answer every request with a `null` state, as a board whose
    /// commands time out.
    pub(crate) fn indeterminate(mut self) -> Self {
        self.indeterminate = true;
        self
    }

    pub(crate) fn relays(&self) -> [bool; 2] {
        *self.relays.lock().unwrap()
    }

    pub(crate) fn router(&self) -> Router {
        Router::new()
            .route("/cgi-bin/power-switch-cgi", get(relay_cgi))
            .with_state(self.clone())
    }
}

async fn relay_cgi(
    State(cgi): State<FakeRelayCgi>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let sid: usize = params.get("sid").and_then(|sid| sid.parse().ok()).unwrap_or(0);
    let state = params.get("state").map(String::as_str).unwrap_or_default();
    if !(1..=2).contains(&sid) {
        return Json(json!({}));
    }
    if cgi.indeterminate {
        return match state {
            "on" | "off" => Json(json!({"sid": sid, "state": null, "changed": true})),
            _ => Json(json!({"sid": sid, "state": null})),
        };
    }
    let mut relays = cgi.relays.lock().unwrap();
    let slot = sid - 1;
    let changed = match state {
        "on" | "off" => {
            let desired = state == "on";
            let changed = relays[slot] != desired;
            relays[slot] = desired;
            Some(changed)
        }
        _ => None,
    };
    let label = if relays[slot] { "on" } else { "off" };
    match changed {
        Some(changed) => Json(json!({"sid": sid, "state": label, "changed": changed})),
        None => Json(json!({"sid": sid, "state": label})),
    }
}
