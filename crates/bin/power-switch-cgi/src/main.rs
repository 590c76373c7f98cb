//! # power-switch-cgi
//!
//! CGI front end of a serial relay board: `?sid=1|2&state=get|on|off`.
//!
//! The web server passes the request in `QUERY_STRING`; the reply is a CGI
//! header block followed by one JSON object. Logs go to stderr, which most
//! servers forward to their error log.
//!
//! The board location comes from the relay defaults, overridable with
//! `SWITCHBRIDGE_SERIAL_DEVICE` and `SWITCHBRIDGE_LOCK_PATH`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use switchbridge_adapter_relay::cgi::{self, CgiRequest};
use switchbridge_adapter_relay::{RelayBoard, RelayConfig, SerialTransport};

const CONTENT_TYPE: &str = "Content-type: application/json; charset=us-ascii";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SWITCHBRIDGE_LOG")
                .unwrap_or_else(|_| EnvFilter::new("power_switch_cgi=info,switchbridge=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = relay_config(|name| std::env::var(name).ok());
    let board = RelayBoard::from_config(&config);
    let query = std::env::var("QUERY_STRING").unwrap_or_default();

    let body = answer(&board, &query)?;

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{CONTENT_TYPE}\n\n{body}").context("failed to write response")?;
    stdout.flush().context("failed to write response")?;
    Ok(())
}

/// Run [`respond`] on a throw-away runtime.
///
/// Serial work abandoned at its deadline may still be running when the
/// answer is ready. The runtime is shut down without waiting for it, so
/// the process exits and the web server sees the request complete.
fn answer<T: SerialTransport>(board: &RelayBoard<T>, query: &str) -> anyhow::Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start runtime")?;
    let body = runtime.block_on(respond(board, query));
    runtime.shutdown_background();
    Ok(body)
}

fn relay_config(var: impl Fn(&str) -> Option<String>) -> RelayConfig {
    let mut config = RelayConfig::default();
    if let Some(device) = var("SWITCHBRIDGE_SERIAL_DEVICE") {
        config.device = device;
    }
    if let Some(lock_path) = var("SWITCHBRIDGE_LOCK_PATH") {
        config.lock_path = PathBuf::from(lock_path);
    }
    config
}

/// JSON body answering `query`. Invalid parameters get `{}`.
async fn respond<T: SerialTransport>(board: &RelayBoard<T>, query: &str) -> String {
    let request = match CgiRequest::from_query(query) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, query, "rejecting request");
            return "{}".to_string();
        }
    };
    let response = cgi::handle(board, request).await;
    serde_json::to_string(&response).unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to encode response");
        "{}".to_string()
    })
}
