//! # switchbridged: switchbridge daemon
//!
//! Loads configuration and the outlet topology, then runs the engine and
//! the HTTP API until SIGINT or SIGTERM.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use switchbridge_domain::topology::Topology;
use switchbridged::adapters::OutletFactory;
use switchbridged::config::Config;
use switchbridged::engine::Engine;

/// How long shutdown waits for hardware calls still in flight.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let result = runtime.block_on(run());
    // serial exchanges abandoned at their deadline must not hold up exit
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Topology: any error here aborts startup
    let path = &config.topology.path;
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read topology {}", path.display()))?;
    let topology = Topology::from_json_str(&document)
        .with_context(|| format!("invalid topology {}", path.display()))?;
    let server = topology.server().clone();
    tracing::info!(
        devices = topology.devices().len(),
        accessories = topology.accessories().count(),
        pin = server.pin,
        storage_path = %server.storage_path,
        "topology loaded"
    );

    // Adapters & engine
    let factory = OutletFactory::from_config(&config).context("failed to build HTTP client")?;
    if config.simulation.enabled {
        tracing::warn!("simulation mode: no hardware will be touched");
    }
    let engine = Engine::new(topology, config.engine_policy(), |device| {
        factory.build(device)
    });
    let loops = engine.start();

    // HTTP
    let bind_addr = config.bind_addr(server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "switchbridged listening");

    axum::serve(listener, engine.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    loops.shutdown().await;
    tracing::info!("switchbridged stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
