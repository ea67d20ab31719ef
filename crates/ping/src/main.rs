//! `ping`: Lambda entry point for the ping API.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP spans).
//! 3. Build the Axum router and hand it to the Lambda runtime, or to a local
//!    TCP listener when `LOCAL_PORT` is set.

mod config;
mod server;
mod telemetry;

use anyhow::Result;
use tracing::info;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: ping configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "ping starting");

    // -----------------------------------------------------------------------
    // 3. HTTP
    // -----------------------------------------------------------------------
    let router = server::router::build();
    let served = match cfg.local_port {
        Some(port) => {
            let addr: std::net::SocketAddr = ([127, 0, 0, 1], port).into();
            info!(addr = %addr, "listening");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await.map_err(anyhow::Error::from)
        }
        None => lambda_http::run(router)
            .await
            .map_err(|e| anyhow::anyhow!("lambda runtime failed: {e}")),
    };

    telemetry::shutdown();
    served
}
