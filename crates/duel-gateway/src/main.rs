//! Duel Gateway Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p duel-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use duel_common::{try_init_tracing_with_config, AppConfig, AppResult, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Configuration errors surface before tracing is installed
        eprintln!("Gateway failed [{}]: {e}", e.error_code());
        error!(error = %e, code = e.error_code(), "Gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    // Load configuration before tracing so the log format can follow it
    let config = AppConfig::from_env()?;

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::from_settings(&config.app)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        address = %config.gateway.address(),
        heartbeat_interval_ms = config.heartbeat.interval_ms,
        heartbeat_timeout_ms = config.heartbeat.timeout_ms,
        "Configuration loaded"
    );

    duel_gateway::run(config).await
}
