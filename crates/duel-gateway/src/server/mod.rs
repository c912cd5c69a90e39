//! Gateway server setup
//!
//! Provides the WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::session::{BrokerLoop, BrokerSnapshot};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use duel_common::{AppConfig, AppError, AppResult};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// Create the gateway router
///
/// Clients may upgrade on `/` or `/ws`.
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/", get(gateway_handler))
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
        .route("/status", get(status))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Session status response
#[derive(Debug, Serialize)]
struct StatusResponse {
    name: String,
    #[serde(flatten)]
    session: BrokerSnapshot,
}

/// Current slot states
async fn status(State(state): State<GatewayState>) -> Result<Json<StatusResponse>, StatusCode> {
    let session = state.broker().snapshot().await.map_err(|e| {
        tracing::error!(error = %e, "Status unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(StatusResponse {
        name: state.config().app.name.clone(),
        session,
    }))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the session broker and create `GatewayState`
///
/// The returned task runs the broker for the life of the process.
pub fn create_gateway_state(config: AppConfig) -> (GatewayState, JoinHandle<()>) {
    let (broker, handle) = BrokerLoop::new(config.heartbeat);
    let task = broker.spawn();

    (GatewayState::new(handle, config), task)
}

/// Serve the application on a bound listener
///
/// Peer addresses are exposed to handlers through `ConnectInfo`.
pub async fn serve(listener: TcpListener, app: Router) -> AppResult<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(AppError::server)
}

/// Bind and run the gateway server
pub async fn run_server(app: Router, addr: &str) -> AppResult<()> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::bind(addr, e))?;

    tracing::info!("Gateway listening on ws://{}/", addr);

    serve(listener, app).await
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr = config.gateway.address();

    // Create gateway state
    let (state, _broker_task) = create_gateway_state(config);

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, &addr).await
}
