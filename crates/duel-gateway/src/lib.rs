//! # duel-gateway
//!
//! WebSocket broker that pairs two participants into one session and relays
//! opaque payloads between them.

pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod session;

pub use server::{create_app, create_gateway_state, run, serve, GatewayState};
