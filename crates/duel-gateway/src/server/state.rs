//! Gateway state
//!
//! Application state for the gateway server.

use crate::session::BrokerHandle;
use duel_common::AppConfig;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Handle to the session broker event loop
    broker: BrokerHandle,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(broker: BrokerHandle, config: AppConfig) -> Self {
        Self {
            broker,
            config: Arc::new(config),
        }
    }

    /// Get the broker handle
    pub fn broker(&self) -> &BrokerHandle {
        &self.broker
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("broker", &self.broker)
            .field("config", &"AppConfig")
            .finish()
    }
}
