//! Session outcome and error types
//!
//! None of these leave the connection boundary: rejections and teardowns are
//! reported to clients as notices and close codes, and logged.

use crate::protocol::{CloseCode, SERVER_FULL, SERVER_FULL_IDENTITY};
use serde::Serialize;
use thiserror::Error;

/// Why an admission was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The first free slot is still bound to a different origin
    #[error("slot is bound to another identity")]
    IdentityMismatch,

    /// Both slots are occupied
    #[error("both slots are occupied")]
    ServerFull,
}

impl RejectReason {
    /// Notice sent to the rejected connection before it is closed
    #[must_use]
    pub const fn notice(self) -> &'static str {
        match self {
            Self::IdentityMismatch => SERVER_FULL_IDENTITY,
            Self::ServerFull => SERVER_FULL,
        }
    }

    #[must_use]
    pub const fn close_code(self) -> CloseCode {
        match self {
            Self::IdentityMismatch => CloseCode::IdentityMismatch,
            Self::ServerFull => CloseCode::ServerFull,
        }
    }
}

/// Why an occupied slot was vacated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Teardown {
    /// No heartbeat within the timeout window
    HeartbeatTimeout,
    /// A participant sent `quit`
    ExplicitQuit,
    /// The socket closed or failed without a `quit`
    TransportClosed,
}

impl Teardown {
    /// Close code for the slot being vacated
    #[must_use]
    pub const fn close_code(self) -> CloseCode {
        match self {
            Self::HeartbeatTimeout => CloseCode::HeartbeatTimeout,
            Self::ExplicitQuit => CloseCode::Quit,
            Self::TransportClosed => CloseCode::SessionEnded,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeartbeatTimeout => "heartbeat_timeout",
            Self::ExplicitQuit => "explicit_quit",
            Self::TransportClosed => "transport_closed",
        }
    }
}

impl std::fmt::Display for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors talking to the broker event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("session broker is no longer running")]
    Unavailable,
}

impl BrokerError {
    /// Close code for a connection that could not reach the broker
    #[must_use]
    pub const fn close_code(self) -> CloseCode {
        match self {
            Self::Unavailable => CloseCode::InternalError,
        }
    }
}
