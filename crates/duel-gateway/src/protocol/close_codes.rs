//! WebSocket close codes
//!
//! Defines gateway-specific close codes sent whenever the broker closes a connection.

/// Gateway WebSocket close codes
///
/// Any notice text queued for the connection is delivered before the close frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// The broker could not process the connection
    InternalError = 4000,
    /// Both slots were occupied
    ServerFull = 4001,
    /// The free slot is bound to a different origin
    IdentityMismatch = 4002,
    /// No heartbeat within the timeout window
    HeartbeatTimeout = 4003,
    /// The session was torn down around this connection
    SessionEnded = 4004,
    /// A participant sent `quit`
    Quit = 4005,
}

impl CloseCode {
    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InternalError => "Internal error",
            Self::ServerFull => "Server is full",
            Self::IdentityMismatch => "Slot reserved for another origin",
            Self::HeartbeatTimeout => "Heartbeat timeout",
            Self::SessionEnded => "Session ended",
            Self::Quit => "Session quit",
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InternalError => "InternalError",
            Self::ServerFull => "ServerFull",
            Self::IdentityMismatch => "IdentityMismatch",
            Self::HeartbeatTimeout => "HeartbeatTimeout",
            Self::SessionEnded => "SessionEnded",
            Self::Quit => "Quit",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}
