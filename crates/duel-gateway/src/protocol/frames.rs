//! Inbound client frames

use super::notices::{HEARTBEAT, QUIT};

/// Opaque application data, relayed without inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// Size of the payload in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A frame received from a participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// `hb`: refreshes the sender's liveness
    Heartbeat,
    /// `quit`: ends the session for both participants
    Quit,
    /// Anything else
    Payload(Payload),
}

impl ClientFrame {
    /// Classify a text frame
    ///
    /// Control literals are matched exactly: `"hb "` or `"QUIT"` are payloads.
    #[must_use]
    pub fn from_text(text: String) -> Self {
        match text.as_str() {
            HEARTBEAT => Self::Heartbeat,
            QUIT => Self::Quit,
            _ => Self::Payload(Payload::Text(text)),
        }
    }

    /// Binary frames are never control messages
    #[must_use]
    pub fn from_binary(bytes: Vec<u8>) -> Self {
        Self::Payload(Payload::Binary(bytes))
    }

    /// Short name for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Quit => "quit",
            Self::Payload(_) => "payload",
        }
    }
}
