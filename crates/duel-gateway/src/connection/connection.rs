//! Individual WebSocket connection
//!
//! Represents the outbound half of a single WebSocket connection.

use crate::protocol::CloseCode;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

/// A frame queued for delivery to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Binary(Vec<u8>),
    /// Close the socket with this code; nothing is written after it
    Close(CloseCode),
}

/// Result of closing a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// This call closed the connection
    Closed,
    /// The connection had already been closed; nothing was done
    AlreadyClosed,
}

/// The broker-owned handle of one WebSocket connection
///
/// The outbound queue is unbounded, so sends never block the broker and no
/// frame is lost while the writer is alive. Dropping the handle ends the
/// writer task once the queue is drained.
pub struct Connection {
    /// Unique connection ID, used in logs
    id: Uuid,

    /// Channel to send frames to the WebSocket writer
    sender: mpsc::UnboundedSender<OutboundFrame>,

    /// Set once by the first `close`
    closed: AtomicBool,
}

impl Connection {
    /// Create a new connection around an outbound sender
    pub fn new(sender: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            closed: AtomicBool::new(false),
        }
    }

    /// Create a connection together with the receiving end of its outbound queue
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Get the connection ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Check if `close` has been called or the writer has gone away
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.sender.is_closed()
    }

    /// Queue a text frame
    ///
    /// Returns `false` if the frame was not queued.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.enqueue(OutboundFrame::Text(text.into()))
    }

    /// Queue a binary frame
    pub fn send_binary(&self, bytes: Vec<u8>) -> bool {
        self.enqueue(OutboundFrame::Binary(bytes))
    }

    /// Close the connection with a close code
    ///
    /// Only the first call queues a close frame; later calls are no-ops.
    pub fn close(&self, code: CloseCode) -> CloseOutcome {
        if self.closed.swap(true, Ordering::SeqCst) {
            tracing::trace!(connection_id = %self.id, "Connection already closed");
            return CloseOutcome::AlreadyClosed;
        }

        // The writer may already be gone; dropping the handle ends it either way
        if self.sender.send(OutboundFrame::Close(code)).is_err() {
            tracing::debug!(
                connection_id = %self.id,
                code = code.as_u16(),
                "Close frame not queued, writer gone"
            );
        }

        tracing::debug!(connection_id = %self.id, code = %code, "Connection closed");
        CloseOutcome::Closed
    }

    fn enqueue(&self, frame: OutboundFrame) -> bool {
        if self.is_closed() {
            return false;
        }

        if self.sender.send(frame).is_err() {
            tracing::trace!(connection_id = %self.id, "Writer gone, dropping frame");
            return false;
        }
        true
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
