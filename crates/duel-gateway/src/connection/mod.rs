//! Connection handles
//!
//! A `Connection` is the broker's side of one WebSocket: an outbound queue
//! drained by the socket's writer task, plus an idempotent close.

mod connection;

pub use connection::{CloseOutcome, Connection, OutboundFrame};
