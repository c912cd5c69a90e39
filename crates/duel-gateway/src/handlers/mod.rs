//! Inbound frame handlers
//!
//! Routes frames from an admitted slot to the heartbeat, quit, or relay path.

mod heartbeat;
mod quit;
mod relay;

pub use heartbeat::HeartbeatHandler;
pub use quit::QuitHandler;
pub use relay::RelayHandler;

use crate::protocol::ClientFrame;
use crate::session::{SessionBroker, SlotLabel};
use tokio::time::Instant;

/// Dispatch client frames to the appropriate handler
pub struct FrameDispatcher;

impl FrameDispatcher {
    /// Handle a frame from the current holder of `slot`
    pub fn dispatch(broker: &mut SessionBroker, slot: SlotLabel, frame: ClientFrame, now: Instant) {
        tracing::trace!(slot = %slot, kind = frame.kind(), "Received frame");

        match frame {
            ClientFrame::Heartbeat => HeartbeatHandler::handle(broker, slot, now),
            ClientFrame::Quit => QuitHandler::handle(broker, slot),
            ClientFrame::Payload(payload) => RelayHandler::handle(broker, slot, payload),
        }
    }
}
