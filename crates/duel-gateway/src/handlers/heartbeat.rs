//! Heartbeat handler (`hb`)

use crate::session::{SessionBroker, SlotLabel};
use tokio::time::Instant;

/// Handles heartbeat frames
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Refresh the sender's liveness; nothing is sent back
    pub fn handle(broker: &mut SessionBroker, slot: SlotLabel, now: Instant) {
        broker.slot_mut(slot).mark_alive(now);
        tracing::trace!(slot = %slot, "Heartbeat received");
    }
}
