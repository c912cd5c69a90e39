//! Payload relay
//!
//! Anything that is not a control frame is forwarded verbatim to the counterpart.

use crate::protocol::Payload;
use crate::session::{SessionBroker, SlotLabel};

/// Handles opaque payload frames
pub struct RelayHandler;

impl RelayHandler {
    /// Forward to the counterpart if it is occupied, otherwise drop silently
    pub fn handle(broker: &mut SessionBroker, slot: SlotLabel, payload: Payload) {
        let target = broker.slot(slot.counterpart());
        let bytes = payload.len();

        if !target.is_occupied() {
            tracing::trace!(from = %slot, bytes = bytes, "No counterpart, payload dropped");
            return;
        }

        let delivered = target.send_payload(payload);
        tracing::debug!(
            from = %slot,
            to = %target.label(),
            bytes = bytes,
            delivered = delivered,
            "Payload relayed"
        );
    }
}
