//! Quit handler (`quit`)

use crate::protocol::QUIT;
use crate::session::{SessionBroker, SlotLabel, Teardown};

/// Handles quit frames
pub struct QuitHandler;

impl QuitHandler {
    /// Tell the counterpart, then reset both slots
    ///
    /// This is the only path that closes a healthy counterpart.
    pub fn handle(broker: &mut SessionBroker, slot: SlotLabel) {
        let counterpart = broker.slot(slot.counterpart());
        if counterpart.is_occupied() {
            counterpart.send_text(QUIT);
        }

        tracing::info!(slot = %slot, reason = %Teardown::ExplicitQuit, "Session quit");
        broker.reset_all(Teardown::ExplicitQuit.close_code());
    }
}
