//! Session broker
//!
//! Owns both slots and applies every state transition: admission, pairing,
//! heartbeat checks, forced closes, and full resets. All methods are
//! synchronous and take the current instant, so the broker can be driven
//! from a single event loop and tested with synthetic clocks.

use super::error::{RejectReason, Teardown};
use super::gate::{Admission, ConnectionGate, RemoteIdentity, Role};
use super::monitor::{is_expired, HeartbeatMonitor};
use super::runtime::EventSender;
use super::slot::{Slot, SlotLabel, SlotState, SlotTicket};
use crate::connection::Connection;
use crate::handlers::FrameDispatcher;
use crate::protocol::{pairing_notice, ClientFrame, CloseCode, WAITING_FOR_OPPONENT};
use chrono::{DateTime, Utc};
use duel_common::HeartbeatConfig;
use serde::Serialize;
use tokio::time::Instant;

/// Point-in-time view of one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub label: SlotLabel,
    pub state: SlotState,
    pub occupied: bool,
    pub identity: Option<String>,
    pub admitted_at: Option<DateTime<Utc>>,
    pub monitored: bool,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerSnapshot {
    pub paired: bool,
    pub slots: Vec<SlotSnapshot>,
}

/// The single session coordinator
#[derive(Debug)]
pub struct SessionBroker {
    slots: [Slot; 2],
    heartbeat: HeartbeatConfig,
    events: EventSender,
    last_epoch: u64,
}

impl SessionBroker {
    /// Create a broker with two empty slots
    ///
    /// `events` is handed to heartbeat monitors so their ticks come back
    /// through the broker's event loop.
    pub fn new(heartbeat: HeartbeatConfig, events: EventSender, now: Instant) -> Self {
        Self {
            slots: [Slot::new(SlotLabel::A, now), Slot::new(SlotLabel::B, now)],
            heartbeat,
            events,
            last_epoch: 0,
        }
    }

    pub fn slot(&self, label: SlotLabel) -> &Slot {
        &self.slots[label.index()]
    }

    pub(crate) fn slot_mut(&mut self, label: SlotLabel) -> &mut Slot {
        &mut self.slots[label.index()]
    }

    /// Both slots occupied
    pub fn is_paired(&self) -> bool {
        self.slots.iter().all(Slot::is_occupied)
    }

    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        self.heartbeat
    }

    /// Admit a connection into a free slot, or reject and close it
    pub fn admit(&mut self, connection: Connection, identity: RemoteIdentity, now: Instant) -> Admission {
        let label = match ConnectionGate::select(&self.slots, &identity) {
            Ok(label) => label,
            Err(reason) => {
                self.reject(&connection, &identity, reason);
                return Admission::Rejected(reason);
            }
        };

        self.last_epoch += 1;
        let epoch = self.last_epoch;
        let connection_id = connection.id();
        self.slot_mut(label).bind(connection, identity, epoch, now);
        let ticket = self.slot(label).ticket();

        tracing::info!(
            slot = %label,
            epoch = epoch,
            identity = %self.slot(label).identity().map_or("", RemoteIdentity::as_str),
            connection_id = %connection_id,
            "Connection admitted"
        );

        let role = if self.slot(label.counterpart()).is_occupied() {
            self.complete_pairing(label, now);
            Role::Second
        } else {
            self.slot(label).send_text(WAITING_FOR_OPPONENT);
            Role::First
        };

        Admission::Assigned { ticket, role }
    }

    fn reject(&self, connection: &Connection, identity: &RemoteIdentity, reason: RejectReason) {
        tracing::info!(
            identity = %identity,
            connection_id = %connection.id(),
            reason = %reason,
            "Connection rejected"
        );
        connection.send_text(reason.notice());
        connection.close(reason.close_code());
    }

    /// Notify both sides and start liveness monitoring
    fn complete_pairing(&mut self, newcomer: SlotLabel, now: Instant) {
        let waiting = newcomer.counterpart();
        self.slot(newcomer).send_text(pairing_notice(Role::Second));
        self.slot(waiting).send_text(pairing_notice(Role::First));

        for label in SlotLabel::ALL {
            if !self.slot(label).is_monitored() {
                let monitor = HeartbeatMonitor::start(
                    self.slot(label).ticket(),
                    self.heartbeat.interval(),
                    self.events.clone(),
                );
                self.slot_mut(label).attach_monitor(monitor, now);
            }
        }

        tracing::info!(first = %waiting, second = %newcomer, "Session paired");
    }

    /// Route an inbound frame from the holder of `ticket`
    ///
    /// Frames from a connection that no longer holds its slot are dropped.
    pub fn handle_frame(&mut self, ticket: SlotTicket, frame: ClientFrame, now: Instant) {
        if !self.slot(ticket.slot).holds(ticket) {
            tracing::trace!(
                slot = %ticket.slot,
                epoch = ticket.epoch,
                kind = frame.kind(),
                "Dropping frame from stale connection"
            );
            return;
        }

        FrameDispatcher::dispatch(self, ticket.slot, frame, now);
    }

    /// Evaluate liveness on a monitor tick
    ///
    /// Returns the teardown applied, if the slot had gone silent.
    pub fn check_heartbeat(&mut self, ticket: SlotTicket, now: Instant) -> Option<Teardown> {
        let slot = self.slot(ticket.slot);
        if !slot.holds(ticket) {
            return None;
        }

        if !is_expired(slot.last_alive_at(), now, self.heartbeat.timeout()) {
            return None;
        }

        tracing::warn!(
            slot = %ticket.slot,
            silent_ms = now.saturating_duration_since(slot.last_alive_at()).as_millis(),
            "Heartbeat timeout"
        );
        self.force_close(ticket.slot, Teardown::HeartbeatTimeout);
        Some(Teardown::HeartbeatTimeout)
    }

    /// The socket of `ticket` closed without a `quit`
    pub fn connection_lost(&mut self, ticket: SlotTicket) {
        if self.slot(ticket.slot).holds(ticket) {
            self.force_close(ticket.slot, Teardown::TransportClosed);
        }
    }

    /// Vacate one slot, cascading to a full reset if the counterpart is already free
    ///
    /// An occupied counterpart is left untouched.
    pub fn force_close(&mut self, label: SlotLabel, teardown: Teardown) {
        self.slot_mut(label).release(teardown.close_code());

        if self.slot(label.counterpart()).is_occupied() {
            tracing::info!(
                slot = %label,
                reason = %teardown,
                "Slot closed, counterpart still connected"
            );
        } else {
            tracing::info!(
                slot = %label,
                reason = %teardown,
                "Slot closed with no counterpart, resetting session"
            );
            self.reset_all(CloseCode::SessionEnded);
        }
    }

    /// Return both slots to `Empty`
    pub fn reset_all(&mut self, code: CloseCode) {
        for slot in &mut self.slots {
            slot.reset(code);
        }
        tracing::debug!(code = %code, "Session reset");
    }

    pub fn snapshot(&self) -> BrokerSnapshot {
        let slots = SlotLabel::ALL
            .into_iter()
            .map(|label| {
                let slot = self.slot(label);
                SlotSnapshot {
                    label,
                    state: slot.state(self.slot(label.counterpart()).is_occupied()),
                    occupied: slot.is_occupied(),
                    identity: slot.identity().map(|id| id.as_str().to_string()),
                    admitted_at: slot.admitted_at(),
                    monitored: slot.is_monitored(),
                }
            })
            .collect();

        BrokerSnapshot {
            paired: self.is_paired(),
            slots,
        }
    }
}
