//! Participant slots
//!
//! A session has exactly two slots, `A` and `B`. They are created once and
//! reset for reuse, never recreated.

use super::gate::RemoteIdentity;
use super::monitor::HeartbeatMonitor;
use crate::connection::{CloseOutcome, Connection};
use crate::protocol::{CloseCode, Payload};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

/// Fixed slot labels, scanned in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SlotLabel {
    A,
    B,
}

impl SlotLabel {
    /// Admission scan order
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// The other slot of the session
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl std::fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one admission into a slot
///
/// The epoch changes on every admission, so events carrying an older ticket
/// (late frames, ticks from a cancelled monitor) no longer match the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotTicket {
    pub slot: SlotLabel,
    pub epoch: u64,
}

/// Observable slot lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// Free and unbound
    Empty,
    /// Occupied, counterpart free
    Pending,
    /// Both slots occupied
    Paired,
    /// Free but still bound to the identity of its last occupant
    Disconnected,
}

/// One participant seat
#[derive(Debug)]
pub struct Slot {
    label: SlotLabel,
    occupied: bool,
    identity: Option<RemoteIdentity>,
    connection: Option<Connection>,
    epoch: u64,
    last_alive_at: Instant,
    admitted_at: Option<DateTime<Utc>>,
    monitor: Option<HeartbeatMonitor>,
}

impl Slot {
    /// Create an empty slot
    pub fn new(label: SlotLabel, now: Instant) -> Self {
        Self {
            label,
            occupied: false,
            identity: None,
            connection: None,
            epoch: 0,
            last_alive_at: now,
            admitted_at: None,
            monitor: None,
        }
    }

    pub fn label(&self) -> SlotLabel {
        self.label
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Identity bound by the last admission, kept until a full reset
    pub fn identity(&self) -> Option<&RemoteIdentity> {
        self.identity.as_ref()
    }

    /// Ticket of the current admission
    pub fn ticket(&self) -> SlotTicket {
        SlotTicket {
            slot: self.label,
            epoch: self.epoch,
        }
    }

    pub fn last_alive_at(&self) -> Instant {
        self.last_alive_at
    }

    pub fn admitted_at(&self) -> Option<DateTime<Utc>> {
        self.admitted_at
    }

    pub fn is_monitored(&self) -> bool {
        self.monitor.is_some()
    }

    /// Whether the ticket belongs to the slot's current, live admission
    pub fn holds(&self, ticket: SlotTicket) -> bool {
        self.occupied && self.label == ticket.slot && self.epoch == ticket.epoch
    }

    /// Lifecycle state given whether the counterpart is occupied
    pub fn state(&self, counterpart_occupied: bool) -> SlotState {
        match (self.occupied, counterpart_occupied) {
            (true, true) => SlotState::Paired,
            (true, false) => SlotState::Pending,
            (false, _) if self.identity.is_some() => SlotState::Disconnected,
            (false, _) => SlotState::Empty,
        }
    }

    /// Bind an admitted connection to this slot
    pub fn bind(
        &mut self,
        connection: Connection,
        identity: RemoteIdentity,
        epoch: u64,
        now: Instant,
    ) {
        self.occupied = true;
        self.identity = Some(identity);
        self.connection = Some(connection);
        self.epoch = epoch;
        self.last_alive_at = now;
        self.admitted_at = Some(Utc::now());
    }

    /// Record a liveness signal; never moves the timestamp backwards
    pub fn mark_alive(&mut self, now: Instant) {
        if now > self.last_alive_at {
            self.last_alive_at = now;
        }
    }

    /// Attach a running heartbeat monitor, replacing any previous one
    pub fn attach_monitor(&mut self, monitor: HeartbeatMonitor, now: Instant) {
        self.monitor = Some(monitor);
        self.mark_alive(now);
    }

    /// Queue a text frame if a connection is held
    pub fn send_text(&self, text: &str) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| connection.send_text(text))
    }

    /// Queue an opaque payload unchanged
    pub fn send_payload(&self, payload: Payload) -> bool {
        let Some(connection) = self.connection.as_ref() else {
            return false;
        };
        match payload {
            Payload::Text(text) => connection.send_text(text),
            Payload::Binary(bytes) => connection.send_binary(bytes),
        }
    }

    /// Vacate the slot but keep its identity binding
    ///
    /// Closes and drops the connection and cancels the monitor.
    pub fn release(&mut self, code: CloseCode) -> CloseOutcome {
        self.occupied = false;
        self.monitor = None;
        self.admitted_at = None;
        match self.connection.take() {
            Some(connection) => connection.close(code),
            None => CloseOutcome::AlreadyClosed,
        }
    }

    /// Return the slot to `Empty`, clearing its identity
    pub fn reset(&mut self, code: CloseCode) -> CloseOutcome {
        let outcome = self.release(code);
        self.identity = None;
        outcome
    }
}
