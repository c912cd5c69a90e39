//! Admission rules
//!
//! Decides which slot, if any, a new connection may take.

use super::error::RejectReason;
use super::slot::{Slot, SlotLabel, SlotTicket};
use serde::Serialize;

/// Normalized remote origin
///
/// Every non-digit character of the origin is removed, so `10.0.0.1` becomes
/// `10001`. Distinct addresses can collide (`1.0.0.11` and `10.0.1.1`); clients
/// rely on exactly this normalization, so it is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RemoteIdentity(String);

impl RemoteIdentity {
    #[must_use]
    pub fn from_origin(origin: &str) -> Self {
        Self(origin.chars().filter(char::is_ascii_digit).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RemoteIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Team assigned at pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Was waiting when the pairing completed
    First,
    /// Completed the pairing
    Second,
}

/// Result of an admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Assigned { ticket: SlotTicket, role: Role },
    Rejected(RejectReason),
}

impl Admission {
    /// Ticket of an assigned admission
    #[must_use]
    pub fn ticket(&self) -> Option<SlotTicket> {
        match self {
            Self::Assigned { ticket, .. } => Some(*ticket),
            Self::Rejected(_) => None,
        }
    }
}

/// Slot selection for incoming connections
pub struct ConnectionGate;

impl ConnectionGate {
    /// Pick the slot for an identity
    ///
    /// Slots are scanned in order `A`, `B` and only the first unoccupied one is
    /// considered: if it is bound to a different identity the connection is
    /// rejected even when the other slot is free and unbound.
    pub fn select(slots: &[Slot; 2], identity: &RemoteIdentity) -> Result<SlotLabel, RejectReason> {
        let free = SlotLabel::ALL
            .into_iter()
            .map(|label| &slots[label.index()])
            .find(|slot| !slot.is_occupied())
            .ok_or(RejectReason::ServerFull)?;

        match free.identity() {
            Some(bound) if bound != identity => Err(RejectReason::IdentityMismatch),
            _ => Ok(free.label()),
        }
    }
}
