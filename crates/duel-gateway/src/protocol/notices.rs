//! Literal frames exchanged with clients
//!
//! Clients match on these strings exactly, so they must never change.

use crate::session::Role;

/// Heartbeat ping from a client
pub const HEARTBEAT: &str = "hb";

/// Session termination, accepted from clients and forwarded to the counterpart
pub const QUIT: &str = "quit";

/// Sent to a participant admitted while the other slot is empty
pub const WAITING_FOR_OPPONENT: &str = "Waiting for opponent";

/// Sent to the participant that was already waiting when the pairing completes
pub const PAIRED_FIRST: &str = "Connected to opponent You are team: first";

/// Sent to the participant whose admission completed the pairing
pub const PAIRED_SECOND: &str = "Connected to opponent You are team: second";

/// Rejection when the free slot is still bound to another origin
pub const SERVER_FULL_IDENTITY: &str = "Sorry this server is full!";

/// Rejection when both slots are occupied
pub const SERVER_FULL: &str = "Sorry this server is full!!";

/// Pairing notice for a role
#[must_use]
pub const fn pairing_notice(role: Role) -> &'static str {
    match role {
        Role::First => PAIRED_FIRST,
        Role::Second => PAIRED_SECOND,
    }
}
