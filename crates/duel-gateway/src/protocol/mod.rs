//! Gateway protocol definitions
//!
//! Plain text frames in both directions: two control literals from clients,
//! a handful of fixed notices from the server, and custom close codes.

mod close_codes;
mod frames;
mod notices;

pub use close_codes::CloseCode;
pub use frames::{ClientFrame, Payload};
pub use notices::{
    pairing_notice, HEARTBEAT, PAIRED_FIRST, PAIRED_SECOND, QUIT, SERVER_FULL,
    SERVER_FULL_IDENTITY, WAITING_FOR_OPPONENT,
};
