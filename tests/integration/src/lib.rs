//! Integration test utilities for the duel gateway
//!
//! This crate provides helpers for running end-to-end tests against
//! a live gateway with real WebSocket clients.

pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
