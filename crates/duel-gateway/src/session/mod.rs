//! Session brokering
//!
//! Two fixed slots, admission with identity re-binding, heartbeat liveness,
//! and cascading teardown, all driven from one event loop.

mod broker;
mod error;
mod gate;
mod monitor;
mod runtime;
mod slot;

pub use broker::{BrokerSnapshot, SessionBroker, SlotSnapshot};
pub use error::{BrokerError, RejectReason, Teardown};
pub use gate::{Admission, ConnectionGate, RemoteIdentity, Role};
pub use monitor::{is_expired, HeartbeatMonitor};
pub use runtime::{BrokerEvent, BrokerHandle, BrokerLoop, EventSender};
pub use slot::{Slot, SlotLabel, SlotState, SlotTicket};
