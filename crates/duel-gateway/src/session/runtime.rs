//! Broker event loop
//!
//! The broker runs inside one task that processes events strictly in arrival
//! order. Connection tasks and heartbeat monitors never touch slots directly;
//! they send events through a `BrokerHandle` or an `EventSender`. The loop
//! stops once every `BrokerHandle` is dropped.

use super::broker::{BrokerSnapshot, SessionBroker};
use super::error::BrokerError;
use super::gate::{Admission, RemoteIdentity};
use super::slot::SlotTicket;
use crate::connection::Connection;
use crate::protocol::ClientFrame;
use duel_common::HeartbeatConfig;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Non-owning sender used from inside the broker
///
/// Monitors hold this instead of a full sender so they never keep the loop alive.
pub type EventSender = mpsc::WeakUnboundedSender<BrokerEvent>;

/// Everything the broker reacts to
#[derive(Debug)]
pub enum BrokerEvent {
    /// A new connection asks for a slot
    Connect {
        connection: Connection,
        identity: RemoteIdentity,
        reply: oneshot::Sender<Admission>,
    },
    /// A frame arrived on an admitted connection
    Frame { ticket: SlotTicket, frame: ClientFrame },
    /// An admitted connection's socket ended
    Disconnected { ticket: SlotTicket },
    /// A heartbeat monitor fired
    HeartbeatTick { ticket: SlotTicket },
    /// Report the current slot states
    Snapshot { reply: oneshot::Sender<BrokerSnapshot> },
}

/// Task owning the session broker
pub struct BrokerLoop {
    broker: SessionBroker,
    events: mpsc::UnboundedReceiver<BrokerEvent>,
}

impl BrokerLoop {
    /// Create the loop and the handle used to reach it
    pub fn new(heartbeat: HeartbeatConfig) -> (Self, BrokerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let broker = SessionBroker::new(heartbeat, tx.downgrade(), Instant::now());

        (Self { broker, events: rx }, BrokerHandle { events: tx })
    }

    /// Run the loop on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process events until every `BrokerHandle` is dropped
    pub async fn run(mut self) {
        tracing::info!(
            interval_ms = self.broker.heartbeat_config().interval_ms,
            timeout_ms = self.broker.heartbeat_config().timeout_ms,
            "Session broker started"
        );

        while let Some(event) = self.events.recv().await {
            self.handle(event, Instant::now());
        }

        tracing::info!("Session broker stopped");
    }

    fn handle(&mut self, event: BrokerEvent, now: Instant) {
        match event {
            BrokerEvent::Connect {
                connection,
                identity,
                reply,
            } => {
                let admission = self.broker.admit(connection, identity, now);
                if reply.send(admission).is_err() {
                    tracing::debug!("Admission reply dropped; connection task already gone");
                }
            }
            BrokerEvent::Frame { ticket, frame } => {
                self.broker.handle_frame(ticket, frame, now);
            }
            BrokerEvent::Disconnected { ticket } => {
                self.broker.connection_lost(ticket);
            }
            BrokerEvent::HeartbeatTick { ticket } => {
                self.broker.check_heartbeat(ticket, now);
            }
            BrokerEvent::Snapshot { reply } => {
                let _ = reply.send(self.broker.snapshot());
            }
        }
    }
}

/// Cloneable access to the broker loop
#[derive(Debug, Clone)]
pub struct BrokerHandle {
    events: mpsc::UnboundedSender<BrokerEvent>,
}

impl BrokerHandle {
    /// Ask for a slot for a connection from `origin`
    ///
    /// If the broker is gone, the connection is closed with an internal-error code.
    pub async fn admit(&self, connection: Connection, origin: &str) -> Result<Admission, BrokerError> {
        let (reply, response) = oneshot::channel();
        let event = BrokerEvent::Connect {
            connection,
            identity: RemoteIdentity::from_origin(origin),
            reply,
        };

        if let Err(mpsc::error::SendError(event)) = self.events.send(event) {
            if let BrokerEvent::Connect { connection, .. } = event {
                connection.close(BrokerError::Unavailable.close_code());
            }
            return Err(BrokerError::Unavailable);
        }

        response.await.map_err(|_| BrokerError::Unavailable)
    }

    /// Forward a client frame
    pub fn frame(&self, ticket: SlotTicket, frame: ClientFrame) -> Result<(), BrokerError> {
        self.send(BrokerEvent::Frame { ticket, frame })
    }

    /// Report that an admitted connection's socket ended
    pub fn disconnected(&self, ticket: SlotTicket) -> Result<(), BrokerError> {
        self.send(BrokerEvent::Disconnected { ticket })
    }

    /// Fetch the current slot states
    pub async fn snapshot(&self) -> Result<BrokerSnapshot, BrokerError> {
        let (reply, response) = oneshot::channel();
        self.send(BrokerEvent::Snapshot { reply })?;
        response.await.map_err(|_| BrokerError::Unavailable)
    }

    fn send(&self, event: BrokerEvent) -> Result<(), BrokerError> {
        self.events.send(event).map_err(|_| BrokerError::Unavailable)
    }
}
