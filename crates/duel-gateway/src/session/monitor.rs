//! Heartbeat monitor
//!
//! One repeating timer per paired slot. The timer only reports ticks; the
//! broker decides on each tick whether the slot has gone silent.

use super::runtime::{BrokerEvent, EventSender};
use super::slot::SlotTicket;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Whether a slot last seen alive at `last_alive_at` has been silent for `timeout`
#[must_use]
pub fn is_expired(last_alive_at: Instant, now: Instant, timeout: Duration) -> bool {
    now.saturating_duration_since(last_alive_at) >= timeout
}

/// Repeating liveness timer for one slot admission
///
/// Ticks arrive one full period after `start`, then every period regardless
/// of message traffic. Dropping the monitor cancels the timer.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    ticket: SlotTicket,
    task: JoinHandle<()>,
}

impl HeartbeatMonitor {
    /// Spawn the timer task
    pub fn start(ticket: SlotTicket, period: Duration, events: EventSender) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(events) = events.upgrade() else {
                    tracing::debug!(slot = %ticket.slot, "Broker gone, stopping heartbeat monitor");
                    break;
                };
                if events.send(BrokerEvent::HeartbeatTick { ticket }).is_err() {
                    tracing::debug!(slot = %ticket.slot, "Broker gone, stopping heartbeat monitor");
                    break;
                }
            }
        });

        tracing::debug!(
            slot = %ticket.slot,
            epoch = ticket.epoch,
            period_ms = period.as_millis(),
            "Heartbeat monitor started"
        );

        Self { ticket, task }
    }

    pub fn ticket(&self) -> SlotTicket {
        self.ticket
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        self.task.abort();
        tracing::trace!(slot = %self.ticket.slot, epoch = self.ticket.epoch, "Heartbeat monitor cancelled");
    }
}
