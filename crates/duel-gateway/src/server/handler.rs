//! WebSocket handler
//!
//! Bridges one WebSocket to the session broker: a writer task drains the
//! connection's outbound queue, and a reader task forwards client frames.

use crate::connection::{Connection, OutboundFrame};
use crate::protocol::ClientFrame;
use crate::server::GatewayState;
use crate::session::{Admission, BrokerHandle, SlotTicket};
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// How long the writer may take to flush the close reply after the client closed
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket, peer))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, peer: SocketAddr) {
    let (connection, rx) = Connection::channel();
    let connection_id = connection.id();
    let origin = peer.ip().to_string();

    tracing::info!(connection_id = %connection_id, origin = %origin, "WebSocket connection established");

    let (ws_sink, ws_stream) = socket.split();

    // The writer starts first so rejection notices reach the client
    let mut send_task = tokio::spawn(write_frames(ws_sink, rx, connection_id));

    let ticket = match state.broker().admit(connection, &origin).await {
        Ok(Admission::Assigned { ticket, role }) => {
            tracing::debug!(
                connection_id = %connection_id,
                slot = %ticket.slot,
                role = ?role,
                "Slot assigned"
            );
            ticket
        }
        Ok(Admission::Rejected(reason)) => {
            tracing::debug!(connection_id = %connection_id, reason = %reason, "Admission rejected");
            let _ = send_task.await;
            return;
        }
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "Broker unavailable");
            let _ = send_task.await;
            return;
        }
    };

    let broker = state.broker().clone();
    let mut recv_task = tokio::spawn(read_frames(ws_stream, broker, ticket, connection_id));

    // Wait for either side to finish
    tokio::select! {
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task ended");
            // The broker vacates the slot and drops the connection, which lets
            // the writer answer the client's close before it exits
            report_disconnect(state.broker(), ticket, connection_id);
            if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await.is_err() {
                tracing::debug!(connection_id = %connection_id, "Writer did not finish, aborting");
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            recv_task.abort();
            report_disconnect(state.broker(), ticket, connection_id);
        }
    }

    tracing::info!(connection_id = %connection_id, slot = %ticket.slot, "Connection finished");
}

/// Tell the broker the socket is gone; a no-op if it already vacated the slot
fn report_disconnect(broker: &BrokerHandle, ticket: SlotTicket, connection_id: Uuid) {
    if broker.disconnected(ticket).is_err() {
        tracing::warn!(connection_id = %connection_id, "Broker unavailable during cleanup");
    }
}

/// Forward client frames to the broker until the socket ends
async fn read_frames(
    mut ws_stream: SplitStream<WebSocket>,
    broker: BrokerHandle,
    ticket: SlotTicket,
    connection_id: Uuid,
) {
    while let Some(msg) = ws_stream.next().await {
        let frame = match msg {
            Ok(Message::Text(text)) => ClientFrame::from_text(text),
            Ok(Message::Binary(bytes)) => ClientFrame::from_binary(bytes),
            Ok(Message::Ping(_)) => {
                tracing::trace!(connection_id = %connection_id, "Ping received");
                // Pong is handled automatically by axum
                continue;
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!(connection_id = %connection_id, "Pong received");
                continue;
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "Client closed connection");
                return;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                return;
            }
        };

        if broker.frame(ticket, frame).is_err() {
            tracing::warn!(connection_id = %connection_id, "Broker unavailable, dropping connection");
            return;
        }
    }
}

/// Write queued frames to the socket until a close frame or the queue ends
async fn write_frames(
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<OutboundFrame>,
    connection_id: Uuid,
) {
    while let Some(frame) = rx.recv().await {
        let message = match frame {
            OutboundFrame::Text(text) => Message::Text(text),
            OutboundFrame::Binary(bytes) => Message::Binary(bytes),
            OutboundFrame::Close(code) => {
                let close = CloseFrame {
                    code: code.as_u16(),
                    reason: code.description().into(),
                };
                if let Err(e) = ws_sink.send(Message::Close(Some(close))).await {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Failed to send close frame");
                }
                return;
            }
        };

        if ws_sink.send(message).await.is_err() {
            tracing::warn!(connection_id = %connection_id, "Failed to send message to WebSocket");
            return;
        }
    }

    // Close the WebSocket when the handle is dropped
    let _ = ws_sink.close().await;
}
