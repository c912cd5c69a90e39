//! Gateway Integration Tests
//!
//! Each test boots its own gateway on an ephemeral loopback port and drives it
//! with real WebSocket clients. No external services are needed.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use duel_gateway::protocol::{
    CloseCode, PAIRED_FIRST, PAIRED_SECOND, QUIT, SERVER_FULL, SERVER_FULL_IDENTITY,
    WAITING_FOR_OPPONENT,
};
use integration_tests::{
    fast_heartbeat_config, wait_for_slot_state, Received, TestServer, WsClient, KEEPALIVE_MS,
};
use reqwest::StatusCode;

/// Connect two clients and consume the pairing notices
async fn paired(server: &TestServer) -> (WsClient, WsClient) {
    let mut first = server.connect().await.expect("first connect");
    assert_eq!(first.recv_text().await.unwrap(), WAITING_FOR_OPPONENT);

    let mut second = server.connect().await.expect("second connect");
    assert_eq!(second.recv_text().await.unwrap(), PAIRED_SECOND);
    assert_eq!(first.recv_text().await.unwrap(), PAIRED_FIRST);

    (first, second)
}

// ============================================================================
// HTTP Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_status_starts_empty() {
    let server = TestServer::start().await.expect("Failed to start server");
    let status = server.status().await.unwrap();

    assert_eq!(status["name"], "duel-relay-test");
    assert_eq!(status["paired"], false);
    assert_eq!(status["slots"][0]["state"], "empty");
    assert_eq!(status["slots"][1]["state"], "empty");
}

// ============================================================================
// Admission
// ============================================================================

#[tokio::test]
async fn test_pairing_notices() {
    let server = TestServer::start().await.unwrap();
    let (_first, _second) = paired(&server).await;

    let status = server.status().await.unwrap();
    assert_eq!(status["paired"], true);
    assert_eq!(status["slots"][0]["identity"], "127001");
    assert_eq!(status["slots"][1]["state"], "paired");
}

#[tokio::test]
async fn test_ws_path_also_upgrades() {
    let server = TestServer::start().await.unwrap();
    let (mut client, _) = tokio_tungstenite::connect_async(server.ws_url("/ws"))
        .await
        .expect("upgrade on /ws");

    use futures::StreamExt;
    let frame = client.next().await.unwrap().unwrap();
    assert_eq!(frame.into_text().unwrap(), WAITING_FOR_OPPONENT);
}

#[tokio::test]
async fn test_third_connection_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let (_first, _second) = paired(&server).await;

    let mut third = server.connect().await.unwrap();
    assert_eq!(third.recv_text().await.unwrap(), SERVER_FULL);
    assert_eq!(third.recv_close().await.unwrap(), CloseCode::ServerFull.as_u16());

    assert_eq!(server.status().await.unwrap()["paired"], true);
}

// ============================================================================
// Relay
// ============================================================================

#[tokio::test]
async fn test_payloads_relayed_verbatim_without_echo() {
    let server = TestServer::start().await.unwrap();
    let (mut first, mut second) = paired(&server).await;

    first.send_text("e2 e4").await.unwrap();
    first.send_text("HB").await.unwrap();
    first.send_binary(&[0, 1, 254, 255]).await.unwrap();

    assert_eq!(second.recv().await.unwrap(), Received::Text("e2 e4".to_string()));
    assert_eq!(second.recv().await.unwrap(), Received::Text("HB".to_string()));
    assert_eq!(
        second.recv().await.unwrap(),
        Received::Binary(vec![0, 1, 254, 255])
    );

    second.send_text("{\"move\":\"e7e5\"}").await.unwrap();
    assert_eq!(first.recv_text().await.unwrap(), "{\"move\":\"e7e5\"}");

    first.expect_silence(Duration::from_millis(100)).await.unwrap();
}

#[tokio::test]
async fn test_burst_is_relayed_without_loss() {
    const FRAMES: usize = 2_000;

    let server = TestServer::start().await.unwrap();
    let (mut first, mut second) = paired(&server).await;

    // The receiver does not read until the whole burst has been sent
    let padding = "x".repeat(4 * 1024);
    for i in 0..FRAMES {
        first.send_text(&format!("{i}:{padding}")).await.unwrap();
    }
    first.send_text("END").await.unwrap();

    for i in 0..FRAMES {
        let text = second.recv_text().await.unwrap();
        assert_eq!(text, format!("{i}:{padding}"), "frame {i} missing or out of order");
    }
    assert_eq!(second.recv_text().await.unwrap(), "END");
}

#[tokio::test]
async fn test_heartbeat_is_not_relayed() {
    let server = TestServer::start().await.unwrap();
    let (mut first, mut second) = paired(&server).await;

    first.send_text("hb").await.unwrap();
    first.send_text("after").await.unwrap();

    assert_eq!(second.recv_text().await.unwrap(), "after");
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_quit_notifies_counterpart_and_resets() {
    let server = TestServer::start().await.unwrap();
    let (mut first, mut second) = paired(&server).await;

    first.send_text(QUIT).await.unwrap();

    assert_eq!(second.recv_text().await.unwrap(), QUIT);
    assert_eq!(second.recv_close().await.unwrap(), CloseCode::Quit.as_u16());
    assert_eq!(first.recv_close().await.unwrap(), CloseCode::Quit.as_u16());

    wait_for_slot_state(&server, "A", "empty").await.unwrap();
    wait_for_slot_state(&server, "B", "empty").await.unwrap();

    // A fresh pairing starts from scratch
    let (_first, _second) = paired(&server).await;
}

#[tokio::test]
async fn test_silent_client_times_out_while_partner_stays() {
    let server = TestServer::start_with_config(fast_heartbeat_config()).await.unwrap();
    let (mut silent, mut alive) = paired(&server).await;

    let mut keepalive = tokio::time::interval(Duration::from_millis(KEEPALIVE_MS));
    let code = loop {
        tokio::select! {
            received = silent.recv() => break received.unwrap(),
            _ = keepalive.tick() => alive.send_text("hb").await.unwrap(),
        }
    };
    assert_eq!(code, Received::Close(Some(CloseCode::HeartbeatTimeout.as_u16())));

    assert_eq!(server.slot_state("A").await.unwrap(), "disconnected");
    assert_eq!(server.slot_state("B").await.unwrap(), "pending");

    // The survivor ends the session; nothing is left bound
    alive.send_text(QUIT).await.unwrap();
    assert_eq!(alive.recv_close().await.unwrap(), CloseCode::Quit.as_u16());
    wait_for_slot_state(&server, "A", "empty").await.unwrap();
    wait_for_slot_state(&server, "B", "empty").await.unwrap();
}

#[tokio::test]
async fn test_both_silent_resets_session() {
    let server = TestServer::start_with_config(fast_heartbeat_config()).await.unwrap();
    let (mut first, mut second) = paired(&server).await;

    assert_eq!(
        first.recv_close().await.unwrap(),
        CloseCode::HeartbeatTimeout.as_u16()
    );
    // Whichever times out second finds no counterpart and clears both bindings
    let code = second.recv_close().await.unwrap();
    assert!(
        code == CloseCode::HeartbeatTimeout.as_u16() || code == CloseCode::SessionEnded.as_u16(),
        "unexpected close code {code}"
    );

    wait_for_slot_state(&server, "A", "empty").await.unwrap();
    wait_for_slot_state(&server, "B", "empty").await.unwrap();
}

#[tokio::test]
async fn test_waiting_client_disconnect_frees_slot() {
    let server = TestServer::start().await.unwrap();

    let mut first = server.connect().await.unwrap();
    assert_eq!(first.recv_text().await.unwrap(), WAITING_FOR_OPPONENT);
    first.close().await.unwrap();

    wait_for_slot_state(&server, "A", "empty").await.unwrap();
}

#[tokio::test]
async fn test_client_close_is_answered() {
    let server = TestServer::start().await.unwrap();
    let (mut first, _second) = paired(&server).await;

    let answer = first.close_handshake().await.unwrap();
    assert!(matches!(answer, Received::Close(_)), "got {answer:?}");

    wait_for_slot_state(&server, "A", "disconnected").await.unwrap();
    assert_eq!(server.slot_state("B").await.unwrap(), "pending");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_bound_slot_rejects_other_origin() {
    use std::net::{IpAddr, Ipv4Addr};

    let server = TestServer::start().await.unwrap();
    let (first, mut second) = paired(&server).await;

    // Slot A keeps 127.0.0.1's identity after its connection drops
    first.close().await.unwrap();
    wait_for_slot_state(&server, "A", "disconnected").await.unwrap();

    let mut stranger = server
        .connect_from(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)))
        .await
        .unwrap();
    assert_eq!(stranger.recv_text().await.unwrap(), SERVER_FULL_IDENTITY);
    assert_eq!(
        stranger.recv_close().await.unwrap(),
        CloseCode::IdentityMismatch.as_u16()
    );

    // The bound origin may return and completes a new pairing
    let mut returning = server.connect().await.unwrap();
    assert_eq!(returning.recv_text().await.unwrap(), PAIRED_SECOND);
    assert_eq!(second.recv_text().await.unwrap(), PAIRED_FIRST);
}
