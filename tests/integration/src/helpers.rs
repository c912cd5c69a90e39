//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers and driving WebSocket clients.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use duel_common::AppConfig;
use duel_gateway::{create_app, create_gateway_state, serve};
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use serde_json::Value;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{client_async, connect_async, MaybeTlsStream, WebSocketStream};

/// How long a test waits for any single frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
    _broker: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the default test configuration
    pub async fn start() -> Result<Self> {
        Self::start_with_config(crate::fixtures::test_config()).await
    }

    /// Start a test server with custom config on an ephemeral port
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.gateway.address()).await?;
        let addr = listener.local_addr()?;

        let (state, broker) = create_gateway_state(config);
        let app = create_app(state);

        let handle = tokio::spawn(async move {
            serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
            _broker: broker,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL for a path
    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Connect a client from the default loopback address
    pub async fn connect(&self) -> Result<WsClient> {
        let (stream, _) = connect_async(self.ws_url("/")).await?;
        Ok(WsClient { stream })
    }

    /// Connect a client whose socket is bound to a specific local address
    pub async fn connect_from(&self, local: IpAddr) -> Result<WsClient> {
        let socket = match local {
            IpAddr::V4(_) => TcpSocket::new_v4()?,
            IpAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.bind(SocketAddr::new(local, 0))?;
        let tcp = socket.connect(self.addr).await?;

        let (stream, _) = client_async(self.ws_url("/"), MaybeTlsStream::Plain(tcp)).await?;
        Ok(WsClient { stream })
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Fetch `/status` as JSON
    pub async fn status(&self) -> Result<Value> {
        let response = self.get("/status").await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// State name of a slot (`A` or `B`) from `/status`
    pub async fn slot_state(&self, label: &str) -> Result<String> {
        let status = self.status().await?;
        status["slots"]
            .as_array()
            .and_then(|slots| slots.iter().find(|slot| slot["label"] == label))
            .and_then(|slot| slot["state"].as_str())
            .map(str::to_string)
            .with_context(|| format!("slot {label} missing from {status}"))
    }
}

/// A WebSocket test client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

/// A frame as seen by a client, with pings filtered out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Text(String),
    Binary(Vec<u8>),
    /// Close frame with its code, if any
    Close(Option<u16>),
    /// Stream ended without a close frame
    Ended,
}

impl WsClient {
    /// Send a text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a binary frame
    pub async fn send_binary(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.send(Message::Binary(bytes.to_vec())).await?;
        Ok(())
    }

    /// Receive the next meaningful frame
    pub async fn recv(&mut self) -> Result<Received> {
        loop {
            let next = timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for a frame")?;

            return Ok(match next {
                Some(Ok(Message::Text(text))) => Received::Text(text),
                Some(Ok(Message::Binary(bytes))) => Received::Binary(bytes),
                Some(Ok(Message::Close(frame))) => Received::Close(frame.map(|f| u16::from(f.code))),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(_)) | None => Received::Ended,
            });
        }
    }

    /// Receive a text frame, failing on anything else
    pub async fn recv_text(&mut self) -> Result<String> {
        match self.recv().await? {
            Received::Text(text) => Ok(text),
            other => bail!("expected text frame, got {other:?}"),
        }
    }

    /// Receive a close frame and return its code
    pub async fn recv_close(&mut self) -> Result<u16> {
        match self.recv().await? {
            Received::Close(Some(code)) => Ok(code),
            other => bail!("expected close frame, got {other:?}"),
        }
    }

    /// Assert that nothing arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match timeout(window, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(frame) => bail!("expected silence, got {frame:?}"),
        }
    }

    /// Start the close handshake and return the server's answer
    pub async fn close_handshake(&mut self) -> Result<Received> {
        self.stream.close(None).await?;
        self.recv().await
    }

    /// Close the socket from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Poll `/status` until a slot reaches `state`
pub async fn wait_for_slot_state(server: &TestServer, label: &str, state: &str) -> Result<()> {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    loop {
        let current = server.slot_state(label).await?;
        if current == state {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            bail!("slot {label} stuck in {current}, expected {state}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
