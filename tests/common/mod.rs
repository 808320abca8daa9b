//! Test helpers for WebSocket E2E tests.
//!
//! Provides a stub rate provider, a server launcher, and a WebSocket test client.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{SinkExt, StreamExt};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use fxchat::{
    AuditLogger, ChatServer, ChatState, CurrencyQuote, FetchError, RateFetcher, RateProvider,
};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Rate provider returning the same EUR/USD quotes for every day, or failing.
pub struct StubProvider {
    fail: bool,
}

impl StubProvider {
    pub fn working() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl RateProvider for StubProvider {
    async fn quotes_for(&self, _date: NaiveDate) -> Result<Vec<CurrencyQuote>, FetchError> {
        if self.fail {
            return Err(FetchError::Connection("connection refused".to_string()));
        }
        Ok(vec![
            CurrencyQuote::new("EUR", 45.2, 44.3),
            CurrencyQuote::new("USD", 41.5, 40.9),
        ])
    }
}

/// A chat server running in the background.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<ChatState>,
    audit_dir: TempDir,
}

impl TestServer {
    /// Start a server on an ephemeral port.
    pub async fn start(provider: StubProvider) -> Self {
        let audit_dir = tempfile::tempdir().unwrap();
        let state = ChatState::new(
            RateFetcher::new(Arc::new(provider)),
            AuditLogger::new(audit_dir.path().join("exchange.log")),
        );

        let server = ChatServer::new("127.0.0.1:0", state);
        let state = server.state();
        let addr = server.run_with_addr().await.unwrap();

        Self {
            addr,
            state,
            audit_dir,
        }
    }

    /// WebSocket URL of the chat endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Connect a client and wait until the server has registered it.
    pub async fn connect(&self) -> TestClient {
        let expected = self.state.registry.len().await + 1;
        let client = TestClient::connect(&self.url()).await.unwrap();
        self.wait_for_clients(expected).await;
        client
    }

    /// Wait until exactly `count` sessions are registered.
    pub async fn wait_for_clients(&self, count: usize) {
        let deadline = Instant::now() + DEFAULT_TIMEOUT;
        while self.state.registry.len().await != count {
            assert!(
                Instant::now() < deadline,
                "Timed out waiting for {count} clients"
            );
            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Path of the exchange audit file.
    pub fn audit_path(&self) -> PathBuf {
        self.audit_dir.path().join("exchange.log")
    }

    /// Wait until the audit file holds `count` lines and return them.
    pub async fn wait_for_audit_lines(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + DEFAULT_TIMEOUT;
        loop {
            let lines = read_lines(&self.audit_path());
            if lines.len() >= count || Instant::now() >= deadline {
                return lines;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// WebSocket test client.
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect to the chat endpoint.
    pub async fn connect(
        url: &str,
    ) -> Result<Self, tokio_tungstenite::tungstenite::Error> {
        let (stream, _response) = connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Send a text frame.
    pub async fn send(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string()))
            .await
            .unwrap();
    }

    /// Receive the next text frame, skipping control frames.
    pub async fn recv_text(&mut self) -> String {
        timeout(DEFAULT_TIMEOUT, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => return text,
                    Some(Ok(Message::Close(_))) | None => panic!("Connection closed"),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => panic!("WebSocket error: {e}"),
                }
            }
        })
        .await
        .expect("Timed out waiting for a message")
    }

    /// Wait until the server closes the connection.
    ///
    /// Returns false if a text frame arrives first.
    pub async fn wait_closed(&mut self) -> bool {
        timeout(DEFAULT_TIMEOUT, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(_))) => return false,
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await
        .expect("Timed out waiting for close")
    }
}
