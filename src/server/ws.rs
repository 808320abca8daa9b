//! WebSocket handler.
//!
//! Adapts one WebSocket connection to a registered [`Session`]: a writer task
//! drains the session's outbound queue into the socket while the read loop
//! feeds text frames to the dispatcher. Evicting the session stops both, which
//! drops the socket.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::audit::AuditLogger;
use crate::chat::{ClientRegistry, CommandDispatcher, Outbound, Session};
use crate::exchange::RateFetcher;

use super::lifecycle::ServerLifecycle;

/// Default number of outbound messages queued per session.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Shared state for the chat endpoint.
pub struct ChatState {
    /// Connected sessions.
    pub registry: Arc<ClientRegistry>,
    /// Inbound message router.
    pub dispatcher: CommandDispatcher,
    /// Server lifecycle.
    pub lifecycle: ServerLifecycle,
    outbound_buffer: usize,
}

impl ChatState {
    /// Wire up the chat core around a rate fetcher and an audit logger.
    pub fn new(fetcher: RateFetcher, audit: AuditLogger) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let lifecycle = ServerLifecycle::new(registry.clone());
        let dispatcher = CommandDispatcher::new(
            registry.clone(),
            fetcher,
            Arc::new(audit),
            lifecycle.clone(),
        );

        Self {
            registry,
            dispatcher,
            lifecycle,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    /// Set the per-session outbound queue size.
    pub fn with_outbound_buffer(mut self, outbound_buffer: usize) -> Self {
        self.outbound_buffer = outbound_buffer.max(1);
        self
    }
}

/// WebSocket chat handler.
///
/// GET /
///
/// Refused with 503 once the server has begun stopping.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ChatState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    if !state.lifecycle.is_running() {
        debug!(%peer, "Rejecting connection while shutting down");
        return (StatusCode::SERVICE_UNAVAILABLE, "Server is shutting down").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, peer))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<ChatState>, peer: SocketAddr) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(state.outbound_buffer);

    let session = state.registry.register(outbound_tx).await;
    info!(
        %peer,
        session_id = session.id(),
        name = session.display_name(),
        "Client connected"
    );

    let evicted = session.eviction_token();
    let mut writer = {
        let evicted = evicted.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = write_outbound(ws_sender, outbound_rx) => {}
                _ = evicted.cancelled() => {}
            }
        })
    };
    let shutdown = state.lifecycle.shutdown_token();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                break;
            }
            _ = evicted.cancelled() => {
                info!(%peer, session_id = session.id(), "Client evicted");
                break;
            }
            _ = &mut writer => {
                debug!(session_id = session.id(), "Writer finished");
                break;
            }
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        state.dispatcher.dispatch(&session, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(session_id = session.id(), "WebSocket closed by client");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(session_id = session.id(), error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    disconnect(&state, session, peer).await;
}

/// Unregister the session; the writer exits once its queue drains or the
/// session is evicted.
async fn disconnect(state: &ChatState, session: Session, peer: SocketAddr) {
    state.registry.unregister(session.id()).await;
    info!(
        %peer,
        session_id = session.id(),
        name = session.display_name(),
        "Client disconnected"
    );
}

/// Forward queued items to the socket until closed.
async fn write_outbound(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<Outbound>,
) {
    while let Some(item) = outbound_rx.recv().await {
        match item {
            Outbound::Text(text) => {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Outbound::Close => {
                let _ = ws_sender.send(Message::Close(None)).await;
                break;
            }
        }
    }
}
