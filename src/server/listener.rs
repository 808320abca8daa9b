//! TCP listener and serve loop for the chat server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::audit::AuditLogger;
use crate::config::Config;
use crate::exchange::{PrivatBankProvider, RateFetcher};
use crate::Result;

use super::lifecycle::ShutdownReason;
use super::router::create_router;
use super::signal::shutdown_signal;
use super::ws::ChatState;

/// WebSocket chat server.
pub struct ChatServer {
    addr: String,
    state: Arc<ChatState>,
}

impl ChatServer {
    /// Build a server from configuration, using the PrivatBank rate provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = PrivatBankProvider::new(&config.exchange)?;
        let state = ChatState::new(
            RateFetcher::new(Arc::new(provider)),
            AuditLogger::new(&config.audit.file),
        )
        .with_outbound_buffer(config.server.outbound_buffer);

        Ok(Self::new(
            format!("{}:{}", config.server.host, config.server.port),
            state,
        ))
    }

    /// Create a server on `addr` around prepared state.
    pub fn new(addr: impl Into<String>, state: ChatState) -> Self {
        Self {
            addr: addr.into(),
            state: Arc::new(state),
        }
    }

    /// Get the shared chat state.
    pub fn state(&self) -> Arc<ChatState> {
        Arc::clone(&self.state)
    }

    /// Run until a `killall` command or a termination signal stops the server.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;

        let lifecycle = self.state.lifecycle.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_signal() => {
                    lifecycle.shutdown(ShutdownReason::Signal).await;
                }
                _ = lifecycle.stopping() => {}
            }
        });

        serve(listener, self.state).await
    }

    /// Start serving in the background and return the bound address.
    ///
    /// Termination signals are not watched; stop the server through its lifecycle.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.addr).await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = serve(listener, self.state).await {
                error!("Chat server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

/// Serve connections until stopping begins, then wait for teardown.
async fn serve(listener: TcpListener, state: Arc<ChatState>) -> Result<()> {
    let local_addr = listener.local_addr()?;
    info!("Chat server listening on ws://{}", local_addr);

    let lifecycle = state.lifecycle.clone();
    let stopping = lifecycle.clone();
    let router = create_router(state);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { stopping.stopping().await })
    .await?;

    lifecycle.stopped().await;
    info!("Chat server stopped accepting connections");
    Ok(())
}
