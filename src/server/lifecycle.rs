//! Server lifecycle: running, stopping, stopped.
//!
//! The transition out of `Running` happens exactly once, either from the
//! `killall` chat command or from an external termination signal. Entering
//! `Stopping` cancels the shared shutdown token (new connections are refused
//! from that instant), then every registered session is asked to close.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chat::ClientRegistry;

/// Lifecycle phase of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting connections and serving sessions.
    Running,
    /// New connections refused; existing sessions being closed.
    Stopping,
    /// All sessions closed. Terminal.
    Stopped,
}

impl LifecycleState {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What triggered the shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A client sent `killall`.
    Command {
        /// Display name of the client.
        by: String,
    },
    /// The process received a termination signal.
    Signal,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Command { by } => write!(f, "killall from {by}"),
            ShutdownReason::Signal => f.write_str("termination signal"),
        }
    }
}

struct LifecycleInner {
    state: watch::Sender<LifecycleState>,
    stopping: CancellationToken,
    registry: Arc<ClientRegistry>,
}

/// Shared handle to the server lifecycle.
#[derive(Clone)]
pub struct ServerLifecycle {
    inner: Arc<LifecycleInner>,
}

impl ServerLifecycle {
    /// Create a lifecycle in the `Running` state governing `registry`.
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Running);
        Self {
            inner: Arc::new(LifecycleInner {
                state,
                stopping: CancellationToken::new(),
                registry,
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.inner.state.borrow()
    }

    /// Whether new connections may be accepted.
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Token cancelled when stopping begins.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.stopping.clone()
    }

    /// Wait until stopping begins.
    pub async fn stopping(&self) {
        self.inner.stopping.cancelled().await;
    }

    /// Wait until all sessions have been closed.
    pub async fn stopped(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|state| *state == LifecycleState::Stopped).await;
    }

    /// Stop the server.
    ///
    /// Returns false if a shutdown was already under way. Closing never waits
    /// on a client: a session whose queue is full is evicted instead.
    pub async fn shutdown(&self, reason: ShutdownReason) -> bool {
        let began = self.inner.state.send_if_modified(|state| {
            if *state == LifecycleState::Running {
                *state = LifecycleState::Stopping;
                true
            } else {
                false
            }
        });
        if !began {
            debug!(%reason, "Shutdown already in progress");
            return false;
        }

        info!(%reason, "Server is shutting down");
        self.inner.stopping.cancel();

        let sessions = self.inner.registry.snapshot().await;
        let closed = sessions.iter().filter(|session| session.close()).count();
        info!(
            sessions = sessions.len(),
            closed, "Closed connected sessions"
        );

        self.inner.state.send_replace(LifecycleState::Stopped);
        info!("Server stopped");
        true
    }
}
