//! Connected-session registry for fxchat.
//!
//! The registry is shared across all connection tasks. Every operation takes
//! the lock for the duration of a single call, so snapshots always reflect a
//! membership state that existed at some instant.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::names;

/// How long a delivery may wait for room in a full outbound queue.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Session identifier, assigned in registration order.
pub type SessionId = u64;

/// Item queued for delivery to a connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Text message.
    Text(String),
    /// Close the connection.
    Close,
}

/// Delivery to a session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The connection is gone.
    #[error("session {0} is closed")]
    Closed(SessionId),
    /// The client stopped draining its queue.
    #[error("session {0} is not reading")]
    Stalled(SessionId),
}

impl DeliveryError {
    /// Session the delivery was meant for.
    pub fn session_id(&self) -> SessionId {
        match self {
            DeliveryError::Closed(id) | DeliveryError::Stalled(id) => *id,
        }
    }
}

/// A connected client and its display identity.
///
/// Cloning a session clones the handle to its outbound queue, not the
/// connection itself.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    display_name: String,
    outbound: mpsc::Sender<Outbound>,
    evicted: CancellationToken,
}

impl Session {
    /// Get the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Get the display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Queue a text message for this client.
    ///
    /// Waits at most [`SEND_TIMEOUT`] for queue space.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), DeliveryError> {
        let send = self.outbound.send(Outbound::Text(text.into()));
        match tokio::time::timeout(SEND_TIMEOUT, send).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(DeliveryError::Closed(self.id)),
            Err(_) => Err(DeliveryError::Stalled(self.id)),
        }
    }

    /// Ask the connection to close without waiting.
    ///
    /// Returns false if the request could not be queued. A full queue
    /// evicts the session instead.
    pub fn close(&self) -> bool {
        match self.outbound.try_send(Outbound::Close) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.evict();
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Tear the connection down without a close handshake.
    pub fn evict(&self) {
        self.evicted.cancel();
    }

    /// Whether the session has been evicted.
    pub fn is_evicted(&self) -> bool {
        self.evicted.is_cancelled()
    }

    /// Token cancelled on eviction; the connection tasks watch it.
    pub fn eviction_token(&self) -> CancellationToken {
        self.evicted.clone()
    }
}

struct RegistryInner {
    next_id: SessionId,
    sessions: BTreeMap<SessionId, Session>,
}

/// Registry of currently connected sessions.
pub struct ClientRegistry {
    inner: RwLock<RegistryInner>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                next_id: 1,
                sessions: BTreeMap::new(),
            }),
        }
    }

    /// Register a connection under a freshly generated display name.
    pub async fn register(&self, outbound: mpsc::Sender<Outbound>) -> Session {
        self.register_as(outbound, names::full_name()).await
    }

    /// Register a connection under the given display name.
    ///
    /// Display names are not required to be unique.
    pub async fn register_as(
        &self,
        outbound: mpsc::Sender<Outbound>,
        display_name: impl Into<String>,
    ) -> Session {
        let mut inner = self.inner.write().await;

        let id = inner.next_id;
        inner.next_id += 1;

        let session = Session {
            id,
            display_name: display_name.into(),
            outbound,
            evicted: CancellationToken::new(),
        };
        inner.sessions.insert(id, session.clone());

        debug!(
            session_id = id,
            name = %session.display_name,
            online = inner.sessions.len(),
            "Session registered"
        );
        session
    }

    /// Remove a session.
    ///
    /// Returns true if the session was present. Removing an absent session is a no-op.
    pub async fn unregister(&self, id: SessionId) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.sessions.remove(&id).is_some();
        if removed {
            debug!(
                session_id = id,
                online = inner.sessions.len(),
                "Session unregistered"
            );
        }
        removed
    }

    /// Point-in-time copy of membership, in registration order.
    pub async fn snapshot(&self) -> Vec<Session> {
        self.inner.read().await.sessions.values().cloned().collect()
    }

    /// Check if a session is registered.
    pub async fn contains(&self, id: SessionId) -> bool {
        self.inner.read().await.sessions.contains_key(&id)
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Check whether no session is registered.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.sessions.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<Outbound>, mpsc::Receiver<Outbound>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn test_registry_new() {
        let registry = ClientRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_register_assigns_unique_ids() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = channel();

        let a = registry.register_as(tx.clone(), "Alice").await;
        let b = registry.register_as(tx, "Alice").await;

        assert_ne!(a.id(), b.id());
        assert_eq!(a.display_name(), "Alice");
        assert_eq!(b.display_name(), "Alice");
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_register_generates_name() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = channel();

        let session = registry.register(tx).await;

        assert!(session.display_name().contains(' '));
        assert!(registry.contains(session.id()).await);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = channel();
        let session = registry.register_as(tx, "Alice").await;

        assert!(registry.unregister(session.id()).await);
        assert!(!registry.contains(session.id()).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_unregister_absent_is_noop() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = channel();
        let session = registry.register_as(tx, "Alice").await;

        assert!(registry.unregister(session.id()).await);
        assert!(!registry.unregister(session.id()).await);
        assert!(!registry.unregister(999).await);
    }

    #[tokio::test]
    async fn test_snapshot_is_ordered_and_detached() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = channel();
        let a = registry.register_as(tx.clone(), "Alice").await;
        let b = registry.register_as(tx.clone(), "Bob").await;

        let snapshot = registry.snapshot().await;
        registry.unregister(a.id()).await;
        registry.register_as(tx, "Carol").await;

        let ids: Vec<SessionId> = snapshot.iter().map(Session::id).collect();
        assert_eq!(ids, vec![a.id(), b.id()]);
        let names: Vec<String> = registry
            .snapshot()
            .await
            .iter()
            .map(|s| s.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["Bob", "Carol"]);
    }

    #[tokio::test]
    async fn test_session_send_and_close() {
        let registry = ClientRegistry::new();
        let (tx, mut rx) = channel();
        let session = registry.register_as(tx, "Alice").await;

        session.send("hello").await.unwrap();
        assert!(session.close());

        assert_eq!(rx.recv().await, Some(Outbound::Text("hello".to_string())));
        assert_eq!(rx.recv().await, Some(Outbound::Close));
    }

    #[tokio::test]
    async fn test_session_send_after_drop_fails() {
        let registry = ClientRegistry::new();
        let (tx, rx) = channel();
        let session = registry.register_as(tx, "Alice").await;
        drop(rx);

        assert_eq!(
            session.send("hello").await,
            Err(DeliveryError::Closed(session.id()))
        );
        assert!(!session.close());
        assert!(!session.is_evicted());
    }

    #[tokio::test]
    async fn test_send_to_full_queue_gives_up() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        let session = registry.register_as(tx, "Alice").await;
        session.send("fills the queue").await.unwrap();

        let started = tokio::time::Instant::now();
        let result = session.send("hello").await;

        assert_eq!(result, Err(DeliveryError::Stalled(session.id())));
        assert!(started.elapsed() < SEND_TIMEOUT * 2);
    }

    #[tokio::test]
    async fn test_close_full_queue_evicts() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        let session = registry.register_as(tx, "Alice").await;
        let token = session.eviction_token();
        session.send("fills the queue").await.unwrap();

        assert!(!session.close());
        assert!(session.is_evicted());
        assert!(token.is_cancelled());
    }
}
