//! Message fan-out to connected sessions.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::registry::{ClientRegistry, DeliveryError, Session};

/// Delivers messages to every session in a registry snapshot.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster that prunes dead sessions from `registry`.
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Send `message` to every session in `snapshot`.
    ///
    /// Deliveries run concurrently and independently. Sessions that are gone
    /// or not reading are evicted and unregistered once all deliveries have
    /// settled. Returns the number of sessions that received the message.
    pub async fn send_to_all(&self, message: &str, snapshot: &[Session]) -> usize {
        let results = join_all(snapshot.iter().map(|session| session.send(message))).await;

        let mut delivered = 0;
        for (session, result) in snapshot.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Closed(id)) => {
                    debug!(session_id = id, "Dropping unreachable session");
                    self.registry.unregister(id).await;
                }
                Err(DeliveryError::Stalled(id)) => {
                    warn!(session_id = id, "Evicting session that stopped reading");
                    session.evict();
                    self.registry.unregister(id).await;
                }
            }
        }

        delivered
    }
}
