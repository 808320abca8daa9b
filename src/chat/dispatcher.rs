//! Routing of inbound chat messages.
//!
//! Each inbound message is parsed into a [`ChatInput`] and handled against a
//! registry snapshot taken when dispatch starts.

use std::sync::Arc;

use tracing::{debug, warn};

use super::broadcast::Broadcaster;
use super::command::{parse_input, ChatInput};
use super::registry::{ClientRegistry, Session};
use crate::audit::AuditLogger;
use crate::exchange::{FetchError, RateFetcher, RateSeries};
use crate::server::{ServerLifecycle, ShutdownReason};

/// Notice broadcast before the server shuts down.
pub const SHUTDOWN_NOTICE: &str = "Server is shutting down...";

/// Payload substituted for the rate series when the lookup fails.
pub const EXCHANGE_FAILURE_TEXT: &str = "Network error";

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Chat text was relayed.
    Chat {
        /// Sessions that received it.
        delivered: usize,
    },
    /// Exchange rates were requested.
    Exchange {
        /// Lookback window used.
        days: u32,
        /// Whether the lookup succeeded.
        success: bool,
    },
    /// Shutdown was requested.
    Shutdown {
        /// False if shutdown had already begun.
        initiated: bool,
    },
}

/// Format a chat line.
pub fn format_chat(display_name: &str, text: &str) -> String {
    format!("{display_name}: {text}")
}

/// Format a successful exchange result.
pub fn format_exchange(series: &RateSeries, days: u32) -> String {
    format!("The currency were: {} - {} ago.", series.to_json(), days)
}

/// Format a failed exchange lookup.
pub fn format_exchange_failure(error: &FetchError, days: u32) -> String {
    format!("The currency were: {EXCHANGE_FAILURE_TEXT} ({error}) - {days} ago.")
}

/// Interprets inbound messages and routes them.
pub struct CommandDispatcher {
    registry: Arc<ClientRegistry>,
    broadcaster: Broadcaster,
    fetcher: RateFetcher,
    audit: Arc<AuditLogger>,
    lifecycle: ServerLifecycle,
}

impl CommandDispatcher {
    /// Create a dispatcher.
    pub fn new(
        registry: Arc<ClientRegistry>,
        fetcher: RateFetcher,
        audit: Arc<AuditLogger>,
        lifecycle: ServerLifecycle,
    ) -> Self {
        Self {
            broadcaster: Broadcaster::new(registry.clone()),
            registry,
            fetcher,
            audit,
            lifecycle,
        }
    }

    /// Handle one inbound message from `sender`.
    ///
    /// Never fails: lookup errors become a chat notice, audit failures are logged.
    pub async fn dispatch(&self, sender: &Session, text: &str) -> DispatchOutcome {
        let input = parse_input(text);
        debug!(
            session_id = sender.id(),
            command = input.name(),
            "Dispatching message"
        );

        let snapshot = self.registry.snapshot().await;

        match input {
            ChatInput::Killall => {
                self.broadcaster.send_to_all(SHUTDOWN_NOTICE, &snapshot).await;
                let initiated = self
                    .lifecycle
                    .shutdown(ShutdownReason::Command {
                        by: sender.display_name().to_string(),
                    })
                    .await;
                DispatchOutcome::Shutdown { initiated }
            }
            ChatInput::Exchange { days } => {
                let success = match self.fetcher.fetch(days).await {
                    Ok(series) => {
                        self.broadcaster
                            .send_to_all(&format_exchange(&series, days), &snapshot)
                            .await;
                        if let Err(e) = self.audit.record_now(sender.display_name(), days).await {
                            warn!(error = %e, "Failed to write exchange audit record");
                        }
                        true
                    }
                    Err(e) => {
                        warn!(days, error = %e, "Exchange rate lookup failed");
                        self.broadcaster
                            .send_to_all(&format_exchange_failure(&e, days), &snapshot)
                            .await;
                        false
                    }
                };
                DispatchOutcome::Exchange { days, success }
            }
            ChatInput::Message(text) => {
                let delivered = self
                    .broadcaster
                    .send_to_all(&format_chat(sender.display_name(), &text), &snapshot)
                    .await;
                DispatchOutcome::Chat { delivered }
            }
        }
    }
}
