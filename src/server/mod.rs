//! Server module.
//!
//! This module provides the WebSocket endpoint, the serve loop, and the
//! lifecycle that governs shutdown.

mod lifecycle;
mod listener;
mod router;
mod signal;
pub mod ws;

pub use lifecycle::{LifecycleState, ServerLifecycle, ShutdownReason};
pub use listener::ChatServer;
pub use router::{create_health_router, create_router};
pub use signal::shutdown_signal;
pub use ws::{chat_ws_handler, ChatState};
