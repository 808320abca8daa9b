//! Chat module for fxchat.
//!
//! This module provides the real-time chat core:
//! - Session registry with generated display names
//! - Broadcast delivery that prunes unreachable sessions
//! - Command parsing (`killall`, `exchange [N]`) and dispatch

mod broadcast;
mod command;
mod dispatcher;
pub mod names;
mod registry;

pub use broadcast::Broadcaster;
pub use command::{parse_input, parse_lookback, ChatInput, EXCHANGE, KILLALL};
pub use dispatcher::{
    format_chat, format_exchange, format_exchange_failure, CommandDispatcher, DispatchOutcome,
    EXCHANGE_FAILURE_TEXT, SHUTDOWN_NOTICE,
};
pub use registry::{ClientRegistry, DeliveryError, Outbound, Session, SessionId, SEND_TIMEOUT};
