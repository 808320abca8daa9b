//! Chat command parser for fxchat.
//!
//! Inbound text is either a control command (`killall`, `exchange [N]`) or
//! plain chat. Command tokens must match exactly; arguments are
//! whitespace-separated.

use crate::exchange::MAX_LOOKBACK_DAYS;

/// Command that shuts the server down.
pub const KILLALL: &str = "killall";

/// Command that requests exchange rates.
pub const EXCHANGE: &str = "exchange";

/// Result of parsing an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Shut the server down.
    Killall,
    /// Fetch exchange rates for today and the given number of days back.
    Exchange {
        /// Lookback window, already clamped.
        days: u32,
    },
    /// Regular chat message, kept verbatim.
    Message(String),
}

impl ChatInput {
    /// Get the command name, or "chat" for a plain message.
    pub fn name(&self) -> &'static str {
        match self {
            ChatInput::Killall => KILLALL,
            ChatInput::Exchange { .. } => EXCHANGE,
            ChatInput::Message(_) => "chat",
        }
    }
}

/// Parse an inbound message.
pub fn parse_input(input: &str) -> ChatInput {
    if input == KILLALL {
        return ChatInput::Killall;
    }

    let mut parts = input.split_whitespace();
    if parts.next() == Some(EXCHANGE) && input.starts_with(EXCHANGE) {
        let args: Vec<&str> = parts.collect();
        let days = match args.as_slice() {
            [arg] => parse_lookback(arg),
            _ => 0,
        };
        return ChatInput::Exchange { days };
    }

    ChatInput::Message(input.to_string())
}

/// Parse a lookback argument.
///
/// Only plain decimal digits count; anything else is 0. Values are clamped
/// to `MAX_LOOKBACK_DAYS`.
pub fn parse_lookback(arg: &str) -> u32 {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }

    // All digits, so the only parse failure is overflow.
    arg.parse::<u32>()
        .map(|days| days.min(MAX_LOOKBACK_DAYS))
        .unwrap_or(MAX_LOOKBACK_DAYS)
}
